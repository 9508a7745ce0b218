//! The batched-RPC wire format.
//!
//! A response body is an optional `)]}'\n` guard followed by a JSON array whose
//! `[0][2]` element is the real payload, encoded a second time as a JSON string.

use serde_json::{json, Value};

use crate::{Error, Result};

/// Guard some responses start with, checked byte-exact.
pub const XSSI_PREFIX: &[u8] = b")]}'\n";

/// Line of a chunked (`rt=c`) response that carries the envelope array.
const CHUNKED_ENVELOPE_LINE: usize = 3;

/// Decodes an envelope body. `Ok(None)` is the upstream's explicit "no data" payload.
pub fn decode(body: &[u8]) -> Result<Option<Value>> {
    let body = body.strip_prefix(XSSI_PREFIX).unwrap_or(body);
    let outer: Value = serde_json::from_slice(body)?;
    payload_of(&outer)
}

/// Decodes a chunked response, where the body is a sequence of length-prefixed
/// lines and the envelope array sits on the fourth one.
pub fn decode_chunked(body: &[u8]) -> Result<Option<Value>> {
    let line = body
        .split(|b| *b == b'\n')
        .nth(CHUNKED_ENVELOPE_LINE)
        .ok_or_else(|| Error::Protocol("chunked response is missing its envelope line".into()))?;
    let outer: Value = serde_json::from_slice(line)?;
    payload_of(&outer)
}

fn payload_of(outer: &Value) -> Result<Option<Value>> {
    let first = outer
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Protocol("envelope is not an array of arrays".into()))?;
    if first.len() < 3 {
        return Err(Error::Protocol(format!(
            "envelope entry has {} elements, expected at least 3",
            first.len()
        )));
    }
    let inner = first[2]
        .as_str()
        .ok_or_else(|| Error::Protocol("envelope payload is not a string".into()))?;
    if inner == "null" {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(inner)?))
}

/// Builds a response body the way the upstream sends it, prefix included.
pub fn encode(rpc_id: &str, payload: Option<&Value>) -> Vec<u8> {
    let inner = payload.map_or_else(|| "null".to_string(), Value::to_string);
    let outer = json!([["wrb.fr", rpc_id, inner, null, null, null, "generic"]]);
    let mut body = XSSI_PREFIX.to_vec();
    body.extend_from_slice(outer.to_string().as_bytes());
    body
}

/// Form body for one RPC call: `f.req=[[[rpc_id, "<inner json>", null, tag]]]`.
/// Without a tag the entry is just the id and the payload.
pub fn encode_request(rpc_id: &str, inner: &Value, tag: Option<&str>) -> String {
    let entry = match tag {
        Some(tag) => json!([rpc_id, inner.to_string(), null, tag]),
        None => json!([rpc_id, inner.to_string()]),
    };
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("f.req", &json!([[entry]]).to_string())
        .finish()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn round_trip() {
        let payload = json!([[["com.example", 7]], [null, "token"], {"k": "v"}]);
        let body = encode("UsvDTd", Some(&payload));
        assert!(body.starts_with(XSSI_PREFIX));
        assert_eq!(decode(&body).unwrap(), Some(payload));
    }

    #[test]
    fn null_payload_is_not_an_error() {
        assert_eq!(decode(b")]}'\n[[\"x\",\"1\",\"null\"]]").unwrap(), None);
        assert_eq!(decode(&encode("x", None)).unwrap(), None);
    }

    #[test]
    fn prefix_is_optional() {
        assert_eq!(decode(br#"[["x","1","[1,2]"]]"#).unwrap(), Some(json!([1, 2])));
    }

    #[test]
    fn structural_faults_are_protocol_errors() {
        for body in [&b"{}"[..], b"[]", b"[1]", br#"[["x","1"]]"#, br#"[["x","1",5]]"#] {
            assert!(matches!(decode(body), Err(Error::Protocol(_))), "{:?}", String::from_utf8_lossy(body));
        }
    }

    #[test]
    fn bad_json_is_a_json_error() {
        assert!(matches!(decode(b")]}'\n[[\"x\""), Err(Error::Json(_))));
        assert!(matches!(decode(br#"[["x","1","[1,"]]"#), Err(Error::Json(_))));
    }

    #[test]
    fn chunked_reads_the_fourth_line() {
        let body = b")]}'\n\n1234\n[[\"wrb.fr\",\"vyAe2\",\"[[1]]\",null]]\n25\n[[\"di\",42]]\n";
        assert_eq!(decode_chunked(body).unwrap(), Some(json!([[1]])));
        assert!(matches!(decode_chunked(b")]}'\n\n12"), Err(Error::Protocol(_))));
    }

    #[test]
    fn request_body_double_encodes_the_payload() {
        let body = encode_request("xdSrCf", &json!([[null, ["com.example", 7], []]]), Some("1"));
        let decoded: String = url::form_urlencoded::parse(body.as_bytes())
            .find(|(k, _)| k == "f.req")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(decoded, r#"[[["xdSrCf","[[null,[\"com.example\",7],[]]]",null,"1"]]]"#);
    }
}
