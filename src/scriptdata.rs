//! Blob decoder for server-rendered pages.
//!
//! Every `AF_initDataCallback` script region carries one dataset keyed by its
//! `ds:N` id. The page also assigns `AF_dataServiceRequests`, an object literal
//! that says which rpc produced which dataset; it lands under
//! [`SERVICE_REQUEST_DATA`].

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::jsliteral::evaluate_object_literal;
use crate::macros::define_regex;

/// Key of the evaluated `AF_dataServiceRequests` literal in a decoded page.
pub const SERVICE_REQUEST_DATA: &str = "serviceRequestData";

define_regex!(INIT_DATA_CALLBACK, r">AF_initDataCallback[\s\S]*?</script");
define_regex!(DATASET_KEY, r"(ds:.*?)'");
define_regex!(DATASET_VALUE, r"data:([\s\S]*?),\s*sideChannel:\s*\{\}\}\);</");
define_regex!(SERVICE_REQUESTS, r"; var AF_dataServiceRequests[\s\S]*?; var AF_initDataChunkQueue");
define_regex!(SERVICE_REQUESTS_LITERAL, r"\{'ds:[\s\S]*\}\}");

/// Decodes every dataset on the page into one tree keyed by dataset id.
///
/// A region that doesn't decode is skipped on its own. A page without any
/// region yields a tree holding only an empty [`SERVICE_REQUEST_DATA`].
pub fn parse_script_data(html: &str) -> Value {
    let mut tree = Map::new();

    let mut regions = INIT_DATA_CALLBACK.find_iter(html).peekable();
    if regions.peek().is_none() {
        debug!("page has no init data callbacks");
        tree.insert(SERVICE_REQUEST_DATA.to_string(), Value::Object(Map::new()));
        return Value::Object(tree);
    }

    for region in regions {
        let script = region.as_str();
        let (Some(key), Some(data)) = (DATASET_KEY.captures(script), DATASET_VALUE.captures(script))
        else {
            continue;
        };
        let key = &key[1];
        match serde_json::from_str::<Value>(&data[1]) {
            Ok(value) => {
                tree.insert(key.to_string(), value);
            }
            Err(e) => warn!(dataset = key, error = %e, "skipping undecodable dataset"),
        }
    }

    tree.insert(
        SERVICE_REQUEST_DATA.to_string(),
        Value::Object(parse_service_requests(html)),
    );
    Value::Object(tree)
}

/// Evaluates the `AF_dataServiceRequests` literal. Absent or unevaluable means empty.
pub fn parse_service_requests(html: &str) -> Map<String, Value> {
    let Some(literal) = SERVICE_REQUESTS
        .find(html)
        .and_then(|region| SERVICE_REQUESTS_LITERAL.find(region.as_str()))
    else {
        return Map::new();
    };

    evaluate_object_literal(literal.as_str()).unwrap_or_else(|e| {
        warn!(error = %e, "ignoring service request data");
        Map::new()
    })
}
