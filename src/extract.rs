//! Declarative path extraction over decoded trees.
//!
//! A [`FieldSpec`] names where a value lives (a path of keys and indexes), an
//! optional fallback location for when the upstream moves things around, and a
//! named [`Transform`] that shapes the raw node into the field's final value.
//! Resolution fails closed: anything missing, mistyped, out of range or null
//! along the way is simply absent.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::scriptdata::SERVICE_REQUEST_DATA;
use crate::transform::Transform;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Index(i64),
    Key(String),
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<i64> for Segment {
    fn from(index: i64) -> Self {
        Segment::Index(index)
    }
}

impl From<i32> for Segment {
    fn from(index: i32) -> Self {
        Segment::Index(index.into())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(i64::try_from(index).unwrap_or(i64::MAX))
    }
}

pub type Path = Vec<Segment>;

/// One output record before it becomes a typed struct.
pub type ExtractionResult = Map<String, Value>;

/// Field name to spec, one table per output schema.
pub type FieldMap = BTreeMap<String, FieldSpec>;

/// Walks `path` from `root`. `None` when any step doesn't exist or lands on null.
pub fn resolve<'a>(root: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    let mut node = root;
    for segment in path {
        node = match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.get(key)?,
            (Segment::Index(index), Value::Array(items)) => items.get(usize::try_from(*index).ok()?)?,
            _ => return None,
        };
    }
    (!node.is_null()).then_some(node)
}

/// Resolves `path` inside the dataset that `serviceRequestData` attributes to the
/// rpc `id`. When no dataset carries that id the path is resolved from the root.
pub fn resolve_service_request<'a>(tree: &'a Value, id: &str, path: &[Segment]) -> Option<&'a Value> {
    let dataset = tree
        .get(SERVICE_REQUEST_DATA)
        .and_then(Value::as_object)
        .and_then(|requests| {
            requests
                .iter()
                .find(|(_, request)| request.get("id").and_then(Value::as_str) == Some(id))
        })
        .map(|(key, _)| key.as_str());

    match dataset {
        Some(key) => tree.get(key).and_then(|root| resolve(root, path)),
        None => resolve(tree, path),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    #[serde(default)]
    pub path: Path,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Path>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

impl FieldSpec {
    pub fn new(path: Path) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// A field computed from the whole tree rather than from one node.
    pub fn computed(transform: Transform) -> Self {
        Self::new(Path::new()).with_transform(transform)
    }

    pub fn with_fallback(mut self, fallback: Path) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn via_service_request(mut self, id: impl Into<String>) -> Self {
        self.service_request_id = Some(id.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Same spec, addressed one level deeper.
    pub fn prefixed(&self, prefix: &[Segment]) -> Self {
        let nest = |path: &Path| prefix.iter().chain(path).cloned().collect::<Path>();
        Self {
            path: nest(&self.path),
            fallback: self.fallback.as_ref().map(nest),
            ..self.clone()
        }
    }

    /// The raw node for this field. The fallback is only walked when the primary is absent.
    pub fn resolve_raw<'a>(&self, tree: &'a Value) -> Option<&'a Value> {
        let primary = match &self.service_request_id {
            Some(id) => resolve_service_request(tree, id, &self.path),
            None => resolve(tree, &self.path),
        };
        primary.or_else(|| self.fallback.as_deref().and_then(|fallback| resolve(tree, fallback)))
    }

    pub fn extract(&self, tree: &Value) -> Value {
        let raw = self.resolve_raw(tree);
        match &self.transform {
            Some(transform) => transform.apply(raw, tree),
            None => raw.cloned().unwrap_or(Value::Null),
        }
    }
}

pub fn field_map<const N: usize>(entries: [(&str, FieldSpec); N]) -> FieldMap {
    entries
        .into_iter()
        .map(|(name, spec)| (name.to_string(), spec))
        .collect()
}

/// Every spec of `fields`, addressed under `prefix`.
pub fn prefix_fields(fields: &FieldMap, prefix: &[Segment]) -> FieldMap {
    fields
        .iter()
        .map(|(name, spec)| (name.clone(), spec.prefixed(prefix)))
        .collect()
}

pub fn extract_fields(tree: &Value, fields: &FieldMap) -> ExtractionResult {
    fields
        .iter()
        .map(|(name, spec)| (name.clone(), spec.extract(tree)))
        .collect()
}

/// Applies `fields` to every element of the sequence at `list_path`, each element
/// acting as the root. A missing or non-sequence node yields no records.
pub fn extract_list(tree: &Value, list_path: &[Segment], fields: &FieldMap) -> Vec<ExtractionResult> {
    resolve(tree, list_path)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(|item| extract_fields(item, fields)).collect())
        .unwrap_or_default()
}

/// Deserializes an extraction result. Null fields are dropped first so that the
/// record's own defaults apply to them.
pub fn into_record<T: DeserializeOwned>(result: ExtractionResult) -> Result<T> {
    let present = result.into_iter().filter(|(_, value)| !value.is_null()).collect();
    Ok(serde_json::from_value(Value::Object(present))?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::path;

    fn tree() -> Value {
        json!({
            "ds:5": [null, [0, "a", [["title"], null, {"k": false}]]],
            "ds:9": {"x": [1, 2, 3]},
            "serviceRequestData": {
                "ds:9": {"id": "ag2B9c", "request": []},
                "ds:5": {"id": "Ws7gDc"}
            }
        })
    }

    #[test]
    fn resolves_exact_positions() {
        let tree = tree();
        assert_eq!(resolve(&tree, &path!["ds:5", 1, 2, 0, 0]), Some(&json!("title")));
        assert_eq!(resolve(&tree, &path!["ds:5", 1, 0]), Some(&json!(0)));
        assert_eq!(resolve(&tree, &path!["ds:5", 1, 2, 2, "k"]), Some(&json!(false)));
        assert_eq!(resolve(&tree, &Path::new()), Some(&tree));
    }

    #[test]
    fn resolution_fails_closed() {
        let tree = tree();
        for path in [
            path!["ds:6"],
            path!["ds:5", 0],
            path!["ds:5", 0, 1],
            path!["ds:5", 1, 2, 1],
            path!["ds:5", 1, 9],
            path!["ds:5", -1],
            path!["ds:5", "1"],
            path!["ds:9", 0],
            path!["ds:5", 1, 1, 0],
            path!["ds:9", "x", 0, 0],
        ] {
            assert_eq!(resolve(&tree, &path), None, "{path:?}");
        }
        assert_eq!(resolve(&Value::Null, &[]), None);
    }

    #[test]
    fn fallback_only_when_primary_is_absent() {
        let tree = tree();
        let present_but_falsy = FieldSpec::new(path!["ds:5", 1, 0]).with_fallback(path!["ds:9", "x", 2]);
        assert_eq!(present_but_falsy.extract(&tree), json!(0));

        let missing = FieldSpec::new(path!["ds:5", 1, 7]).with_fallback(path!["ds:9", "x", 2]);
        assert_eq!(missing.extract(&tree), json!(3));

        let null_primary = FieldSpec::new(path!["ds:5", 0]).with_fallback(path!["ds:9", "x", 0]);
        assert_eq!(null_primary.extract(&tree), json!(1));

        let both_missing = FieldSpec::new(path!["nope"]).with_fallback(path!["ds:9", "x", 10]);
        assert_eq!(both_missing.extract(&tree), Value::Null);
    }

    #[test]
    fn service_request_selects_the_tagged_dataset() {
        let tree = tree();
        let spec = FieldSpec::new(path!["x", 1]).via_service_request("ag2B9c");
        assert_eq!(spec.extract(&tree), json!(2));

        // Unknown id resolves from the top level instead.
        let spec = FieldSpec::new(path!["ds:9", "x", 0]).via_service_request("zzzzzz");
        assert_eq!(spec.extract(&tree), json!(1));

        let no_requests = json!({"x": [5]});
        assert_eq!(resolve_service_request(&no_requests, "ag2B9c", &path!["x", 0]), Some(&json!(5)));
    }

    #[test]
    fn list_extraction_uses_each_item_as_root() {
        let tree = json!({"items": [["a", 1], ["b"], "junk"]});
        let fields = field_map([("name", FieldSpec::new(path![0])), ("rank", FieldSpec::new(path![1]))]);

        let records = extract_list(&tree, &path!["items"], &fields);
        assert_eq!(
            Value::Array(records.into_iter().map(Value::Object).collect()),
            json!([{"name": "a", "rank": 1}, {"name": "b", "rank": null}, {"name": null, "rank": null}])
        );
        assert!(extract_list(&tree, &path!["missing"], &fields).is_empty());
    }

    #[test]
    fn prefixing_nests_primary_and_fallback() {
        let spec = FieldSpec::new(path![3]).with_fallback(path![4]).prefixed(&path![0]);
        assert_eq!(spec.path, path![0, 3]);
        assert_eq!(spec.fallback, Some(path![0, 4]));
    }

    #[test]
    fn specs_are_data() {
        let spec = FieldSpec::new(path!["ds:5", 1, 2, 13, 1])
            .with_fallback(path!["ds:5", 1, 2, 14, 1])
            .with_transform(Transform::ToInt);
        let text = serde_json::to_string(&spec).unwrap();
        assert_eq!(
            text,
            r#"{"path":["ds:5",1,2,13,1],"fallback":["ds:5",1,2,14,1],"transform":{"name":"to_int"}}"#
        );
        assert_eq!(serde_json::from_str::<FieldSpec>(&text).unwrap(), spec);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn null_fields_take_record_defaults() {
        let mut result = ExtractionResult::new();
        result.insert("name".into(), json!("n"));
        result.insert("tags".into(), Value::Null);
        assert_eq!(
            into_record::<Item>(result).unwrap(),
            Item { name: "n".into(), tags: vec![] }
        );
    }
}
