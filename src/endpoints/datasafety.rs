use chrono::Local;
use serde_json::Value;

use crate::client::encode_query;
use crate::extract::{extract_fields, field_map, into_record, FieldMap, FieldSpec};
use crate::models::DataSafetyResult;
use crate::options::DataSafetyOptions;
use crate::scriptdata::parse_script_data;
use crate::transform::Transform;
use crate::{info_time, path, Client, Result};

pub fn data_safety_fields() -> FieldMap {
    field_map([
        (
            "dataShared",
            FieldSpec::new(path!["ds:3", 1, 2, 1, 138, 4, 0, 0]).with_transform(Transform::DataEntries),
        ),
        (
            "dataCollected",
            FieldSpec::new(path!["ds:3", 1, 2, 1, 138, 4, 1, 0]).with_transform(Transform::DataEntries),
        ),
        (
            "securityPractices",
            FieldSpec::new(path!["ds:3", 1, 2, 1, 138, 9, 2]).with_transform(Transform::SecurityPractices),
        ),
        ("privacyPolicyUrl", FieldSpec::new(path!["ds:3", 1, 2, 1, 100, 0, 5, 2])),
    ])
}

pub(crate) fn data_safety_from_tree(tree: &Value) -> Result<DataSafetyResult> {
    into_record(extract_fields(tree, &data_safety_fields()))
}

impl Client {
    /// The data safety declaration of an app.
    pub async fn data_safety(&self, options: DataSafetyOptions) -> Result<DataSafetyResult> {
        let options = options.normalized()?;
        self.memoized("datasafety", &options, || self.fetch_data_safety(&options))
            .await
    }

    async fn fetch_data_safety(&self, options: &DataSafetyOptions) -> Result<DataSafetyResult> {
        let start_time = Local::now();
        let url = self.url(&format!(
            "/store/apps/datasafety?{}",
            encode_query(&[("id", options.app_id.as_str()), ("hl", options.lang.as_str())])
        ));
        let html = self.get(url, &options.call).await?;

        let result = data_safety_from_tree(&parse_script_data(&html))?;
        info_time!(start_time, "Fetched data safety of {}", options.app_id);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::models::{DataSafetyEntry, SecurityPractice};

    fn page() -> Value {
        let mut record = vec![Value::Null; 139];
        record[100] = json!([[null, null, null, null, null, [null, null, "https://example.com/privacy"]]]);
        let mut safety = vec![Value::Null; 10];
        safety[4] = json!([
            [[[[null, "Location"], null, null, null, [["Approximate location", false, "Analytics"]]]]],
            [[
                [[null, "Personal info"], null, null, null, [["Email address", true, "Account management"], ["Name", null, "Personalization"]]]
            ]]
        ]);
        safety[9] = json!([null, null, [[null, "Data is encrypted in transit", [null, "Your data is transferred over a secure connection"]]]]);
        record[138] = Value::Array(safety);
        json!({ "ds:3": [null, [null, null, [null, record]]] })
    }

    #[test]
    fn maps_the_declaration() {
        let result = data_safety_from_tree(&page()).unwrap();
        assert_eq!(
            result.data_shared,
            vec![DataSafetyEntry {
                data: "Approximate location".into(),
                optional: false,
                purpose: "Analytics".into(),
                kind: "Location".into(),
            }]
        );
        assert_eq!(result.data_collected.len(), 2);
        assert!(result.data_collected[0].optional);
        assert_eq!(result.data_collected[1].kind, "Personal info");
        assert_eq!(
            result.security_practices,
            vec![SecurityPractice {
                practice: "Data is encrypted in transit".into(),
                description: "Your data is transferred over a secure connection".into(),
            }]
        );
        assert_eq!(result.privacy_policy_url.as_deref(), Some("https://example.com/privacy"));
    }

    #[test]
    fn missing_sections_are_empty() {
        let result = data_safety_from_tree(&json!({})).unwrap();
        assert_eq!(result, DataSafetyResult::default());
    }
}
