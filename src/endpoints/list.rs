use chrono::Local;
use serde_json::{json, Value};

use super::{cluster_item_fields, into_apps, GENERIC_TAG, RPC_LIST};
use crate::client::encode_query;
use crate::envelope::{decode_chunked, encode_request};
use crate::extract::{extract_list, prefix_fields};
use crate::models::App;
use crate::options::ListOptions;
use crate::{info_time, path, Client, Result};

const LIST_PATH: &str = "/_/PlayStoreUi/data/batchexecute?rpcids=vyAe2&source-path=%2Fstore%2Fapps&f.sid=-4178618388443751758&bl=boq_playuiserver_20220612.08_p0&authuser=0&soc-app=121&soc-platform=1&soc-device=1&_reqid=82003&rt=c";

/// Session token the top charts request is sent with.
const LIST_AT: &str = "AFSRYlx8XZfN8-O-IKASbNBDkB6T:1655531200971";

const ITEM_FIELDS: &[i64] = &[
    64, 1, 195, 71, 8, 72, 9, 10, 11, 139, 12, 16, 145, 148, 150, 151, 152, 27, 30, 31, 96, 32, 34, 163, 100, 165,
    104, 169, 108, 110, 113, 55, 56, 57, 122,
];
const SECTION_FIELDS: &[i64] = &[
    1, 73, 96, 103, 97, 58, 50, 92, 52, 112, 69, 19, 31, 101, 123, 74, 49, 80, 38, 20, 10, 14, 79, 43, 42, 139,
];
const SECTIONS: &[i64] = &[
    1, 31, 104, 9, 8, 27, 12, 65, 110, 88, 11, 56, 55, 96, 10, 122, 72, 71, 64, 113, 139, 150, 169, 165, 151, 163,
    32, 16, 108, 100,
];

/// The inner `vyAe2` request for one chart of one category.
pub(crate) fn list_request(num: usize, cluster: &str, category: &str) -> Value {
    let sections: Vec<Value> = SECTIONS
        .iter()
        .map(|section| json!([[7, section], [SECTION_FIELDS]]))
        .collect();
    let filters = json!([
        [[true], null, [[null, []]], null, null, null, null, [null, 2], null, null, null, null, null, null, [1], null, null, null, null, null, null, null, [1]],
        [null, [[null, []]]],
        [null, [[null, []]], null, [true]],
        [null, [[null, []]]],
        null,
        null,
        null,
        null,
        [[[null, []]]],
        [[[null, []]]]
    ]);
    json!([[
        null,
        [
            [8, [20, num]],
            true,
            null,
            ITEM_FIELDS,
            [null, null, filters, [sections]],
            null,
            null,
            [[[1, 2], [10, 8, 9], [], []]]
        ],
        [2, cluster, category]
    ]])
}

/// Apps of a decoded `vyAe2` payload.
pub(crate) fn list_apps(payload: &Value) -> Result<Vec<App>> {
    let fields = prefix_fields(&cluster_item_fields(), &path![0]);
    into_apps(extract_list(payload, &path![0, 1, 0, 28, 0], &fields))
}

impl Client {
    /// A top chart (collection) of a category.
    pub async fn list(&self, options: ListOptions) -> Result<Vec<App>> {
        let options = options.normalized()?;
        self.memoized("list", &options, || self.fetch_list(&options)).await
    }

    async fn fetch_list(&self, options: &ListOptions) -> Result<Vec<App>> {
        let start_time = Local::now();

        let mut query = vec![("hl", options.lang.as_str()), ("gl", options.country.as_str())];
        if let Some(age) = options.age {
            query.push(("age", age.as_str()));
        }
        let url = self.url(&format!("{LIST_PATH}&{}", encode_query(&query)));

        let inner = list_request(options.num, options.collection.cluster_name(), &options.category);
        let body = format!(
            "{}&{}",
            encode_request(RPC_LIST, &inner, Some(GENERIC_TAG)),
            encode_query(&[("at", LIST_AT)])
        );

        let response = self.post_form(url, body, &options.call).await?;
        let apps = match decode_chunked(&response)? {
            Some(payload) => list_apps(&payload)?,
            None => Vec::new(),
        };

        let apps = if options.full_detail {
            self.full_detail(apps, &options.lang, &options.country, &options.call)
                .await?
        } else {
            apps
        };
        info_time!(start_time, "Listed {} apps of {}", apps.len(), options.collection);
        Ok(apps)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn request_names_the_cluster_and_category() {
        let request = list_request(50, "topselling_paid", "GAME_PUZZLE");
        assert_eq!(request[0][2], json!([2, "topselling_paid", "GAME_PUZZLE"]));
        assert_eq!(request[0][1][0], json!([8, [20, 50]]));
        let sections = &request[0][1][4][3][0];
        assert_eq!(sections.as_array().unwrap().len(), SECTIONS.len());
        assert_eq!(sections[0][0], json!([7, 1]));
        assert_eq!(sections[29][0], json!([7, 100]));
    }

    #[test]
    fn request_lists_every_item_field() {
        let request = list_request(10, "topselling_free", "APPLICATION");
        let fields = request[0][1][3].as_array().unwrap();
        assert_eq!(fields.len(), 35);
        assert_eq!(fields.first(), Some(&json!(64)));
        assert_eq!(fields.last(), Some(&json!(122)));
        assert_eq!(request[0][1][4][3][0][0][1], json!([SECTION_FIELDS]));
    }

    #[test]
    fn apps_come_from_the_chart_cluster() {
        let mut app = vec![Value::Null; 15];
        app[0] = json!(["com.top"]);
        app[3] = json!("Top");
        app[4] = json!(["4.1", 4.1]);
        let mut cluster = vec![Value::Null; 29];
        cluster[28] = json!([[[app]]]);
        let payload = json!([[null, [cluster]]]);

        let apps = list_apps(&payload).unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].app_id, "com.top");
        assert_eq!(apps[0].score, Some(4.1));
        assert_eq!(apps[0].free, Some(true));
        assert!(list_apps(&json!([])).unwrap().is_empty());
    }
}
