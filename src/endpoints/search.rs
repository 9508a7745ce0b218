use chrono::Local;
use serde_json::Value;

use super::search_item_fields;
use crate::client::encode_query;
use crate::extract::{extract_list, resolve};
use crate::models::App;
use crate::options::SearchOptions;
use crate::paginate::ContinuationState;
use crate::scriptdata::parse_script_data;
use crate::{info_time, path, Client, Result};

/// First page of results plus the continuation token, or `None` when the page has no result sections.
pub(crate) fn search_seed(tree: &Value, num: usize) -> Option<ContinuationState> {
    let sections = resolve(tree, &path!["ds:1", 0, 1, 0, 0])?
        .as_array()
        .filter(|sections| !sections.is_empty())?;

    let token = sections
        .iter()
        .find_map(|section| section.get(1).and_then(Value::as_str))
        .map(str::to_string);
    let items = extract_list(tree, &path!["ds:1", 0, 1, 0, 0, 0], &search_item_fields());
    Some(ContinuationState::seeded(num, items, token))
}

impl Client {
    /// Apps matching a search term.
    pub async fn search(&self, options: SearchOptions) -> Result<Vec<App>> {
        let options = options.normalized()?;
        self.memoized("search", &options, || self.fetch_search(&options)).await
    }

    async fn fetch_search(&self, options: &SearchOptions) -> Result<Vec<App>> {
        let start_time = Local::now();
        let price = options.price.code().to_string();
        let url = self.url(&format!(
            "/work/search?{}",
            encode_query(&[
                ("q", options.term.as_str()),
                ("hl", options.lang.as_str()),
                ("gl", options.country.as_str()),
                ("price", price.as_str()),
            ])
        ));
        let html = self.get(url, &options.call).await?;

        let tree = parse_script_data(&html);
        let Some(seed) = search_seed(&tree, options.num) else {
            info_time!(start_time, "No results for {:?}", options.term);
            return Ok(Vec::new());
        };
        let apps = self
            .continue_cluster(seed, &options.lang, &options.country, &options.call)
            .await?;

        let apps = if options.full_detail {
            self.full_detail(apps, &options.lang, &options.country, &options.call)
                .await?
        } else {
            apps
        };
        info_time!(start_time, "Found {} apps for {:?}", apps.len(), options.term);
        Ok(apps)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn results(sections: Value) -> Value {
        json!({ "ds:1": [[null, [[sections]]]] })
    }

    #[test]
    fn no_sections_means_no_results() {
        assert!(search_seed(&results(json!([])), 20).is_none());
        assert!(search_seed(&json!({}), 20).is_none());
    }

    #[test]
    fn first_page_and_token_come_from_the_sections() {
        let item = |id: &str| {
            let mut item = vec![Value::Null; 13];
            item[12] = json!([id]);
            Value::Array(item)
        };
        let tree = results(json!([[item("com.a"), item("com.b")], [null, "next-page"]]));

        let seed = search_seed(&tree, 1).unwrap();
        assert_eq!(seed.len(), 2);
        assert_eq!(seed.clone().finish().items[0]["appId"], json!("com.a"));
        assert_eq!(seed.token(), Some("next-page"));
        assert!(seed.is_done());

        let seed = search_seed(&tree, 20).unwrap();
        assert!(!seed.is_done());
    }

    #[test]
    fn later_sections_can_carry_the_token() {
        let tree = results(json!([[], [null, "from-second"]]));
        let seed = search_seed(&tree, 20).unwrap();
        assert!(seed.is_empty());
        assert_eq!(seed.token(), Some("from-second"));
    }
}
