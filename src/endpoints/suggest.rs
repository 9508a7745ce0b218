use chrono::Local;
use serde_json::{json, Value};

use super::RPC_SUGGEST;
use crate::extract::resolve;
use crate::options::SuggestOptions;
use crate::{info_time, path, Client, Result};

pub(crate) fn suggest_request(term: &str) -> Value {
    json!([[null, [term], [10], [2], 4]])
}

pub(crate) fn suggestions(payload: &Value) -> Vec<String> {
    resolve(payload, &path![0, 0])
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(0).and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl Client {
    /// Search term completions.
    pub async fn suggest(&self, options: SuggestOptions) -> Result<Vec<String>> {
        let options = options.normalized()?;
        self.memoized("suggest", &options, || self.fetch_suggest(&options))
            .await
    }

    async fn fetch_suggest(&self, options: &SuggestOptions) -> Result<Vec<String>> {
        let start_time = Local::now();
        let payload = self
            .rpc(
                RPC_SUGGEST,
                &suggest_request(&options.term),
                None,
                &options.lang,
                &options.country,
                &options.call,
            )
            .await?;

        let terms = payload.as_ref().map(suggestions).unwrap_or_default();
        info_time!(start_time, "{} suggestions for {:?}", terms.len(), options.term);
        Ok(terms)
    }
}
