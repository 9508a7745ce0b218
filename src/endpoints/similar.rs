use chrono::Local;
use serde_json::Value;

use super::{cluster_item_fields, details_path, page_seed, RPC_SIMILAR_CLUSTERS};
use crate::client::escape;
use crate::extract::{resolve, resolve_service_request};
use crate::models::App;
use crate::options::SimilarOptions;
use crate::paginate::PageLayout;
use crate::scriptdata::parse_script_data;
use crate::{info_time, path, Client, Error, Result, DEFAULT_LANG};

const SIMILAR_TITLES: [&str; 2] = ["Similar apps", "Similar games"];

/// Link to the "similar apps" cluster page from a decoded details page.
///
/// The cluster titled like [`SIMILAR_TITLES`] wins; otherwise the first cluster is used.
pub(crate) fn similar_cluster_link(tree: &Value) -> Option<&str> {
    let clusters = resolve_service_request(tree, RPC_SIMILAR_CLUSTERS, &path![1, 1])?
        .as_array()
        .filter(|clusters| !clusters.is_empty())?;

    fn title(cluster: &Value) -> Option<&str> {
        resolve(cluster, &path![21, 1, 0]).and_then(Value::as_str)
    }

    let cluster = clusters
        .iter()
        .find(|cluster| title(cluster).is_some_and(|t| SIMILAR_TITLES.contains(&t)))
        .unwrap_or(&clusters[0]);

    resolve(cluster, &path![21, 1, 2, 4, 2])
        .and_then(Value::as_str)
        .filter(|link| !link.is_empty())
}

fn cluster_layout() -> PageLayout {
    PageLayout {
        items: path!["ds:3", 0, 1, 0, 21, 0],
        token: path!["ds:3", 0, 1, 0, 21, 1, 3, 1],
        fields: cluster_item_fields(),
    }
}

impl Client {
    /// Apps the store lists as similar to the given one.
    pub async fn similar(&self, options: SimilarOptions) -> Result<Vec<App>> {
        let options = options.normalized()?;
        self.memoized("similar", &options, || self.fetch_similar(&options)).await
    }

    async fn fetch_similar(&self, options: &SimilarOptions) -> Result<Vec<App>> {
        let start_time = Local::now();
        // Cluster titles are matched in English.
        let details_url = self.url(&details_path(&options.app_id, DEFAULT_LANG, &options.country));
        let html = self.get(details_url, &options.call).await?;

        let tree = parse_script_data(&html);
        let not_found = || Error::NotFound(format!("similar apps of {}", options.app_id));
        let link = similar_cluster_link(&tree).ok_or_else(not_found)?;

        let cluster_url = self.url(&format!(
            "{link}&gl={}&hl={}",
            escape(&options.country),
            escape(&options.lang)
        ));
        let cluster_html = self.get(cluster_url, &options.call).await?;
        let cluster_tree = parse_script_data(&cluster_html);

        let seed = page_seed(&cluster_tree, &cluster_layout(), options.num);
        let apps = self
            .continue_cluster(seed, &options.lang, &options.country, &options.call)
            .await?;

        let apps = if options.full_detail {
            self.full_detail(apps, &options.lang, &options.country, &options.call)
                .await?
        } else {
            apps
        };
        info_time!(start_time, "Found {} apps similar to {}", apps.len(), options.app_id);
        Ok(apps)
    }
}
