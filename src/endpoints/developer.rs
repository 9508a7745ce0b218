use chrono::Local;

use super::{cluster_item_fields, page_seed};
use crate::client::encode_query;
use crate::extract::prefix_fields;
use crate::models::App;
use crate::options::DeveloperOptions;
use crate::paginate::PageLayout;
use crate::scriptdata::parse_script_data;
use crate::{info_time, path, Client, Result};

/// Named developers and numeric developer ids have their own page and cluster slot.
fn developer_layout(numeric: bool) -> (&'static str, PageLayout) {
    if numeric {
        (
            "/store/apps/dev",
            PageLayout {
                items: path!["ds:3", 0, 1, 0, 21, 0],
                token: path!["ds:3", 0, 1, 0, 21, 1, 3, 1],
                fields: cluster_item_fields(),
            },
        )
    } else {
        (
            "/store/apps/developer",
            PageLayout {
                items: path!["ds:3", 0, 1, 0, 22, 0],
                token: path!["ds:3", 0, 1, 0, 22, 1, 3, 1],
                fields: prefix_fields(&cluster_item_fields(), &path![0]),
            },
        )
    }
}

impl Client {
    /// Apps published by one developer.
    pub async fn developer(&self, options: DeveloperOptions) -> Result<Vec<App>> {
        let options = options.normalized()?;
        self.memoized("developer", &options, || self.fetch_developer(&options))
            .await
    }

    async fn fetch_developer(&self, options: &DeveloperOptions) -> Result<Vec<App>> {
        let start_time = Local::now();
        let (page, layout) = developer_layout(options.is_numeric());
        let url = self.url(&format!(
            "{page}?{}",
            encode_query(&[
                ("id", options.dev_id.as_str()),
                ("hl", options.lang.as_str()),
                ("gl", options.country.as_str()),
            ])
        ));
        let html = self.get(url, &options.call).await?;

        let tree = parse_script_data(&html);
        let seed = page_seed(&tree, &layout, options.num);
        let apps = self
            .continue_cluster(seed, &options.lang, &options.country, &options.call)
            .await?;

        let apps = if options.full_detail {
            self.full_detail(apps, &options.lang, &options.country, &options.call)
                .await?
        } else {
            apps
        };
        info_time!(start_time, "Found {} apps of developer {}", apps.len(), options.dev_id);
        Ok(apps)
    }
}
