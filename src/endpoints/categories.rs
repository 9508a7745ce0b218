use chrono::Local;

use crate::options::CategoriesOptions;
use crate::parse::parse_category_page;
use crate::{info_time, Client, Result};

impl Client {
    /// Category ids linked from the store front page.
    pub async fn categories(&self, options: CategoriesOptions) -> Result<Vec<String>> {
        self.memoized("categories", &options, || self.fetch_categories(&options))
            .await
    }

    async fn fetch_categories(&self, options: &CategoriesOptions) -> Result<Vec<String>> {
        let start_time = Local::now();
        let html = self.get(self.url("/store/apps"), &options.call).await?;

        let ids = parse_category_page(html).await?;
        info_time!(start_time, "Found {} categories", ids.len());
        Ok(ids)
    }
}
