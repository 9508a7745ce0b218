//! Store endpoints, one module per call, all implemented as methods on [`Client`].
//!
//! Every call follows the same shape: normalize the options, consult the cache,
//! fetch (an HTML page or a batched RPC), decode into a tree, run the field
//! tables over it and deserialize the records.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::{encode_query, escape};
use crate::envelope::{self, encode_request};
use crate::extract::{extract_list, field_map, into_record, ExtractionResult, FieldMap, FieldSpec};
use crate::models::App;
use crate::options::{AppOptions, CallOptions};
use crate::paginate::{paginate, ContinuationState, PageLayout, PageSource};
use crate::transform::Transform;
use crate::{path, Client, Result, CLUSTER_PAGE_SIZE};

mod app;
mod categories;
mod datasafety;
mod developer;
mod list;
mod permissions;
mod reviews;
mod search;
mod similar;
mod suggest;

pub use app::app_fields;
pub use datasafety::data_safety_fields;
pub use reviews::review_fields;

const BATCHEXECUTE_PATH: &str = "/_/PlayStoreUi/data/batchexecute";

pub(crate) const RPC_CLUSTER_PAGE: &str = "qnKhOb";
pub(crate) const RPC_REVIEWS: &str = "UsvDTd";
pub(crate) const RPC_PERMISSIONS: &str = "xdSrCf";
pub(crate) const RPC_SUGGEST: &str = "IJ4APc";
pub(crate) const RPC_LIST: &str = "vyAe2";
/// Tags the dataset holding an app page's clusters.
pub(crate) const RPC_SIMILAR_CLUSTERS: &str = "ag2B9c";

pub(crate) const GENERIC_TAG: &str = "generic";

/// Items of a search result or a cluster continuation page.
pub fn search_item_fields() -> FieldMap {
    field_map([
        ("title", FieldSpec::new(path![2])),
        ("appId", FieldSpec::new(path![12, 0])),
        ("url", FieldSpec::new(path![9, 4, 2]).with_transform(Transform::ResolveUrl)),
        ("icon", FieldSpec::new(path![1, 1, 0, 3, 2])),
        ("developer", FieldSpec::new(path![4, 0, 0, 0])),
        (
            "developerId",
            FieldSpec::new(path![4, 0, 0, 1, 4, 2]).with_transform(Transform::DeveloperId),
        ),
        (
            "priceText",
            FieldSpec::new(path![7, 0, 3, 2, 1, 0, 2]).with_transform(Transform::OrDefault(json!("FREE"))),
        ),
        ("currency", FieldSpec::new(path![7, 0, 3, 2, 1, 0, 1])),
        (
            "price",
            FieldSpec::new(path![7, 0, 3, 2, 1, 0, 2]).with_transform(Transform::PriceFromText),
        ),
        (
            "free",
            FieldSpec::new(path![7, 0, 3, 2, 1, 0, 2]).with_transform(Transform::FreeIfAbsent),
        ),
        ("summary", FieldSpec::new(path![4, 1, 1, 1, 1])),
        ("scoreText", FieldSpec::new(path![6, 0, 2, 1, 0])),
        ("score", FieldSpec::new(path![6, 0, 2, 1, 1])),
    ])
}

/// Items of a cluster rendered into a page (similar apps, numeric developer pages).
/// The top charts and named developer pages wrap each item one level deeper.
pub fn cluster_item_fields() -> FieldMap {
    field_map([
        ("title", FieldSpec::new(path![3])),
        ("appId", FieldSpec::new(path![0, 0])),
        ("url", FieldSpec::new(path![10, 4, 2]).with_transform(Transform::ResolveUrl)),
        ("icon", FieldSpec::new(path![1, 3, 2])),
        ("developer", FieldSpec::new(path![14])),
        ("currency", FieldSpec::new(path![8, 1, 0, 1])),
        ("price", FieldSpec::new(path![8, 1, 0, 0]).with_transform(Transform::MicrosToDecimal)),
        ("free", FieldSpec::new(path![8, 1, 0, 0]).with_transform(Transform::IsFree)),
        ("summary", FieldSpec::new(path![13, 1])),
        ("scoreText", FieldSpec::new(path![4, 0])),
        ("score", FieldSpec::new(path![4, 1])),
    ])
}

/// Continuation pages of an app cluster: `qnKhOb` with a fixed page size.
pub(crate) fn cluster_page_request(token: Option<&str>) -> Value {
    json!([[
        null,
        [
            [10, [10, CLUSTER_PAGE_SIZE]],
            true,
            null,
            [96, 27, 4, 8, 57, 30, 110, 79, 11, 16, 49, 1, 3, 9, 12, 104, 55, 56, 51, 10, 34, 77]
        ],
        null,
        token
    ]])
}

pub(crate) fn cluster_page_layout() -> PageLayout {
    PageLayout {
        items: path![0, 0, 0],
        token: path![0, 0, 7, 1],
        fields: search_item_fields(),
    }
}

pub(crate) fn details_path(app_id: &str, lang: &str, country: &str) -> String {
    format!(
        "/store/apps/details?{}",
        encode_query(&[("id", app_id), ("hl", lang), ("gl", country)])
    )
}

/// Seeds pagination from the first page of a cluster rendered into an HTML page.
pub(crate) fn page_seed(tree: &Value, layout: &PageLayout, num: usize) -> ContinuationState {
    let items = extract_list(tree, &layout.items, &layout.fields);
    ContinuationState::seeded(num, items, layout.token(tree))
}

pub(crate) fn into_apps(items: Vec<ExtractionResult>) -> Result<Vec<App>> {
    items.into_iter().map(into_record).collect()
}

impl Client {
    pub(crate) fn rpc_url(&self, rpc_id: &str, lang: &str, country: &str) -> String {
        self.url(&format!(
            "{BATCHEXECUTE_PATH}?rpcids={rpc_id}&f.sid=-697906427155521722&bl=boq_playuiserver_20190903.08_p0&hl={}&gl={}&authuser&soc-app=121&soc-platform=1&soc-device=1&_reqid=1065213",
            escape(lang),
            escape(country)
        ))
    }

    /// One batched RPC round trip. `Ok(None)` is the upstream's null payload.
    pub(crate) async fn rpc(
        &self,
        rpc_id: &str,
        inner: &Value,
        tag: Option<&str>,
        lang: &str,
        country: &str,
        call: &CallOptions,
    ) -> Result<Option<Value>> {
        let url = self.rpc_url(rpc_id, lang, country);
        let body = self.post_form(url, encode_request(rpc_id, inner, tag), call).await?;
        envelope::decode(&body)
    }

    /// Follows an app cluster from its first page, already in `seed`, until `seed`'s target.
    pub(crate) async fn continue_cluster(
        &self,
        seed: ContinuationState,
        lang: &str,
        country: &str,
        call: &CallOptions,
    ) -> Result<Vec<App>> {
        let pages = ClusterPages {
            client: self,
            lang,
            country,
            call,
            layout: cluster_page_layout(),
        };
        let outcome = paginate(&pages, seed).await?;
        into_apps(outcome.items)
    }

    /// Replaces each summary with the full detail record, one request per app.
    pub(crate) async fn full_detail(
        &self,
        apps: Vec<App>,
        lang: &str,
        country: &str,
        call: &CallOptions,
    ) -> Result<Vec<App>> {
        let mut detailed = Vec::with_capacity(apps.len());
        for summary in apps {
            let options = AppOptions {
                app_id: summary.app_id,
                lang: lang.to_string(),
                country: country.to_string(),
                call: call.clone(),
            };
            detailed.push(self.app(options).await?);
        }
        Ok(detailed)
    }
}

struct ClusterPages<'a> {
    client: &'a Client,
    lang: &'a str,
    country: &'a str,
    call: &'a CallOptions,
    layout: PageLayout,
}

#[async_trait]
impl PageSource for ClusterPages<'_> {
    fn layout(&self) -> &PageLayout {
        &self.layout
    }

    async fn fetch_page(&self, token: Option<&str>) -> Result<Option<Value>> {
        self.client
            .rpc(
                RPC_CLUSTER_PAGE,
                &cluster_page_request(token),
                Some(GENERIC_TAG),
                self.lang,
                self.country,
                self.call,
            )
            .await
    }
}
