//! Options taken by the endpoint calls.
//!
//! `normalized` fills in defaults and validates; it runs before any network I/O
//! and its output is what the response cache keys on, so an omitted default and
//! an explicit one hit the same entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::constants::{Age, Collection, SearchPrice, Sort, CATEGORY_APPLICATION};
use crate::{Error, Result, DEFAULT_COUNTRY, DEFAULT_LANG, REVIEWS_PAGE_SIZE};

pub const DEFAULT_LIST_NUM: usize = 500;
pub const DEFAULT_SEARCH_NUM: usize = 20;
pub const MAX_SEARCH_NUM: usize = 250;
pub const DEFAULT_DEVELOPER_NUM: usize = 60;
pub const DEFAULT_SIMILAR_NUM: usize = 60;
pub const DEFAULT_REVIEWS_NUM: usize = REVIEWS_PAGE_SIZE;

/// Settings shared by every call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallOptions {
    /// Requests per second across the client, 0 for no limit.
    pub throttle: usize,
    /// Extra request headers. They override the client defaults.
    pub headers: BTreeMap<String, String>,
    #[serde(skip)]
    pub cancel: CancellationToken,
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{what} missing")));
    }
    Ok(())
}

fn or_default(value: &mut String, default: &str) {
    if value.is_empty() {
        *value = default.to_string();
    }
}

fn or_default_num(value: &mut usize, default: usize) {
    if *value == 0 {
        *value = default;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppOptions {
    pub app_id: String,
    pub lang: String,
    pub country: String,
    #[serde(flatten)]
    pub call: CallOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            lang: DEFAULT_LANG.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            call: CallOptions::default(),
        }
    }
}

impl AppOptions {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Default::default()
        }
    }

    pub fn normalized(mut self) -> Result<Self> {
        require(&self.app_id, "appId")?;
        or_default(&mut self.lang, DEFAULT_LANG);
        or_default(&mut self.country, DEFAULT_COUNTRY);
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListOptions {
    pub collection: Collection,
    pub category: String,
    pub age: Option<Age>,
    pub num: usize,
    pub lang: String,
    pub country: String,
    pub full_detail: bool,
    #[serde(flatten)]
    pub call: CallOptions,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            collection: Collection::default(),
            category: CATEGORY_APPLICATION.to_string(),
            age: None,
            num: DEFAULT_LIST_NUM,
            lang: DEFAULT_LANG.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            full_detail: false,
            call: CallOptions::default(),
        }
    }
}

impl ListOptions {
    pub fn normalized(mut self) -> Result<Self> {
        or_default(&mut self.category, CATEGORY_APPLICATION);
        or_default_num(&mut self.num, DEFAULT_LIST_NUM);
        or_default(&mut self.lang, DEFAULT_LANG);
        or_default(&mut self.country, DEFAULT_COUNTRY);
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    pub term: String,
    pub num: usize,
    pub price: SearchPrice,
    pub lang: String,
    pub country: String,
    pub full_detail: bool,
    #[serde(flatten)]
    pub call: CallOptions,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            term: String::new(),
            num: DEFAULT_SEARCH_NUM,
            price: SearchPrice::default(),
            lang: DEFAULT_LANG.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            full_detail: false,
            call: CallOptions::default(),
        }
    }
}

impl SearchOptions {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    pub fn normalized(mut self) -> Result<Self> {
        require(&self.term, "Search term")?;
        if self.num > MAX_SEARCH_NUM {
            return Err(Error::InvalidArgument(format!(
                "The number of results can't exceed {MAX_SEARCH_NUM}"
            )));
        }
        or_default_num(&mut self.num, DEFAULT_SEARCH_NUM);
        or_default(&mut self.lang, DEFAULT_LANG);
        or_default(&mut self.country, DEFAULT_COUNTRY);
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeveloperOptions {
    pub dev_id: String,
    pub num: usize,
    pub lang: String,
    pub country: String,
    pub full_detail: bool,
    #[serde(flatten)]
    pub call: CallOptions,
}

impl Default for DeveloperOptions {
    fn default() -> Self {
        Self {
            dev_id: String::new(),
            num: DEFAULT_DEVELOPER_NUM,
            lang: DEFAULT_LANG.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            full_detail: false,
            call: CallOptions::default(),
        }
    }
}

impl DeveloperOptions {
    pub fn new(dev_id: impl Into<String>) -> Self {
        Self {
            dev_id: dev_id.into(),
            ..Default::default()
        }
    }

    pub fn normalized(mut self) -> Result<Self> {
        require(&self.dev_id, "devId")?;
        or_default_num(&mut self.num, DEFAULT_DEVELOPER_NUM);
        or_default(&mut self.lang, DEFAULT_LANG);
        or_default(&mut self.country, DEFAULT_COUNTRY);
        Ok(self)
    }

    /// Numeric developer ids live under a different page with a different layout.
    pub fn is_numeric(&self) -> bool {
        self.dev_id.parse::<i64>().is_ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimilarOptions {
    pub app_id: String,
    pub num: usize,
    pub lang: String,
    pub country: String,
    pub full_detail: bool,
    #[serde(flatten)]
    pub call: CallOptions,
}

impl Default for SimilarOptions {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            num: DEFAULT_SIMILAR_NUM,
            lang: DEFAULT_LANG.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            full_detail: false,
            call: CallOptions::default(),
        }
    }
}

impl SimilarOptions {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Default::default()
        }
    }

    pub fn normalized(mut self) -> Result<Self> {
        require(&self.app_id, "appId")?;
        or_default_num(&mut self.num, DEFAULT_SIMILAR_NUM);
        or_default(&mut self.lang, DEFAULT_LANG);
        or_default(&mut self.country, DEFAULT_COUNTRY);
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewsOptions {
    pub app_id: String,
    pub sort: Sort,
    pub num: usize,
    /// Return a single page and its continuation token.
    pub paginate: bool,
    pub next_pagination_token: Option<String>,
    pub lang: String,
    pub country: String,
    #[serde(flatten)]
    pub call: CallOptions,
}

impl Default for ReviewsOptions {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            sort: Sort::default(),
            num: DEFAULT_REVIEWS_NUM,
            paginate: false,
            next_pagination_token: None,
            lang: DEFAULT_LANG.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            call: CallOptions::default(),
        }
    }
}

impl ReviewsOptions {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Default::default()
        }
    }

    pub fn normalized(mut self) -> Result<Self> {
        require(&self.app_id, "appId")?;
        or_default_num(&mut self.num, DEFAULT_REVIEWS_NUM);
        or_default(&mut self.lang, DEFAULT_LANG);
        or_default(&mut self.country, DEFAULT_COUNTRY);
        self.next_pagination_token = self.next_pagination_token.filter(|t| !t.is_empty());
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PermissionsOptions {
    pub app_id: String,
    /// Only the names of the common permissions.
    pub short: bool,
    pub lang: String,
    pub country: String,
    #[serde(flatten)]
    pub call: CallOptions,
}

impl Default for PermissionsOptions {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            short: false,
            lang: DEFAULT_LANG.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            call: CallOptions::default(),
        }
    }
}

impl PermissionsOptions {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Default::default()
        }
    }

    pub fn normalized(mut self) -> Result<Self> {
        require(&self.app_id, "appId")?;
        or_default(&mut self.lang, DEFAULT_LANG);
        or_default(&mut self.country, DEFAULT_COUNTRY);
        Ok(self)
    }
}

/// The data safety page is not country specific.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataSafetyOptions {
    pub app_id: String,
    pub lang: String,
    #[serde(flatten)]
    pub call: CallOptions,
}

impl Default for DataSafetyOptions {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            lang: DEFAULT_LANG.to_string(),
            call: CallOptions::default(),
        }
    }
}

impl DataSafetyOptions {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Default::default()
        }
    }

    pub fn normalized(mut self) -> Result<Self> {
        require(&self.app_id, "appId")?;
        or_default(&mut self.lang, DEFAULT_LANG);
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuggestOptions {
    pub term: String,
    pub lang: String,
    pub country: String,
    #[serde(flatten)]
    pub call: CallOptions,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            term: String::new(),
            lang: DEFAULT_LANG.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            call: CallOptions::default(),
        }
    }
}

impl SuggestOptions {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    pub fn normalized(mut self) -> Result<Self> {
        require(&self.term, "term")?;
        or_default(&mut self.lang, DEFAULT_LANG);
        or_default(&mut self.country, DEFAULT_COUNTRY);
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoriesOptions {
    #[serde(flatten)]
    pub call: CallOptions,
}
