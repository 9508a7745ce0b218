//! Typed records returned by the endpoints.
//!
//! Wire names are camelCase (with the store's own spellings where they differ),
//! so cached bytes and CLI output share one shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppCategory {
    pub name: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct App {
    pub app_id: String,
    pub url: String,

    pub title: String,
    pub summary: String,

    pub developer: String,
    pub developer_id: String,

    pub icon: String,
    pub score: Option<f64>,
    pub score_text: Option<String>,

    pub price_text: Option<String>,
    pub free: Option<bool>,
    pub currency: Option<String>,
    pub price: Option<f64>,

    pub description: Option<String>,
    #[serde(rename = "descriptionHTML")]
    pub description_html: Option<String>,

    pub installs: Option<String>,
    pub min_installs: Option<i64>,
    pub max_installs: Option<i64>,

    pub ratings: Option<i64>,
    pub reviews: Option<i64>,
    pub histogram: BTreeMap<String, i64>,

    pub original_price: Option<f64>,
    pub discount_end_date: Option<String>,

    pub available: Option<bool>,
    #[serde(rename = "offersIAP")]
    pub offers_iap: Option<bool>,
    #[serde(rename = "IAPRange")]
    pub iap_range: Option<String>,
    pub size: Option<String>,

    pub android_version: Option<String>,
    pub android_version_text: Option<String>,
    pub android_max_version: Option<String>,

    #[serde(rename = "developerInternalID")]
    pub developer_internal_id: Option<String>,
    pub developer_email: Option<String>,
    pub developer_website: Option<String>,
    pub developer_address: Option<String>,
    pub developer_legal_name: Option<String>,
    pub developer_legal_email: Option<String>,
    pub developer_legal_address: Option<String>,
    pub developer_legal_phone_number: Option<String>,
    pub privacy_policy: Option<String>,

    pub genre: Option<String>,
    pub genre_id: Option<String>,
    pub categories: Vec<AppCategory>,

    pub header_image: Option<String>,
    pub screenshots: Vec<String>,
    pub video: Option<String>,
    pub video_image: Option<String>,
    pub preview_video: Option<String>,

    pub content_rating: Option<String>,
    pub content_rating_description: Option<String>,
    pub ad_supported: Option<bool>,

    pub released: Option<String>,
    pub updated: Option<i64>,
    pub version: Option<String>,

    pub recent_changes: Option<String>,
    pub comments: Vec<String>,

    pub preregister: Option<bool>,
    pub early_access_enabled: Option<bool>,
    pub is_available_in_play_pass: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewCriteria {
    pub criteria: String,
    pub rating: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub user_name: String,
    pub user_image: String,
    pub date: String,
    pub score: i64,
    pub score_text: String,
    pub url: String,
    pub title: Option<String>,
    pub text: String,
    pub reply_date: Option<String>,
    pub reply_text: Option<String>,
    pub version: Option<String>,
    pub thumbs_up: Option<i64>,
    pub criterias: Vec<ReviewCriteria>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewsResult {
    pub data: Vec<Review>,
    /// Present when the upstream has more pages; pass it back to continue.
    pub next_pagination_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionItem {
    pub permission: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Either `items` (full listing) or `names` (short listing) is filled, per `short`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsResult {
    pub short: bool,
    pub items: Vec<PermissionItem>,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSafetyEntry {
    pub data: String,
    pub optional: bool,
    pub purpose: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityPractice {
    pub practice: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataSafetyResult {
    pub data_shared: Vec<DataSafetyEntry>,
    pub data_collected: Vec<DataSafetyEntry>,
    pub security_practices: Vec<SecurityPractice>,
    pub privacy_policy_url: Option<String>,
}
