use chrono::Local;
use serde_json::{json, Value};

use super::details_path;
use crate::extract::{extract_fields, field_map, into_record, FieldMap, FieldSpec, Path, Segment};
use crate::models::App;
use crate::options::AppOptions;
use crate::scriptdata::parse_script_data;
use crate::transform::Transform;
use crate::{info_time, path, Client, Result};

/// `path` under the app record of a details page, `ds:5` `[1][2]`.
fn at(tail: &[i64]) -> Path {
    let mut full = path!["ds:5", 1, 2];
    full.extend(tail.iter().copied().map(Segment::from));
    full
}

fn field(tail: &[i64]) -> FieldSpec {
    FieldSpec::new(at(tail))
}

/// Some blocks moved one slot up in newer page layouts; the old slot is tried first.
fn drifting(tail: &[i64]) -> FieldSpec {
    let mut moved = tail.to_vec();
    moved[0] += 1;
    field(tail).with_fallback(at(&moved))
}

const PRICE: [i64; 5] = [57, 0, 0, 0, 0];

fn price(tail: &[i64]) -> FieldSpec {
    field(&[&PRICE[..], tail].concat())
}

/// The field table of an app details page.
pub fn app_fields() -> FieldMap {
    field_map([
        ("title", field(&[0, 0])),
        (
            "description",
            field(&[12, 0, 0, 1])
                .with_fallback(at(&[72, 0, 1]))
                .with_transform(Transform::HtmlToText),
        ),
        ("descriptionHTML", field(&[12, 0, 0, 1]).with_fallback(at(&[72, 0, 1]))),
        ("summary", field(&[73, 0, 1])),
        ("installs", field(&[13, 0])),
        ("minInstalls", field(&[13, 1]).with_transform(Transform::ToInt)),
        ("maxInstalls", field(&[13, 2]).with_transform(Transform::ToInt)),
        ("score", field(&[51, 0, 1])),
        ("scoreText", field(&[51, 0, 0])),
        ("ratings", field(&[51, 2, 1]).with_transform(Transform::ToInt)),
        ("reviews", field(&[51, 3, 1]).with_transform(Transform::ToInt)),
        ("histogram", field(&[51, 1]).with_transform(Transform::Histogram)),
        ("price", price(&[1, 0, 0]).with_transform(Transform::MicrosToDecimal)),
        ("originalPrice", price(&[1, 1, 0]).with_transform(Transform::OptionalMicros)),
        ("discountEndDate", price(&[14, 1])),
        ("free", price(&[1, 0, 0]).with_transform(Transform::IsZero)),
        ("currency", price(&[1, 0, 1])),
        (
            "priceText",
            price(&[1, 0, 2]).with_transform(Transform::OrDefault(json!("Free"))),
        ),
        ("available", field(&[18, 0]).with_transform(Transform::Truthy)),
        ("offersIAP", field(&[19, 0]).with_transform(Transform::Truthy)),
        ("IAPRange", field(&[19, 0])),
        (
            "androidVersion",
            drifting(&[140, 1, 1, 0, 0, 1]).with_transform(Transform::AndroidVersion),
        ),
        (
            "androidVersionText",
            drifting(&[140, 1, 1, 0, 0, 1]).with_transform(Transform::OrDefault(json!("Varies with device"))),
        ),
        (
            "androidMaxVersion",
            drifting(&[140, 1, 1, 0, 1, 1]).with_transform(Transform::AndroidVersion),
        ),
        ("developer", field(&[68, 0])),
        ("developerId", field(&[68, 1, 4, 2]).with_transform(Transform::DeveloperId)),
        (
            "developerInternalID",
            field(&[68, 1, 4, 2]).with_transform(Transform::DeveloperId),
        ),
        ("developerEmail", field(&[69, 1, 0])),
        ("developerWebsite", field(&[69, 0, 5, 2])),
        ("developerAddress", field(&[69, 2, 0])),
        ("developerLegalName", field(&[69, 4, 0])),
        ("developerLegalEmail", field(&[69, 4, 1, 0])),
        ("developerLegalAddress", field(&[69, 4, 2, 0]).with_transform(Transform::JoinLines)),
        ("developerLegalPhoneNumber", field(&[69, 4, 3])),
        ("privacyPolicy", field(&[99, 0, 5, 2])),
        ("genre", field(&[79, 0, 0, 0])),
        ("genreId", field(&[79, 0, 0, 2])),
        ("categories", field(&[]).with_transform(Transform::Categories)),
        ("icon", field(&[95, 0, 3, 2])),
        ("headerImage", field(&[96, 0, 3, 2])),
        ("screenshots", field(&[78, 0]).with_transform(Transform::Screenshots)),
        ("video", field(&[100, 0, 0, 3, 2])),
        ("videoImage", field(&[100, 1, 0, 3, 2])),
        ("previewVideo", field(&[100, 1, 2, 0, 2])),
        ("contentRating", field(&[9, 0])),
        ("contentRatingDescription", field(&[9, 2, 1])),
        ("adSupported", field(&[48]).with_transform(Transform::Truthy)),
        ("released", field(&[10, 0])),
        ("updated", drifting(&[145, 0, 1, 0]).with_transform(Transform::SecondsToMillis)),
        (
            "version",
            drifting(&[140, 0, 0, 0]).with_transform(Transform::OrDefault(json!("VARY"))),
        ),
        ("recentChanges", drifting(&[144, 1, 1])),
        ("comments", FieldSpec::computed(Transform::Comments)),
        ("preregister", field(&[18, 0]).with_transform(Transform::EqualsOne)),
        ("earlyAccessEnabled", field(&[18, 2]).with_transform(Transform::IsString)),
        ("isAvailableInPlayPass", field(&[62]).with_transform(Transform::Truthy)),
    ])
}

/// Builds the app record out of a decoded details page.
pub(crate) fn app_from_tree(tree: &Value, app_id: &str, url: String) -> Result<App> {
    let mut fields = extract_fields(tree, &app_fields());
    fields.insert("appId".into(), json!(app_id));
    fields.insert("url".into(), json!(url));
    into_record(fields)
}

impl Client {
    /// Full details of one app.
    pub async fn app(&self, options: AppOptions) -> Result<App> {
        let options = options.normalized()?;
        self.memoized("app", &options, || self.fetch_app(&options)).await
    }

    async fn fetch_app(&self, options: &AppOptions) -> Result<App> {
        let start_time = Local::now();
        let url = self.url(&details_path(&options.app_id, &options.lang, &options.country));
        let html = self.get(url.clone(), &options.call).await?;

        let tree = parse_script_data(&html);
        let app = app_from_tree(&tree, &options.app_id, url)?;
        info_time!(start_time, "Fetched app {}", options.app_id);
        Ok(app)
    }
}
