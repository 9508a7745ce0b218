//! Named, pure value transforms for field specs.
//!
//! Each transform sees the resolved raw node (if any) and the whole tree the
//! spec was resolved against, and produces the field's final value. Transforms
//! that produce lists yield an empty list rather than null.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use url::Url;

use crate::extract::resolve;
use crate::parse::html_to_text;
use crate::{path, Error, Result, BASE_URL};

const MICROS: f64 = 1_000_000.0;
const MAX_COMMENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arg", rename_all = "snake_case")]
pub enum Transform {
    /// Micro-units to a decimal amount, 0 when absent.
    MicrosToDecimal,
    /// Like [`Transform::MicrosToDecimal`] but null when absent or zero.
    OptionalMicros,
    /// `true` only for a present zero.
    IsZero,
    /// `true` for zero or absent.
    IsFree,
    /// `true` when absent.
    FreeIfAbsent,
    Truthy,
    ToInt,
    IntToString,
    SecondsToMillis,
    EqualsOne,
    IsString,
    /// The string itself, or null when empty or not a string.
    NonEmpty,
    /// The string itself, or the given default when empty or not a string.
    OrDefault(Value),
    HtmlToText,
    /// Leading version number of text like "5.0 and up", else `VARY`.
    AndroidVersion,
    /// The `id=` parameter of a developer link.
    DeveloperId,
    /// Multi-line text joined with ", ", null when empty.
    JoinLines,
    ResolveUrl,
    /// `[seconds, nanos]` to an RFC 3339 UTC instant.
    Timestamp,
    Histogram,
    Categories,
    Screenshots,
    Comments,
    Criterias,
    /// First number in a localized price text such as "$1,299.99".
    PriceFromText,
    DataEntries,
    SecurityPractices,
}

impl FromStr for Transform {
    type Err = Error;

    /// Resolves a transform by name. Only transforms without an argument can be named this way.
    fn from_str(name: &str) -> Result<Self> {
        serde_json::from_value(json!({ "name": name }))
            .map_err(|_| Error::InvalidArgument(format!("unknown transform {name}")))
    }
}

impl Transform {
    pub fn apply(&self, raw: Option<&Value>, tree: &Value) -> Value {
        match self {
            Transform::MicrosToDecimal => json!(raw.and_then(as_f64).unwrap_or(0.0) / MICROS),
            Transform::OptionalMicros => match raw.and_then(as_f64) {
                Some(micros) if micros != 0.0 => json!(micros / MICROS),
                _ => Value::Null,
            },
            Transform::IsZero => json!(raw.and_then(as_f64) == Some(0.0)),
            Transform::IsFree => json!(raw.and_then(as_f64).unwrap_or(0.0) == 0.0),
            Transform::FreeIfAbsent => json!(raw.is_none()),
            Transform::Truthy => json!(truthy(raw)),
            Transform::ToInt => json!(raw.and_then(as_i64).unwrap_or(0)),
            Transform::IntToString => json!(raw.and_then(as_i64).unwrap_or(0).to_string()),
            Transform::SecondsToMillis => json!(raw.and_then(as_i64).unwrap_or(0).saturating_mul(1000)),
            Transform::EqualsOne => json!(raw.and_then(as_f64) == Some(1.0)),
            Transform::IsString => json!(raw.is_some_and(Value::is_string)),
            Transform::NonEmpty => non_empty_str(raw).map_or(Value::Null, |s| json!(s)),
            Transform::OrDefault(default) => non_empty_str(raw).map_or_else(|| default.clone(), |s| json!(s)),
            Transform::HtmlToText => non_empty_str(raw).map_or(Value::Null, |s| json!(html_to_text(s))),
            Transform::AndroidVersion => json!(android_version(raw.and_then(Value::as_str).unwrap_or_default())),
            Transform::DeveloperId => json!(developer_id(raw.and_then(Value::as_str).unwrap_or_default())),
            Transform::JoinLines => non_empty_str(raw).map_or(Value::Null, |s| json!(s.replace('\n', ", "))),
            Transform::ResolveUrl => resolve_url(raw.and_then(Value::as_str).unwrap_or_default()),
            Transform::Timestamp => raw.and_then(timestamp).map_or(Value::Null, Value::String),
            Transform::Histogram => histogram(raw),
            Transform::Categories => categories(raw),
            Transform::Screenshots => Value::Array(
                items(raw)
                    .filter_map(|shot| non_empty_str(resolve(shot, &path![3, 2])))
                    .map(|url| json!(url))
                    .collect(),
            ),
            Transform::Comments => comments(tree),
            Transform::Criterias => Value::Array(
                items(raw)
                    .map(|c| {
                        json!({
                            "criteria": resolve(c, &path![0]).and_then(Value::as_str).unwrap_or_default(),
                            "rating": resolve(c, &path![1, 0]).and_then(as_i64),
                        })
                    })
                    .collect(),
            ),
            Transform::PriceFromText => json!(price_from_text(raw.and_then(Value::as_str).unwrap_or_default())),
            Transform::DataEntries => data_entries(raw),
            Transform::SecurityPractices => Value::Array(
                items(raw)
                    .filter_map(|p| {
                        let practice = resolve(p, &path![1]).and_then(Value::as_str).unwrap_or_default();
                        let description = resolve(p, &path![2, 1]).and_then(Value::as_str).unwrap_or_default();
                        (!practice.is_empty() || !description.is_empty())
                            .then(|| json!({"practice": practice, "description": description}))
                    })
                    .collect(),
            ),
        }
    }
}

/// Non-zero numbers, non-empty strings, `true` and any container are truthy.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

fn as_i64(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value.and_then(Value::as_array).into_iter().flatten()
}

fn android_version(text: &str) -> String {
    let number = text.split(' ').next().unwrap_or_default();
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return "VARY".to_string();
    }
    number.to_string()
}

fn developer_id(link: &str) -> String {
    link.split("id=").nth(1).unwrap_or_default().to_string()
}

fn resolve_url(path: &str) -> Value {
    Url::parse(BASE_URL)
        .and_then(|base| base.join(path))
        .map_or(Value::Null, |url| json!(url.as_str()))
}

/// The upstream splits instants into whole seconds and a nanosecond part; the
/// millisecond value is the seconds followed by the first three digits of the nanos.
fn timestamp(value: &Value) -> Option<String> {
    let parts = value.as_array()?;
    let seconds = as_i64(parts.first()?)?;
    let nanos = match parts.get(1) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(other) => as_i64(other).map(|n| n.to_string()).unwrap_or_default(),
        None => String::new(),
    };
    let millis_digits: String = nanos.chars().chain(std::iter::repeat('0')).take(3).collect();
    let millis: i64 = format!("{seconds}{millis_digits}").parse().ok()?;
    DateTime::from_timestamp_millis(millis).map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn histogram(value: Option<&Value>) -> Value {
    let mut counts = Map::new();
    for star in 1..=5usize {
        let count = value
            .and_then(Value::as_array)
            .filter(|rows| rows.len() >= 6)
            .and_then(|rows| resolve(&rows[star], &path![1]))
            .and_then(as_i64)
            .unwrap_or(0);
        counts.insert(star.to_string(), json!(count));
    }
    Value::Object(counts)
}

/// Categories are nested at varying depth under `[118]`; a node is a category when
/// it has at least four elements and starts with its name. Without any, the
/// primary genre at `[79,0,0]` stands in.
fn categories(app: Option<&Value>) -> Value {
    fn collect(node: &Value, out: &mut Vec<Value>) {
        let Some(items) = node.as_array().filter(|items| !items.is_empty()) else {
            return;
        };
        if items.len() >= 4 {
            if let Some(name) = items[0].as_str() {
                out.push(json!({"name": name, "id": items[2].as_str()}));
                return;
            }
        }
        for item in items {
            collect(item, out);
        }
    }

    let Some(app) = app else {
        return json!([]);
    };
    let mut found = Vec::new();
    if let Some(node) = resolve(app, &path![118]) {
        collect(node, &mut found);
    }
    if found.is_empty() {
        let genre = |i: i64| resolve(app, &path![79, 0, 0, i]).and_then(Value::as_str).unwrap_or_default();
        found.push(json!({"name": genre(0), "id": genre(2)}));
    }
    Value::Array(found)
}

/// Up to five review texts from whichever of `ds:8`/`ds:9` holds the page's reviews.
fn comments(tree: &Value) -> Value {
    for dataset in ["ds:8", "ds:9"] {
        let first = |tail: &[i64]| {
            let mut p = path![dataset, 0, 0];
            p.extend(tail.iter().map(|&i| i.into()));
            resolve(tree, &p).is_some()
        };
        if !(first(&[1, 0]) && first(&[10]) && first(&[5, 0])) {
            continue;
        }
        let Some(reviews) = resolve(tree, &path![dataset, 0]).and_then(Value::as_array) else {
            continue;
        };
        let texts = reviews
            .iter()
            .filter_map(|review| non_empty_str(resolve(review, &path![4])))
            .take(MAX_COMMENTS)
            .map(|text| json!(text))
            .collect();
        return Value::Array(texts);
    }
    json!([])
}

fn price_from_text(text: &str) -> f64 {
    let start = text.find(|c: char| c.is_ascii_digit() || c == '.' || c == ',');
    let Some(start) = start else {
        return 0.0;
    };
    let number: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    number.parse().unwrap_or(0.0)
}

fn data_entries(value: Option<&Value>) -> Value {
    let mut entries = Vec::new();
    for group in items(value) {
        let kind = resolve(group, &path![0, 1]).and_then(Value::as_str).unwrap_or_default();
        let Some(details) = resolve(group, &path![4]).and_then(Value::as_array) else {
            continue;
        };
        for detail in details {
            entries.push(json!({
                "data": resolve(detail, &path![0]).and_then(Value::as_str).unwrap_or_default(),
                "optional": truthy(resolve(detail, &path![1])),
                "purpose": resolve(detail, &path![2]).and_then(Value::as_str).unwrap_or_default(),
                "type": kind,
            }));
        }
    }
    Value::Array(entries)
}
