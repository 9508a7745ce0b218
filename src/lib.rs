//! Scraper core for an app storefront that exposes no public API.
//!
//! Pages carry their data as `AF_initDataCallback` blobs (plus one JavaScript
//! object literal) and the list endpoints answer through a batched RPC
//! envelope. Everything funnels into [`serde_json::Value`] trees that the
//! declarative [`extract`] engine maps onto typed records.

use std::time::Duration;

mod macros;

pub mod cache;
pub mod client;
pub mod constants;
pub mod endpoints;
pub mod envelope;
mod error;
pub mod extract;
pub mod jsliteral;
pub mod models;
pub mod options;
pub mod paginate;
mod parse;
pub mod request;
pub mod scriptdata;
pub mod throttle;
pub mod transform;

pub use client::{Client, ClientOptions};
pub use error::{Error, Result};

pub const BASE_URL: &str = "https://play.google.com";
pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_COUNTRY: &str = "us";
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; playscrape)";
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
/// Base wait between retries, doubled per attempt.
pub const DEFAULT_RETRY_WAIT: Duration = Duration::from_millis(400);
pub const MAX_BACKOFF_MULTIPLIER: u32 = 16;

pub const THROTTLE_WINDOW: Duration = Duration::from_secs(1);
pub const THROTTLE_POLL_INTERVAL: Duration = Duration::from_millis(2);

pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;

/// Apps per continuation round. The upstream decides page sizes, we only truncate.
pub const CLUSTER_PAGE_SIZE: usize = 100;
pub const REVIEWS_PAGE_SIZE: usize = 150;
