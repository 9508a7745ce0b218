//! Continuation-token pagination.
//!
//! A [`PageSource`] fetches one decoded page for an optional token; [`paginate`]
//! keeps asking until the target is reached or the upstream stops handing out
//! tokens. Page sizes are the upstream's business, the engine only truncates.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::extract::{extract_list, resolve, ExtractionResult, FieldMap, Path};
use crate::Result;

/// Where the items and the next token live inside a decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub items: Path,
    pub token: Path,
    pub fields: FieldMap,
}

impl PageLayout {
    pub fn items(&self, page: &Value) -> Vec<ExtractionResult> {
        extract_list(page, &self.items, &self.fields)
    }

    /// The continuation token, if the page carries a non-empty one.
    pub fn token(&self, page: &Value) -> Option<String> {
        resolve(page, &self.token)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }
}

#[async_trait]
pub trait PageSource: Send + Sync {
    fn layout(&self) -> &PageLayout;

    /// One page, or `None` when the upstream answered with an explicit null payload.
    async fn fetch_page(&self, token: Option<&str>) -> Result<Option<Value>>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinuationState {
    target: usize,
    accumulated: Vec<ExtractionResult>,
    token: Option<String>,
    rounds: usize,
    round_limit: Option<usize>,
    exhausted: bool,
}

impl ContinuationState {
    /// Nothing fetched yet; the first round goes out without a token.
    pub fn new(target: usize) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// Continues from a token handed out by an earlier call.
    pub fn resume(target: usize, token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            ..Self::new(target)
        }
    }

    /// First page already in hand (decoded from HTML). Without a token there is nothing more.
    pub fn seeded(target: usize, items: Vec<ExtractionResult>, token: Option<String>) -> Self {
        let token = token.filter(|t| !t.is_empty());
        Self {
            target,
            accumulated: items,
            exhausted: token.is_none(),
            token,
            ..Default::default()
        }
    }

    pub fn with_round_limit(mut self, limit: usize) -> Self {
        self.round_limit = Some(limit);
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn len(&self) -> usize {
        self.accumulated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulated.is_empty()
    }

    pub fn is_done(&self) -> bool {
        self.exhausted
            || self.accumulated.len() >= self.target
            || self.round_limit.is_some_and(|limit| self.rounds >= limit)
    }

    pub fn accumulate(&mut self, page: &Value, layout: &PageLayout) {
        self.rounds += 1;
        self.accumulated.extend(layout.items(page));
        self.token = layout.token(page);
        self.exhausted = self.token.is_none();
    }

    /// The upstream sent a null payload: nothing more to fetch.
    pub fn exhaust(&mut self) {
        self.rounds += 1;
        self.token = None;
        self.exhausted = true;
    }

    pub fn finish(mut self) -> PageOutcome {
        self.accumulated.truncate(self.target);
        PageOutcome {
            items: self.accumulated,
            next_token: self.token,
            rounds: self.rounds,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOutcome {
    pub items: Vec<ExtractionResult>,
    /// The last token seen; `None` once the upstream ran out.
    pub next_token: Option<String>,
    pub rounds: usize,
}

/// Drives `source` until `state` is done. Rounds are strictly sequential.
pub async fn paginate(source: &dyn PageSource, mut state: ContinuationState) -> Result<PageOutcome> {
    while !state.is_done() {
        match source.fetch_page(state.token()).await? {
            Some(page) => state.accumulate(&page, source.layout()),
            None => state.exhaust(),
        }
        debug!(
            round = state.rounds,
            accumulated = state.len(),
            target = state.target,
            has_token = state.token.is_some(),
            "pagination round"
        );
    }
    Ok(state.finish())
}
