use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // -- Validation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -- Transport
    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("The call was cancelled.")]
    Cancelled,
    #[error("Not found (404): {0}")]
    NotFound(String),
    #[error("Upstream responded with status {status}: {body}")]
    Upstream { status: u16, body: String },

    // -- Protocol
    #[error("Unexpected response structure: {0}")]
    Protocol(String),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Couldn't evaluate the object literal: {0}")]
    JsLiteral(String),
    #[error("The selector you are trying to scrape for is invalid. Selector: {0}")]
    ParseSelector(String),

    // -- Plumbing
    #[error("Url Error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),
}

impl Error {
    /// Errors worth another attempt: the exchange itself failed, not the data.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Reqwest(_) | Error::Timeout(_) => true,
            Error::Upstream { status, .. } => matches!(status, 429 | 503),
            _ => false,
        }
    }
}
