use thiserror::Error;
use thirtyfour::error::WebDriverError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("navigation failure: {0}")]
    Navigation(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        match e.is_timeout() {
            true => SearchError::Transport(format!("request timed out: {}", e)),
            false => SearchError::Transport(e.to_string()),
        }
    }
}

impl From<WebDriverError> for SearchError {
    fn from(e: WebDriverError) -> Self {
        SearchError::Navigation(e.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("json payload has no domain list (top-level keys: {0})")]
    UnknownJsonShape(String),
    #[error("response body is empty")]
    EmptyBody,
    #[error("extractor setup failed: {0}")]
    Setup(String),
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Search(#[from] SearchError),
}
