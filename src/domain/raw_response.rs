use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyId {
    DirectHttp,
    InPageCall,
    WaitAndScrape,
    ScrollExhaustion,
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyId::DirectHttp => "direct-http",
            StrategyId::InPageCall => "in-page-call",
            StrategyId::WaitAndScrape => "wait-and-scrape",
            StrategyId::ScrollExhaustion => "scroll-exhaustion",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultElement {
    pub text: String,
    pub classes: Vec<String>,
}

impl ResultElement {
    pub fn new(text: &str) -> Self {
        ResultElement {
            text: text.to_string(),
            classes: vec![],
        }
    }

    pub fn with_classes(text: &str, classes: &[&str]) -> Self {
        ResultElement {
            text: text.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Json(String),
    Markup(String),
    Elements(Vec<ResultElement>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: Option<u16>,
    pub strategy: StrategyId,
    pub body: ResponseBody,
}

impl RawResponse {
    pub fn new(strategy: StrategyId, status: Option<u16>, body: ResponseBody) -> Self {
        RawResponse {
            status,
            strategy,
            body,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Json(text) | ResponseBody::Markup(text) => Some(text),
            ResponseBody::Elements(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateDomain(pub String);

impl CandidateDomain {
    pub fn full(domain: &str) -> Self {
        CandidateDomain(domain.trim().to_string())
    }

    pub fn from_label(label: &str) -> Self {
        CandidateDomain(format!("{}.com", label.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
