use serde::Serialize;

use super::StrategyId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamLimitWarning {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub pattern: String,
    pub domains: Vec<String>,
    pub count: usize,
    pub strategy: Option<StrategyId>,
    pub warning: Option<UpstreamLimitWarning>,
}

impl SearchResult {
    pub fn new(pattern: &str, domains: Vec<String>) -> Self {
        SearchResult {
            pattern: pattern.to_string(),
            count: domains.len(),
            domains,
            strategy: None,
            warning: None,
        }
    }

    pub fn with_strategy(mut self, strategy: StrategyId) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_warning(mut self, warning: Option<UpstreamLimitWarning>) -> Self {
        self.warning = warning;
        self
    }
}
