use std::time::Duration;

use actix_web::{
    error::{InternalError, JsonPayloadError},
    post, web, HttpRequest, HttpResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::{
    domain::{SearchError, StrategyId},
    services::NamegrepSearcher,
};

const MISSING_PATTERN: &str = "regexPattern is required";
const SEARCH_FAILED: &str = "Failed to scrape domains";

pub struct SearchLimiter {
    permits: Semaphore,
    timeout: Duration,
}

impl SearchLimiter {
    pub fn new(max_concurrent: usize, timeout: Duration) -> Self {
        SearchLimiter {
            permits: Semaphore::new(max_concurrent.max(1)),
            timeout,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchDomainsBody {
    regex_pattern: Option<String>,
}

#[derive(Serialize)]
struct SearchDomainsResponse {
    success: bool,
    pattern: String,
    domains: Vec<String>,
    count: usize,
    timestamp: String,
    strategy: Option<StrategyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: &'static str,
    message: String,
    timestamp: String,
}

fn error_envelope(error: &'static str, message: String) -> ErrorEnvelope {
    ErrorEnvelope {
        success: false,
        error,
        message,
        timestamp: Utc::now().to_rfc3339(),
    }
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(error_envelope(MISSING_PATTERN, message))
}

fn search_failed(message: String) -> HttpResponse {
    HttpResponse::InternalServerError().json(error_envelope(SEARCH_FAILED, message))
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected search body: {}", err);
    let response = bad_request(format!("Please provide a regex pattern ({})", err));
    InternalError::from_response(err, response).into()
}

#[post("/search-domains")]
async fn search_domains(
    searcher: web::Data<NamegrepSearcher>,
    limiter: web::Data<SearchLimiter>,
    body: web::Json<SearchDomainsBody>,
) -> HttpResponse {
    let pattern = body.into_inner().regex_pattern.unwrap_or_default();
    if pattern.trim().is_empty() {
        return bad_request("Please provide a regex pattern".to_string());
    }

    let _permit = match limiter.permits.acquire().await {
        Ok(permit) => permit,
        Err(e) => {
            log::error!("Search limiter closed: {}", e);
            return search_failed("Search service is shutting down".to_string());
        }
    };

    match tokio::time::timeout(limiter.timeout, searcher.search(&pattern)).await {
        Ok(Ok(result)) => HttpResponse::Ok().json(SearchDomainsResponse {
            success: true,
            pattern: result.pattern,
            count: result.count,
            domains: result.domains,
            timestamp: Utc::now().to_rfc3339(),
            strategy: result.strategy,
            warning: result.warning.map(|w| w.message),
        }),
        Ok(Err(SearchError::InvalidInput(message))) => bad_request(message),
        Ok(Err(e)) => search_failed(e.to_string()),
        Err(_) => {
            log::error!(
                "Search for {} abandoned after {}s",
                pattern,
                limiter.timeout.as_secs()
            );
            search_failed(format!(
                "search timed out after {} seconds",
                limiter.timeout.as_secs()
            ))
        }
    }
}
