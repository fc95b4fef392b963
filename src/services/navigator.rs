use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::{
    configuration::{BrowserSettings, EndpointSettings, NamegrepSettings},
    domain::{
        Pattern, RawResponse, ResponseBody, ResultElement, SearchError, StrategyId,
        UpstreamLimitWarning,
    },
};

use super::{
    detect_limit_warning_in_body, detect_limit_warning_in_markup, endpoint_url, ResponseProcessor,
    SearchPhase, SearchTrace,
};

const NUDGE_EVENTS: [&str; 2] = ["hashchange", "load"];

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InPageResponse {
    pub status: u16,
    #[serde(default)]
    pub content_type: String,
    pub body: String,
}

#[async_trait]
pub trait PageSession: Send + Sync + 'static {
    async fn open(&self, url: &str) -> Result<(), SearchError>;
    async fn enter_query(&self, input_id: &str, text: &str) -> Result<(), SearchError>;
    async fn submit_form(&self, form_id: &str) -> Result<(), SearchError>;
    async fn fetch_in_page(&self, url: &str) -> Result<Option<InPageResponse>, SearchError>;
    async fn dispatch_events(&self, events: &[&str]) -> Result<(), SearchError>;
    async fn result_elements(&self, selector: &str) -> Result<Vec<ResultElement>, SearchError>;
    async fn result_count(&self, selector: &str) -> Result<usize, SearchError>;
    async fn page_source(&self) -> Result<String, SearchError>;
    async fn scroll_to_bottom(&self) -> Result<(), SearchError>;
    async fn click_load_more(&self, phrases: &[String]) -> Result<bool, SearchError>;
    async fn close(&self) -> Result<(), SearchError>;
}

#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: PageSession;

    async fn launch(&self) -> Result<Self::Session, SearchError>;
}

/// Owns a session for the length of one search. `release` closes it in
/// line; if the guard is dropped instead (error return, search future
/// cancelled on timeout) the close runs on a spawned task.
pub struct SessionGuard<S: PageSession> {
    session: Option<S>,
}

impl<S: PageSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        SessionGuard {
            session: Some(session),
        }
    }

    pub fn session(&self) -> Result<&S, SearchError> {
        self.session
            .as_ref()
            .ok_or_else(|| SearchError::Navigation("browser session already released".to_string()))
    }

    pub async fn release(mut self) {
        if let Some(session) = self.session.take() {
            close_session(session).await;
        }
    }
}

impl<S: PageSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                log::warn!("Browser session abandoned, closing in background");
                handle.spawn(close_session(session));
            }
            Err(_) => log::error!("Browser session abandoned outside a runtime, cannot close it"),
        }
    }
}

async fn close_session<S: PageSession>(session: S) {
    match session.close().await {
        Ok(_) => log::info!("Closed browser session"),
        Err(e) => log::error!("Error closing browser session: {}", e),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollOutcome {
    pub attempts: u32,
    pub final_count: usize,
    pub stabilized: bool,
}

/// Scrolls and clicks "load more" until the result count has not changed for
/// `stable_rounds` attempts in a row, or `max_scroll_attempts` is spent.
pub async fn scroll_until_stable<S: PageSession>(
    session: &S,
    settings: &BrowserSettings,
) -> Result<ScrollOutcome, SearchError> {
    let mut last_count = session.result_count(&settings.result_selector).await?;
    let mut unchanged_rounds = 0;
    let mut attempts = 0;

    while attempts < settings.max_scroll_attempts {
        attempts += 1;

        session.scroll_to_bottom().await?;
        if session.click_load_more(&settings.load_more_phrases).await? {
            log::debug!("Clicked a load-more control on attempt {}", attempts);
        }
        tokio::time::sleep(settings.scroll_delay()).await;

        let count = session.result_count(&settings.result_selector).await?;
        match count == last_count {
            true => unchanged_rounds += 1,
            false => {
                log::info!("Scroll attempt {}: {} results", attempts, count);
                unchanged_rounds = 0;
                last_count = count;
            }
        }

        if unchanged_rounds >= settings.stable_rounds {
            return Ok(ScrollOutcome {
                attempts,
                final_count: last_count,
                stabilized: true,
            });
        }
    }

    log::warn!(
        "Result count still changing after {} scroll attempts",
        attempts
    );
    Ok(ScrollOutcome {
        attempts,
        final_count: last_count,
        stabilized: false,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOutcome {
    pub domains: Vec<String>,
    pub strategy: StrategyId,
    pub warning: Option<UpstreamLimitWarning>,
}

pub struct Navigator<L: SessionLauncher> {
    launcher: L,
    settings: BrowserSettings,
    base_url: Url,
    endpoints: Vec<EndpointSettings>,
    limit_markers: Vec<String>,
}

impl<L: SessionLauncher> Navigator<L> {
    pub fn new(
        launcher: L,
        settings: BrowserSettings,
        namegrep: &NamegrepSettings,
    ) -> Result<Self, SearchError> {
        let base_url = Url::parse(&namegrep.base_url).map_err(|e| {
            SearchError::Navigation(format!("invalid base url {}: {}", namegrep.base_url, e))
        })?;

        Ok(Navigator {
            launcher,
            settings,
            base_url,
            endpoints: namegrep.endpoints.clone(),
            limit_markers: namegrep.limit_markers.clone(),
        })
    }

    pub async fn search(
        &self,
        pattern: &Pattern,
        processor: &ResponseProcessor,
        trace: &mut SearchTrace,
    ) -> Result<StrategyOutcome, SearchError> {
        trace.enter(SearchPhase::Fetching);
        log::info!("[{}] Launching browser session", trace.id);

        let guard = SessionGuard::new(self.launcher.launch().await?);
        let outcome = self.drive(guard.session()?, pattern, processor, trace).await;
        guard.release().await;

        outcome
    }

    async fn drive(
        &self,
        session: &L::Session,
        pattern: &Pattern,
        processor: &ResponseProcessor,
        trace: &mut SearchTrace,
    ) -> Result<StrategyOutcome, SearchError> {
        session.open(self.base_url.as_str()).await?;
        session
            .enter_query(&self.settings.query_input_id, pattern.as_str())
            .await?;
        tokio::time::sleep(self.settings.typing_delay()).await;
        session.submit_form(&self.settings.form_id).await?;
        log::info!("[{}] Submitted query in browser", trace.id);

        if let Some(outcome) = self.in_page_call(session, pattern, processor, trace).await {
            return Ok(outcome);
        }

        let mut warning = None;
        match self.wait_and_scrape(session, processor, trace).await {
            Ok(outcome) if !outcome.domains.is_empty() => return Ok(outcome),
            Ok(outcome) => warning = outcome.warning,
            Err(e) => log::warn!("[{}] Wait-and-scrape failed: {}", trace.id, e),
        }

        let mut outcome = self.scroll_exhaustion(session, processor, trace).await?;
        outcome.warning = outcome.warning.or(warning);
        Ok(outcome)
    }

    async fn in_page_call(
        &self,
        session: &L::Session,
        pattern: &Pattern,
        processor: &ResponseProcessor,
        trace: &mut SearchTrace,
    ) -> Option<StrategyOutcome> {
        for endpoint in self.endpoints.iter() {
            let Some(url) = endpoint_url(&self.base_url, endpoint, pattern) else {
                continue;
            };

            trace.enter(SearchPhase::Fetching);
            let response = match session.fetch_in_page(url.as_str()).await {
                Ok(Some(response)) => response,
                Ok(None) => {
                    log::warn!("[{}] In-page call to {} failed", trace.id, endpoint.path);
                    continue;
                }
                Err(e) => {
                    log::warn!("[{}] In-page call to {} errored: {}", trace.id, endpoint.path, e);
                    continue;
                }
            };

            if !(200..300).contains(&response.status) {
                log::warn!(
                    "[{}] In-page call to {} returned status {}",
                    trace.id,
                    endpoint.path,
                    response.status
                );
                continue;
            }

            let body = match response.content_type.contains("json") {
                true => ResponseBody::Json(response.body),
                false => ResponseBody::Markup(response.body),
            };
            let raw = RawResponse::new(StrategyId::InPageCall, Some(response.status), body);
            let domains = processor.process(&raw, trace);

            if !domains.is_empty() {
                return Some(StrategyOutcome {
                    domains,
                    strategy: StrategyId::InPageCall,
                    warning: detect_limit_warning_in_body(&raw, &self.limit_markers),
                });
            }
        }

        None
    }

    async fn wait_and_scrape(
        &self,
        session: &L::Session,
        processor: &ResponseProcessor,
        trace: &mut SearchTrace,
    ) -> Result<StrategyOutcome, SearchError> {
        trace.enter(SearchPhase::Fetching);
        tokio::time::sleep(self.settings.settle_delay()).await;
        session.dispatch_events(&NUDGE_EVENTS).await?;
        tokio::time::sleep(self.settings.nudge_delay()).await;

        self.scrape(session, StrategyId::WaitAndScrape, processor, trace)
            .await
    }

    async fn scroll_exhaustion(
        &self,
        session: &L::Session,
        processor: &ResponseProcessor,
        trace: &mut SearchTrace,
    ) -> Result<StrategyOutcome, SearchError> {
        trace.enter(SearchPhase::Fetching);
        let scroll = scroll_until_stable(session, &self.settings).await?;
        log::info!(
            "[{}] Scrolling stopped after {} attempts with {} results (stable: {})",
            trace.id,
            scroll.attempts,
            scroll.final_count,
            scroll.stabilized
        );

        self.scrape(session, StrategyId::ScrollExhaustion, processor, trace)
            .await
    }

    async fn scrape(
        &self,
        session: &L::Session,
        strategy: StrategyId,
        processor: &ResponseProcessor,
        trace: &mut SearchTrace,
    ) -> Result<StrategyOutcome, SearchError> {
        let elements = session.result_elements(&self.settings.result_selector).await?;
        let source = session.page_source().await?;
        let warning = detect_limit_warning_in_markup(&source, &self.limit_markers);
        if let Some(warning) = &warning {
            log::warn!("[{}] Upstream limit banner: {}", trace.id, warning.message);
        }

        let body = match elements.is_empty() {
            true => ResponseBody::Markup(source),
            false => ResponseBody::Elements(elements),
        };
        let domains = processor.process(&RawResponse::new(strategy, None, body), trace);

        Ok(StrategyOutcome {
            domains,
            strategy,
            warning,
        })
    }
}
