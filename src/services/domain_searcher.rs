use url::Url;

use crate::{
    configuration::{NamegrepSettings, SearchMode, Settings},
    domain::{Pattern, SearchError, SearchResult, SetupError, StrategyId},
};

use super::{
    detect_limit_warning_in_body, endpoint_url, HttpTransport, Navigator, ResponseProcessor,
    SearchPhase, SearchTrace, SessionLauncher, StrategyOutcome, Transport, WebDriverLauncher,
};

pub type NamegrepSearcher = DomainSearcher<HttpTransport, WebDriverLauncher>;

pub struct DomainSearcher<T: Transport, L: SessionLauncher> {
    transport: T,
    navigator: Option<Navigator<L>>,
    processor: ResponseProcessor,
    base_url: Url,
    settings: NamegrepSettings,
}

impl<T: Transport, L: SessionLauncher> DomainSearcher<T, L> {
    pub fn new(settings: &Settings, transport: T, launcher: Option<L>) -> Result<Self, SetupError> {
        let base_url = Url::parse(&settings.namegrep.base_url)?;
        let navigator = match launcher {
            Some(launcher) => Some(Navigator::new(
                launcher,
                settings.browser.clone(),
                &settings.namegrep,
            )?),
            None => None,
        };

        Ok(DomainSearcher {
            transport,
            navigator,
            processor: ResponseProcessor::new(
                &settings.browser.result_selector,
                settings.sanitize.clone(),
            )?,
            base_url,
            settings: settings.namegrep.clone(),
        })
    }

    pub async fn search(&self, raw_pattern: &str) -> Result<SearchResult, SearchError> {
        let pattern = Pattern::parse(raw_pattern)?;
        let mut trace = SearchTrace::start(&pattern);

        match self.run(&pattern, &mut trace).await {
            Ok(outcome) => {
                trace.finish(outcome.domains.len());
                Ok(SearchResult::new(raw_pattern, outcome.domains)
                    .with_strategy(outcome.strategy)
                    .with_warning(outcome.warning))
            }
            Err(e) => {
                trace.fail(&e);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        pattern: &Pattern,
        trace: &mut SearchTrace,
    ) -> Result<StrategyOutcome, SearchError> {
        match self.settings.mode {
            SearchMode::Http => self.direct(pattern, trace).await,
            SearchMode::Browser => self.browser(pattern, trace).await,
            SearchMode::Auto => {
                let direct = self.direct(pattern, trace).await;
                match (&direct, self.navigator.is_some()) {
                    (Ok(outcome), _) if !outcome.domains.is_empty() => direct,
                    (_, false) => direct,
                    (Ok(_), true) => {
                        log::info!("[{}] Direct requests found nothing, trying browser", trace.id);
                        self.browser(pattern, trace).await
                    }
                    (Err(e), true) => {
                        log::warn!("[{}] Direct requests failed ({}), trying browser", trace.id, e);
                        self.browser(pattern, trace).await
                    }
                }
            }
        }
    }

    async fn direct(
        &self,
        pattern: &Pattern,
        trace: &mut SearchTrace,
    ) -> Result<StrategyOutcome, SearchError> {
        trace.enter(SearchPhase::Fetching);
        let cookie = match self.settings.bootstrap_session {
            true => self.transport.session_cookie().await,
            false => None,
        };

        let mut answered: Option<StrategyOutcome> = None;
        let mut last_error = None;

        for endpoint in self.settings.endpoints.iter() {
            let Some(url) = endpoint_url(&self.base_url, endpoint, pattern) else {
                continue;
            };

            trace.enter(SearchPhase::Fetching);
            let response = match self.transport.fetch(url, cookie.clone()).await {
                Ok(response) => response,
                Err(e) => {
                    log::warn!("[{}] Endpoint {} failed: {}", trace.id, endpoint.path, e);
                    last_error = Some(e);
                    continue;
                }
            };

            let outcome = StrategyOutcome {
                domains: self.processor.process(&response, trace),
                strategy: StrategyId::DirectHttp,
                warning: detect_limit_warning_in_body(&response, &self.settings.limit_markers),
            };

            if !outcome.domains.is_empty() {
                return Ok(outcome);
            }
            answered.get_or_insert(outcome);
        }

        match (answered, last_error) {
            (Some(outcome), _) => Ok(outcome),
            (None, Some(e)) => Err(e),
            (None, None) => Err(SearchError::Transport(
                "no usable endpoint configured".to_string(),
            )),
        }
    }

    async fn browser(
        &self,
        pattern: &Pattern,
        trace: &mut SearchTrace,
    ) -> Result<StrategyOutcome, SearchError> {
        match &self.navigator {
            Some(navigator) => navigator.search(pattern, &self.processor, trace).await,
            None => Err(SearchError::Navigation(
                "browser strategies are disabled".to_string(),
            )),
        }
    }
}
