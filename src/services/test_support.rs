use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    configuration::BrowserSettings,
    domain::{ResultElement, SearchError},
};

use super::{InPageResponse, PageSession, SessionLauncher};

pub fn instant_browser_settings() -> BrowserSettings {
    BrowserSettings {
        typing_delay_ms: 0,
        settle_delay_ms: 0,
        nudge_delay_ms: 0,
        scroll_delay_ms: 0,
        ..BrowserSettings::default()
    }
}

#[derive(Default)]
pub struct FakeSession {
    calls: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicUsize>,
    in_page: Option<InPageResponse>,
    elements: Vec<ResultElement>,
    elements_after_scroll: Vec<ResultElement>,
    source: String,
    counts: Mutex<VecDeque<usize>>,
    last_count: AtomicUsize,
    scrolled: AtomicBool,
    missing_query_input: bool,
    open_delay: Duration,
}

impl FakeSession {
    pub fn with_in_page(mut self, response: InPageResponse) -> Self {
        self.in_page = Some(response);
        self
    }

    pub fn with_elements(mut self, elements: Vec<ResultElement>) -> Self {
        self.elements = elements;
        self
    }

    pub fn with_elements_after_scroll(mut self, elements: Vec<ResultElement>) -> Self {
        self.elements_after_scroll = elements;
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn with_counts(self, counts: &[usize]) -> Self {
        if let Ok(mut queue) = self.counts.lock() {
            queue.extend(counts.iter().copied());
        }
        self
    }

    pub fn without_query_input(mut self) -> Self {
        self.missing_query_input = true;
        self
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    pub fn closed(&self) -> Arc<AtomicUsize> {
        self.closed.clone()
    }

    pub fn calls_named(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn open(&self, url: &str) -> Result<(), SearchError> {
        self.record(format!("open:{}", url));
        tokio::time::sleep(self.open_delay).await;
        Ok(())
    }

    async fn enter_query(&self, input_id: &str, text: &str) -> Result<(), SearchError> {
        self.record(format!("query:{}:{}", input_id, text));
        match self.missing_query_input {
            true => Err(SearchError::Navigation(format!("#{} never appeared", input_id))),
            false => Ok(()),
        }
    }

    async fn submit_form(&self, form_id: &str) -> Result<(), SearchError> {
        self.record(format!("submit:{}", form_id));
        Ok(())
    }

    async fn fetch_in_page(&self, url: &str) -> Result<Option<InPageResponse>, SearchError> {
        self.record(format!("fetch:{}", url));
        Ok(self.in_page.clone())
    }

    async fn dispatch_events(&self, events: &[&str]) -> Result<(), SearchError> {
        self.record(format!("events:{}", events.join(",")));
        Ok(())
    }

    async fn result_elements(&self, _selector: &str) -> Result<Vec<ResultElement>, SearchError> {
        self.record("elements".to_string());
        match self.scrolled.load(Ordering::SeqCst) {
            true => Ok(self
                .elements
                .iter()
                .chain(self.elements_after_scroll.iter())
                .cloned()
                .collect()),
            false => Ok(self.elements.clone()),
        }
    }

    async fn result_count(&self, _selector: &str) -> Result<usize, SearchError> {
        let next = self.counts.lock().unwrap().pop_front();
        let count = match next {
            Some(count) => {
                self.last_count.store(count, Ordering::SeqCst);
                count
            }
            None => self.last_count.load(Ordering::SeqCst),
        };
        Ok(count)
    }

    async fn page_source(&self) -> Result<String, SearchError> {
        self.record("source".to_string());
        Ok(self.source.clone())
    }

    async fn scroll_to_bottom(&self) -> Result<(), SearchError> {
        self.record("scroll".to_string());
        self.scrolled.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn click_load_more(&self, _phrases: &[String]) -> Result<bool, SearchError> {
        Ok(false)
    }

    async fn close(&self) -> Result<(), SearchError> {
        self.record("close".to_string());
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeLauncher {
    session: Mutex<Option<FakeSession>>,
}

impl FakeLauncher {
    pub fn new(session: FakeSession) -> Self {
        FakeLauncher {
            session: Mutex::new(Some(session)),
        }
    }

    pub fn broken() -> Self {
        FakeLauncher {
            session: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self) -> Result<FakeSession, SearchError> {
        self.session
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| SearchError::Navigation("could not start browser".to_string()))
    }
}
