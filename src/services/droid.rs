use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thirtyfour::{prelude::*, ChromiumLikeCapabilities};

use crate::{
    configuration::BrowserSettings,
    domain::{ResultElement, SearchError},
};

use super::{InPageResponse, PageSession, SessionLauncher};

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

const SUBMIT_FORM_JS: &str = r#"
const form = document.getElementById(arguments[0]);
if (!form) { return false; }
if (typeof form.requestSubmit === 'function') { form.requestSubmit(); } else { form.submit(); }
return true;
"#;

const FETCH_IN_PAGE_JS: &str = r#"
const done = arguments[arguments.length - 1];
fetch(arguments[0], {
    credentials: 'include',
    headers: { 'Accept': 'application/json, text/plain, */*', 'X-Requested-With': 'XMLHttpRequest' }
})
    .then(res => res.text().then(body => done({
        status: res.status,
        content_type: res.headers.get('content-type') || '',
        body: body
    })))
    .catch(() => done(null));
"#;

const DISPATCH_EVENTS_JS: &str = r#"
for (const name of arguments[0]) { window.dispatchEvent(new Event(name)); }
"#;

const SCROLL_JS: &str = r#"
window.scrollTo(0, document.body.scrollHeight);
window.dispatchEvent(new Event('scroll'));
window.dispatchEvent(new Event('resize'));
"#;

const CLICK_LOAD_MORE_JS: &str = r#"
const phrases = arguments[0].map(p => p.toLowerCase());
const controls = document.querySelectorAll('button, a, [role="button"]');
for (const control of controls) {
    const text = (control.innerText || '').toLowerCase();
    if (control.offsetParent !== null && phrases.some(p => text.includes(p))) {
        control.click();
        return true;
    }
}
return false;
"#;

pub struct Droid {
    pub driver: WebDriver,
    element_wait: Duration,
}

impl Droid {
    pub async fn new(settings: &BrowserSettings, user_agent: &str) -> Result<Self, SearchError> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.set_headless()?;
        }
        for arg in [
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--disable-extensions",
            "--disable-blink-features=AutomationControlled",
            "--window-size=1366,768",
        ] {
            caps.add_arg(arg)?;
        }
        caps.add_arg(&format!("--user-agent={}", user_agent))?;

        let driver = WebDriver::new(&settings.webdriver_url, caps).await?;
        driver
            .set_page_load_timeout(settings.page_load_timeout())
            .await?;
        driver.set_script_timeout(settings.page_load_timeout()).await?;

        Ok(Droid {
            driver,
            element_wait: settings.element_wait(),
        })
    }
}

#[async_trait]
impl PageSession for Droid {
    async fn open(&self, url: &str) -> Result<(), SearchError> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn enter_query(&self, input_id: &str, text: &str) -> Result<(), SearchError> {
        let input = self
            .driver
            .query(By::Id(input_id))
            .wait(self.element_wait, ELEMENT_POLL_INTERVAL)
            .first()
            .await
            .map_err(|e| SearchError::Navigation(format!("#{} never appeared: {}", input_id, e)))?;

        input.clear().await?;
        input.send_keys(text).await?;
        Ok(())
    }

    async fn submit_form(&self, form_id: &str) -> Result<(), SearchError> {
        let submitted = self
            .driver
            .execute(SUBMIT_FORM_JS, vec![json!(form_id)])
            .await?;

        match submitted.json().as_bool().unwrap_or(false) {
            true => Ok(()),
            false => Err(SearchError::Navigation(format!(
                "form #{} not found",
                form_id
            ))),
        }
    }

    async fn fetch_in_page(&self, url: &str) -> Result<Option<InPageResponse>, SearchError> {
        let ret = self
            .driver
            .execute_async(FETCH_IN_PAGE_JS, vec![json!(url)])
            .await?;

        match ret.json() {
            Value::Null => Ok(None),
            value => Ok(serde_json::from_value(value.clone())
                .map_err(|e| log::warn!("Unexpected in-page fetch result: {}", e))
                .ok()),
        }
    }

    async fn dispatch_events(&self, events: &[&str]) -> Result<(), SearchError> {
        self.driver
            .execute(DISPATCH_EVENTS_JS, vec![json!(events)])
            .await?;
        Ok(())
    }

    async fn result_elements(&self, selector: &str) -> Result<Vec<ResultElement>, SearchError> {
        let mut elements = vec![];
        for element in self.driver.find_all(By::Css(selector)).await? {
            let text = element.text().await?;
            let classes = element
                .class_name()
                .await?
                .map(|c| c.split_whitespace().map(|c| c.to_string()).collect())
                .unwrap_or_default();
            elements.push(ResultElement { text, classes });
        }

        log::info!("Found {} result elements", elements.len());
        Ok(elements)
    }

    async fn result_count(&self, selector: &str) -> Result<usize, SearchError> {
        Ok(self.driver.find_all(By::Css(selector)).await?.len())
    }

    async fn page_source(&self) -> Result<String, SearchError> {
        Ok(self.driver.source().await?)
    }

    async fn scroll_to_bottom(&self) -> Result<(), SearchError> {
        self.driver.execute(SCROLL_JS, vec![]).await?;
        Ok(())
    }

    async fn click_load_more(&self, phrases: &[String]) -> Result<bool, SearchError> {
        let clicked = self
            .driver
            .execute(CLICK_LOAD_MORE_JS, vec![json!(phrases)])
            .await?;
        Ok(clicked.json().as_bool().unwrap_or(false))
    }

    async fn close(&self) -> Result<(), SearchError> {
        self.driver.clone().quit().await?;
        Ok(())
    }
}

pub struct WebDriverLauncher {
    settings: BrowserSettings,
    user_agent: String,
}

impl WebDriverLauncher {
    pub fn new(settings: BrowserSettings, user_agent: String) -> Self {
        WebDriverLauncher {
            settings,
            user_agent,
        }
    }
}

#[async_trait]
impl SessionLauncher for WebDriverLauncher {
    type Session = Droid;

    async fn launch(&self) -> Result<Droid, SearchError> {
        log::info!("Starting browser via {}", self.settings.webdriver_url);
        Droid::new(&self.settings, &self.user_agent).await
    }
}
