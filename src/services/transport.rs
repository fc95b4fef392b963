use std::io::Read;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use itertools::Itertools;
use reqwest::{
    header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, ORIGIN, REFERER, SET_COOKIE},
    Client,
};
use url::Url;

use crate::{
    configuration::{EndpointSettings, NamegrepSettings},
    domain::{Pattern, RawResponse, ResponseBody, SearchError, StrategyId},
};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn session_cookie(&self) -> Option<String>;

    async fn fetch(&self, url: Url, cookie: Option<String>) -> Result<RawResponse, SearchError>;
}

pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(settings: &NamegrepSettings) -> Result<Self, SearchError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            SearchError::Transport(format!("invalid base url {}: {}", settings.base_url, e))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent())
            .timeout(settings.request_timeout())
            .connect_timeout(settings.request_timeout())
            .build()?;

        Ok(HttpTransport { client, base_url })
    }

    fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn session_cookie(&self) -> Option<String> {
        log::info!("Getting session cookie from {}", self.base_url);

        let response = match self.client.get(self.base_url.clone()).send().await {
            Ok(res) => res,
            Err(e) => {
                log::warn!("Error getting session cookie: {:?}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            log::warn!("Failed to get session, status: {}", response.status());
            return None;
        }

        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .join("; ");

        match cookie.is_empty() {
            true => None,
            false => Some(cookie),
        }
    }

    async fn fetch(&self, url: Url, cookie: Option<String>) -> Result<RawResponse, SearchError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(REFERER, self.base_url.as_str())
            .header(ORIGIN, self.origin())
            .header("X-Requested-With", "XMLHttpRequest");

        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Transport(format!(
                "{} returned status {}",
                url.path(),
                status
            )));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));
        let bytes = response.bytes().await?;
        let text = decode_body(&bytes)?;

        log::info!(
            "Response from {}: status {}, {} bytes",
            url.path(),
            status,
            text.len()
        );

        let body = match is_json {
            true => ResponseBody::Json(text),
            false => ResponseBody::Markup(text),
        };
        Ok(RawResponse::new(
            StrategyId::DirectHttp,
            Some(status.as_u16()),
            body,
        ))
    }
}

/// Inflates bodies that are still gzip-compressed. reqwest already undoes
/// `Content-Encoding: gzip`, this catches servers that compress without
/// saying so.
pub fn decode_body(bytes: &[u8]) -> Result<String, SearchError> {
    match bytes.starts_with(&GZIP_MAGIC) {
        true => {
            let mut text = String::new();
            GzDecoder::new(bytes)
                .read_to_string(&mut text)
                .map_err(|e| SearchError::Transport(format!("could not inflate body: {}", e)))?;
            Ok(text)
        }
        false => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

pub fn endpoint_url(base: &Url, endpoint: &EndpointSettings, pattern: &Pattern) -> Option<Url> {
    match base.join(&endpoint.path) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair(&endpoint.param, pattern.as_str());
            Some(url)
        }
        Err(e) => {
            log::error!("Skipping endpoint {}: {}", endpoint.path, e);
            None
        }
    }
}
