use std::time::Duration;

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub namegrep: NamegrepSettings,
    pub browser: BrowserSettings,
    pub sanitize: SanitizeSettings,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_concurrent_searches: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub search_timeout_secs: u64,
    pub static_dir: Option<String>,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 3001,
            max_concurrent_searches: 4,
            search_timeout_secs: 120,
            static_dir: Some("./public".to_string()),
        }
    }
}

impl ApplicationSettings {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Http,
    Browser,
    #[default]
    Auto,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EndpointSettings {
    pub path: String,
    pub param: String,
}

impl EndpointSettings {
    pub fn new(path: &str, param: &str) -> Self {
        EndpointSettings {
            path: path.to_string(),
            param: param.to_string(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct NamegrepSettings {
    pub base_url: String,
    pub mode: SearchMode,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub bootstrap_session: bool,
    pub endpoints: Vec<EndpointSettings>,
    pub limit_markers: Vec<String>,
}

impl Default for NamegrepSettings {
    fn default() -> Self {
        NamegrepSettings {
            base_url: "https://namegrep.com".to_string(),
            mode: SearchMode::Auto,
            request_timeout_secs: 30,
            user_agent: String::new(),
            bootstrap_session: true,
            endpoints: vec![
                EndpointSettings::new("/ajax", "query"),
                EndpointSettings::new("/api/search", "query"),
                EndpointSettings::new("/search", "query"),
                EndpointSettings::new("/api/domains", "pattern"),
            ],
            limit_markers: vec![
                "too many".to_string(),
                "too large".to_string(),
                "narrow your".to_string(),
            ],
        }
    }
}

impl NamegrepSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn user_agent(&self) -> String {
        match self.user_agent.trim().is_empty() {
            true => fake_user_agent::get_chrome_rua().to_string(),
            false => self.user_agent.clone(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct BrowserSettings {
    pub enabled: bool,
    pub webdriver_url: String,
    pub headless: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_load_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub element_wait_secs: u64,
    pub query_input_id: String,
    pub form_id: String,
    pub result_selector: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub typing_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub settle_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub nudge_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub scroll_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_scroll_attempts: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub stable_rounds: u32,
    pub load_more_phrases: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        BrowserSettings {
            enabled: true,
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            page_load_timeout_secs: 30,
            element_wait_secs: 10,
            query_input_id: "query".to_string(),
            form_id: "search".to_string(),
            result_selector: ".domain".to_string(),
            typing_delay_ms: 1_000,
            settle_delay_ms: 8_000,
            nudge_delay_ms: 3_000,
            scroll_delay_ms: 2_000,
            max_scroll_attempts: 15,
            stable_rounds: 3,
            load_more_phrases: vec![
                "load more".to_string(),
                "show more".to_string(),
                "more results".to_string(),
            ],
        }
    }
}

impl BrowserSettings {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn nudge_delay(&self) -> Duration {
        Duration::from_millis(self.nudge_delay_ms)
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SanitizeSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub min_length: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_length: usize,
    pub deny_list: Vec<String>,
}

impl Default for SanitizeSettings {
    fn default() -> Self {
        SanitizeSettings {
            min_length: 5,
            max_length: 50,
            deny_list: [
                "namegrep.com",
                "jquery.com",
                "github.com",
                "google.com",
                "mozilla.com",
                "facebook.com",
                "twitter.com",
                "youtube.com",
                "amazon.com",
                "microsoft.com",
                "localhost",
                "example.com",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        }
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename))
                .required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::{Environment, SanitizeSettings, SearchMode, Settings};

    #[test]
    fn environment_from_string_valid() {
        let env: Result<Environment, String> = "Production".to_string().try_into();
        assert!(matches!(env, Ok(Environment::Production)));
    }

    #[test]
    fn environment_from_string_invalid() {
        let env: Result<Environment, String> = "staging".to_string().try_into();
        assert!(env.is_err());
    }

    #[test]
    fn settings_partial_yaml_keeps_defaults() {
        let yaml = r#"
application:
  port: "8080"
namegrep:
  mode: http
sanitize:
  max_length: 30
"#;
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.application.port, 8080);
        assert_eq!(settings.application.host, "127.0.0.1");
        assert_eq!(settings.namegrep.mode, SearchMode::Http);
        assert_eq!(settings.namegrep.endpoints.len(), 4);
        assert_eq!(settings.sanitize.max_length, 30);
        assert_eq!(settings.sanitize.min_length, 5);
        assert_eq!(settings.browser.stable_rounds, 3);
    }

    #[test]
    fn deny_list_default_contains_site_domain() {
        let sanitize = SanitizeSettings::default();
        assert!(sanitize.deny_list.iter().any(|d| d == "namegrep.com"));
    }
}
