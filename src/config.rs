// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use url::Url;

use crate::error::StoreError;

/// Largest page the search backends accept.
pub const MAX_PAGE_SIZE: usize = 250;

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Which search backend the query engine talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Query the in-process document store.
    Embedded,
    /// Query a search store over the network.
    Remote,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_mode: BackendMode,
    pub search_host: Option<String>,
    pub search_port: u16,
    pub search_protocol: String,
    pub search_api_key: Option<String>,
    pub admin_api_key: Option<String>,
    pub timeout_secs: u64,
    pub today_page_cap: usize,
    pub question_lang: String,
    pub seed_file: Option<String>,
    pub bind_addr: String,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_mode: BackendMode::Embedded,
            search_host: None,
            search_port: 443,
            search_protocol: "https".to_string(),
            search_api_key: None,
            admin_api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            today_page_cap: MAX_PAGE_SIZE,
            question_lang: "en".to_string(),
            seed_file: None,
            bind_addr: "0.0.0.0:3000".to_string(),
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Config::default();

        let backend_mode = match env::var("SEARCH_BACKEND").as_deref() {
            Ok("remote") => BackendMode::Remote,
            Ok("embedded") | Err(_) => BackendMode::Embedded,
            Ok(other) => {
                tracing::warn!("Unknown SEARCH_BACKEND '{}', using embedded", other);
                BackendMode::Embedded
            }
        };

        Self {
            backend_mode,
            search_host: non_empty_var("SEARCH_HOST"),
            search_port: parsed_var("SEARCH_PORT", defaults.search_port),
            search_protocol: non_empty_var("SEARCH_PROTOCOL").unwrap_or(defaults.search_protocol),
            search_api_key: non_empty_var("SEARCH_API_KEY"),
            admin_api_key: non_empty_var("SEARCH_ADMIN_API_KEY"),
            timeout_secs: parsed_var("SEARCH_TIMEOUT_SECS", defaults.timeout_secs),
            today_page_cap: parsed_var("TODAY_PAGE_CAP", defaults.today_page_cap)
                .clamp(1, MAX_PAGE_SIZE),
            question_lang: non_empty_var("QUESTION_LANG").unwrap_or(defaults.question_lang),
            seed_file: non_empty_var("SEED_FILE"),
            bind_addr: non_empty_var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            rust_log: env::var("RUST_LOG").unwrap_or(defaults.rust_log),
        }
    }

    /// Presence check performed before any call is attempted.
    ///
    /// The embedded store is always reachable; a remote store needs both a host
    /// and a credential.
    pub fn is_search_available(&self) -> bool {
        match self.backend_mode {
            BackendMode::Embedded => true,
            BackendMode::Remote => self.search_host.is_some() && self.search_api_key.is_some(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Base URL of the remote search store.
    pub fn remote_endpoint(&self) -> Result<Url, StoreError> {
        let host = self
            .search_host
            .as_deref()
            .ok_or_else(|| StoreError::Configuration("SEARCH_HOST is not set".to_string()))?;

        if self.search_api_key.is_none() {
            return Err(StoreError::Configuration(
                "SEARCH_API_KEY is not set".to_string(),
            ));
        }

        let protocol = match self.search_protocol.as_str() {
            "http" | "https" => self.search_protocol.as_str(),
            other => {
                return Err(StoreError::Configuration(format!(
                    "unsupported SEARCH_PROTOCOL '{}'",
                    other
                )));
            }
        };

        Url::parse(&format!("{}://{}:{}/", protocol, host, self.search_port))
            .map_err(|e| StoreError::Configuration(format!("invalid search endpoint: {}", e)))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match non_empty_var(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value '{}', using default", key, raw);
            default
        }),
        None => default,
    }
}
