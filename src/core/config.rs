use std::fmt;

use crate::core::errors::{AppError, AppResult};

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_RELAY_BASE_URL: &str = "https://gateway.helicone.ai";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_UPLOAD_MB: usize = 25;
const DEFAULT_MAX_DOCUMENT_CHARS: usize = 200_000;

/// Process-wide settings, read once at startup and passed down explicitly.
#[derive(Clone)]
pub struct AppConfig {
    pub google_api_key: String,
    pub helicone_api_key: Option<String>,
    pub model: String,
    pub bind_addr: String,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub max_document_chars: usize,
    pub gemini_base_url: String,
    pub relay_base_url: String,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("google_api_key", &"<redacted>")
            .field(
                "helicone_api_key",
                &self.helicone_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("model", &self.model)
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("max_document_chars", &self.max_document_chars)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("relay_base_url", &self.relay_base_url)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let google_api_key = non_blank("GOOGLE_API_KEY").ok_or_else(|| {
            AppError::Config("GOOGLE_API_KEY must be set to a non-empty value".to_string())
        })?;

        let request_timeout_secs = parse_number(
            "CHRONOLOGY_TIMEOUT_SECS",
            non_blank("CHRONOLOGY_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;
        if request_timeout_secs == 0 {
            return Err(AppError::Config(
                "CHRONOLOGY_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        let max_upload_mb: usize = parse_number(
            "CHRONOLOGY_MAX_UPLOAD_MB",
            non_blank("CHRONOLOGY_MAX_UPLOAD_MB"),
            DEFAULT_MAX_UPLOAD_MB,
        )?;
        let max_document_chars = parse_number(
            "CHRONOLOGY_MAX_DOCUMENT_CHARS",
            non_blank("CHRONOLOGY_MAX_DOCUMENT_CHARS"),
            DEFAULT_MAX_DOCUMENT_CHARS,
        )?;
        if max_document_chars == 0 {
            return Err(AppError::Config(
                "CHRONOLOGY_MAX_DOCUMENT_CHARS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            google_api_key,
            helicone_api_key: non_blank("HELICONE_API_KEY"),
            model: non_blank("CHRONOLOGY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            bind_addr: non_blank("CHRONOLOGY_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            request_timeout_secs,
            max_upload_bytes: max_upload_mb.max(1) * 1024 * 1024,
            max_document_chars,
            gemini_base_url: non_blank("CHRONOLOGY_GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            relay_base_url: non_blank("CHRONOLOGY_RELAY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_RELAY_BASE_URL.to_string()),
        })
    }
}

fn parse_number<T>(key: &str, raw: Option<String>, default: T) -> AppResult<T>
where
    T: std::str::FromStr,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} must be a number, got {value:?}"))),
    }
}
