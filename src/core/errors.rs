use serde::ser::SerializeStruct;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("upload too large: {0}")]
    PayloadTooLarge(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("{0}")]
    NoEvents(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("provider auth failed")]
    ProviderAuth,
    #[error("provider rate limited, please retry shortly")]
    ProviderRateLimited,
    #[error("provider timeout, please retry")]
    ProviderTimeout,
    #[error("provider unavailable ({0}), please retry")]
    ProviderUnavailable(String),
    #[error("provider invalid response: {0}")]
    ProviderInvalidResponse(String),
    #[error("network error: {0}, please retry")]
    Network(String),
    #[error("model output could not be parsed: {message}")]
    Parse { message: String, raw: String },
    #[error("internal error: {0}")]
    Internal(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let fields = if self.raw_output().is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("AppError", fields)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.serialize_field("retryable", &self.retryable())?;
        if let Some(raw) = self.raw_output() {
            state.serialize_field("rawOutput", raw)?;
        }
        state.end()
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Extraction(_) => "EXTRACTION_ERROR",
            Self::NoEvents(_) => "NO_EVENTS",
            Self::Io(_) => "IO_ERROR",
            Self::ProviderAuth => "PROVIDER_AUTH",
            Self::ProviderRateLimited => "PROVIDER_RATE_LIMITED",
            Self::ProviderTimeout => "PROVIDER_TIMEOUT",
            Self::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            Self::ProviderInvalidResponse(_) => "PROVIDER_INVALID_RESPONSE",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderRateLimited
                | Self::ProviderTimeout
                | Self::ProviderUnavailable(_)
                | Self::Network(_)
        )
    }

    /// Raw model text attached to a parse failure, kept for manual review.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Self::Parse { raw, .. } => Some(raw.as_str()),
            _ => None,
        }
    }

    pub fn parse(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            raw: raw.into(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn transient_provider_failures_are_retryable() {
        assert!(AppError::ProviderTimeout.retryable());
        assert!(AppError::ProviderRateLimited.retryable());
        assert!(AppError::Network("reset".to_string()).retryable());
        assert!(AppError::ProviderUnavailable("status 503".to_string()).retryable());
        assert!(!AppError::ProviderAuth.retryable());
        assert!(!AppError::parse("bad", "raw").retryable());
        assert!(!AppError::Config("missing key".to_string()).retryable());
    }

    #[test]
    fn parse_error_serializes_raw_output() {
        let err = AppError::parse("not json", "Sure! Here are the events");
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["code"], "PARSE_ERROR");
        assert_eq!(value["retryable"], false);
        assert_eq!(value["rawOutput"], "Sure! Here are the events");
    }

    #[test]
    fn non_parse_errors_omit_raw_output() {
        let value = serde_json::to_value(AppError::ProviderTimeout).expect("serialize");
        assert_eq!(value["code"], "PROVIDER_TIMEOUT");
        assert!(value.get("rawOutput").is_none());
    }
}
