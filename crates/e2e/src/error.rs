//! Error types for E2E runs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Test data error: {0}")]
    DataSource(String),

    #[error("Timed out after {waited_ms} ms waiting for {condition}{}", last_error_suffix(.last_error))]
    ReadinessTimeout {
        condition: String,
        waited_ms: u64,
        last_error: Option<String>,
    },

    #[error("Price mismatch: observed '{observed}' matched none of {candidates:?}")]
    PriceMismatch {
        observed: String,
        candidates: Vec<String>,
    },

    #[error("Diagnostic capture failed for '{label}': {reason}")]
    Capture { label: String, reason: String },

    #[error("WebDriver failed to start: {0}")]
    DriverStartup(String),

    #[error("WebDriver health check failed after {0} attempts")]
    DriverHealthCheck(usize),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Errors a readiness probe may swallow and retry until its deadline
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            E2eError::ElementNotFound(_) | E2eError::Browser(_) | E2eError::WebDriver(_)
        )
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

fn last_error_suffix(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(" (last error: {})", e),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_includes_last_error() {
        let err = E2eError::ReadinessTimeout {
            condition: "clickable(id=add-to-cart-button)".to_string(),
            waited_ms: 15000,
            last_error: Some("stale element".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("clickable(id=add-to-cart-button)"));
        assert!(msg.contains("stale element"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(E2eError::ElementNotFound("css=a".into()).is_transient());
        assert!(!E2eError::DataSource("missing".into()).is_transient());
        assert!(!E2eError::PriceMismatch {
            observed: "1".into(),
            candidates: vec![],
        }
        .is_transient());
    }
}
