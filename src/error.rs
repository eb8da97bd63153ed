use serde::Serialize;
use std::fmt;

/// Input the derivation core refuses to aggregate. Same shape as a wire error
/// so handlers can pass it through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ValidationError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds one key to `details`, turning it into an object if needed.
    pub fn with_context(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let mut obj = match self.details.take() {
            Some(serde_json::Value::Object(m)) => m,
            Some(other) => {
                let mut m = serde_json::Map::new();
                m.insert("details".to_string(), other);
                m
            }
            None => serde_json::Map::new(),
        };
        obj.insert(key.to_string(), value.into());
        self.details = Some(serde_json::Value::Object(obj));
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}
