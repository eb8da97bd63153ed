use crate::config::DeriveConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Session state for one sidecar process. Nothing outlives the process.
pub struct AppState {
    pub config: DeriveConfig,
}

impl AppState {
    pub fn new(config: DeriveConfig) -> Self {
        Self { config }
    }
}
