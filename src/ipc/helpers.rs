use crate::config::DeriveConfig;
use crate::ipc::types::AppState;
use crate::model::{ClassInfo, Id};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// `params.now` as an RFC 3339 instant, or the wall clock when absent.
/// This is the only place the clock is read.
pub fn parse_now(params: &Value) -> Result<DateTime<Utc>, String> {
    match params.get("now") {
        None => Ok(Utc::now()),
        Some(v) if v.is_null() => Ok(Utc::now()),
        Some(v) => {
            let s = v.as_str().ok_or("now must be an RFC 3339 string")?;
            DateTime::parse_from_rfc3339(s.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| format!("now is not a valid RFC 3339 instant: {e}"))
        }
    }
}

/// Deserializes `params[key]`; missing and null both give `None`.
pub fn optional_field<T: DeserializeOwned>(params: &Value, key: &str) -> Result<Option<T>, String> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| format!("invalid {}: {}", key, e)),
    }
}

pub fn required_field<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, String> {
    optional_field(params, key)?.ok_or_else(|| format!("missing params.{}", key))
}

/// Session config with any per-request `params.options` applied on top.
pub fn request_config(state: &AppState, params: &Value) -> Result<DeriveConfig, String> {
    match params.get("options") {
        None => Ok(state.config),
        Some(v) if v.is_null() => Ok(state.config),
        Some(v) => {
            let patch = v.as_object().ok_or("options must be an object")?;
            state.config.patched(patch)
        }
    }
}

pub fn class_names(classes: &[ClassInfo]) -> HashMap<Id, String> {
    classes
        .iter()
        .map(|c| (c.class_id, c.class_name.clone()))
        .collect()
}
