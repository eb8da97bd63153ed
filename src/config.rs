use crate::model::Status;
use crate::views::{SortDirection, SortField, SortSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ENV_OVERDUE_STATUS: &str = "CLASSCONNECT_OVERDUE_STATUS";
pub const ENV_COUNT_MISSING_AS_ZERO: &str = "CLASSCONNECT_COUNT_MISSING_AS_ZERO";

/// Label given to unsubmitted work once its due date has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverdueLabel {
    #[default]
    Late,
    Missing,
}

impl OverdueLabel {
    pub fn status(self) -> Status {
        match self {
            OverdueLabel::Late => Status::Late,
            OverdueLabel::Missing => Status::Missing,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "late" => Some(Self::Late),
            "missing" => Some(Self::Missing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeriveConfig {
    pub overdue_status: OverdueLabel,
    /// Count overdue unsubmitted work as zero in grade totals instead of
    /// leaving it out of the denominator.
    pub count_missing_as_zero: bool,
    pub default_sort: SortSpec,
}

impl DeriveConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Invalid values keep the default and are reported with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_OVERDUE_STATUS) {
            match OverdueLabel::parse(&raw) {
                Some(v) => cfg.overdue_status = v,
                None => tracing::warn!(
                    key = ENV_OVERDUE_STATUS,
                    value = %raw,
                    "ignoring invalid overdue status, expected late or missing"
                ),
            }
        }
        if let Some(raw) = lookup(ENV_COUNT_MISSING_AS_ZERO) {
            match parse_flag(&raw) {
                Some(v) => cfg.count_missing_as_zero = v,
                None => tracing::warn!(
                    key = ENV_COUNT_MISSING_AS_ZERO,
                    value = %raw,
                    "ignoring invalid flag, expected true or false"
                ),
            }
        }
        cfg
    }

    /// Applies a camelCase patch object. Unknown keys and bad values are
    /// rejected and leave `self` untouched.
    pub fn patched(&self, patch: &Map<String, Value>) -> Result<Self, String> {
        let mut next = *self;
        for (k, v) in patch {
            match k.as_str() {
                "overdueStatus" => {
                    let s = v
                        .as_str()
                        .ok_or_else(|| format!("{} must be string", k))?;
                    next.overdue_status = OverdueLabel::parse(s)
                        .ok_or_else(|| format!("{} must be one of: late, missing", k))?;
                }
                "countMissingAsZero" => {
                    next.count_missing_as_zero =
                        v.as_bool().ok_or_else(|| format!("{} must be boolean", k))?;
                }
                "defaultSort" => {
                    next.default_sort = parse_sort(v, &next.default_sort)?;
                }
                _ => return Err(format!("unknown setup field: {}", k)),
            }
        }
        Ok(next)
    }
}

/// Parses `{field?, direction?}`; missing keys keep the values in `base`.
pub fn parse_sort(v: &Value, base: &SortSpec) -> Result<SortSpec, String> {
    let Some(obj) = v.as_object() else {
        return Err("sort must be an object".into());
    };
    let mut out = *base;
    if let Some(f) = obj.get("field").filter(|f| !f.is_null()) {
        let s = f.as_str().ok_or("sort.field must be string")?;
        out.field = SortField::parse(s).ok_or_else(|| {
            "sort.field must be one of: dueDate, title, class, points, status, priority"
                .to_string()
        })?;
    }
    if let Some(d) = obj.get("direction").filter(|d| !d.is_null()) {
        let s = d.as_str().ok_or("sort.direction must be string")?;
        out.direction = SortDirection::parse(s)
            .ok_or_else(|| "sort.direction must be asc or desc".to_string())?;
    }
    Ok(out)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
