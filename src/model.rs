use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

pub type Id = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(alias = "assignmentId")]
    pub id: Id,
    pub class_id: Id,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "optional_instant")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points_possible: f64,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    NotSubmitted,
    Submitted,
    Late,
    Graded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub assignment_id: Id,
    #[serde(default)]
    pub student_id: Option<Id>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "fileURL")]
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "optional_instant")]
    pub submission_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_late: bool,
    #[serde(default)]
    pub status: Option<SubmissionStatus>,
    #[serde(default)]
    pub grade: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Lifecycle label for one assignment from one student's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Assigned,
    Submitted,
    Late,
    Graded,
    NotSubmitted,
    Missing,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Late,
        Status::Missing,
        Status::NotSubmitted,
        Status::Assigned,
        Status::Submitted,
        Status::Graded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Assigned => "assigned",
            Status::Submitted => "submitted",
            Status::Late => "late",
            Status::Graded => "graded",
            Status::NotSubmitted => "not_submitted",
            Status::Missing => "missing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    /// Rank used by status sorting; overdue work first, finished work last.
    pub fn sort_rank(self) -> u8 {
        match self {
            Status::Late => 0,
            Status::Missing => 1,
            Status::NotSubmitted => 2,
            Status::Assigned => 3,
            Status::Submitted => 4,
            Status::Graded => 5,
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, Status::Submitted | Status::Graded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    pub fn sort_rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    #[serde(alias = "id")]
    pub class_id: Id,
    #[serde(default)]
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Indexes submissions by assignment id. At most one submission per
/// assignment is expected; on duplicates the later record wins.
pub fn submissions_by_assignment<I>(submissions: I) -> HashMap<Id, Submission>
where
    I: IntoIterator<Item = Submission>,
{
    let mut out: HashMap<Id, Submission> = HashMap::new();
    for s in submissions {
        let assignment_id = s.assignment_id;
        if out.insert(assignment_id, s).is_some() {
            tracing::warn!(assignment_id, "duplicate submission for assignment, keeping the last one");
        }
    }
    out
}

/// Instants arrive as RFC 3339 strings. Null, empty strings and the backend's
/// zero time (year 1) all mean "not set".
fn optional_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let t = raw.trim();
    if t.is_empty() {
        return Ok(None);
    }
    let parsed = DateTime::parse_from_rfc3339(t)
        .map_err(|e| serde::de::Error::custom(format!("invalid instant {t:?}: {e}")))?
        .with_timezone(&Utc);
    if parsed.year() <= 1 {
        return Ok(None);
    }
    Ok(Some(parsed))
}
