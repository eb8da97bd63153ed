use crate::config::OverdueLabel;
use crate::error::ValidationError;
use crate::model::{Assignment, Id, Priority, Status, Submission};
use crate::priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeStatus {
    NoDueDate,
    DueTodayPastDue,
    DueYesterday,
    PastDue { days: i64 },
    DueWithinHour,
    DueInOneHour,
    DueToday { hours: i64 },
    DueTomorrow,
    DueInDays { days: i64 },
}

impl TimeStatus {
    pub fn label(&self) -> String {
        match self {
            TimeStatus::NoDueDate => "No due date".to_string(),
            TimeStatus::DueTodayPastDue => "Due today (past due)".to_string(),
            TimeStatus::DueYesterday => "Due yesterday".to_string(),
            TimeStatus::PastDue { days } => format!("Past due ({} days ago)", days),
            TimeStatus::DueWithinHour => "Due within an hour".to_string(),
            TimeStatus::DueInOneHour => "Due in 1 hour".to_string(),
            TimeStatus::DueToday { hours } => format!("Due today ({} hours left)", hours),
            TimeStatus::DueTomorrow => "Due tomorrow".to_string(),
            TimeStatus::DueInDays { days } => format!("Due in {} days", days),
        }
    }
}

/// Coarse "how long until / since due" bucket shown next to each assignment.
pub fn time_status(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> TimeStatus {
    let Some(due) = due else {
        return TimeStatus::NoDueDate;
    };
    let diff = (due - now).num_milliseconds();
    if diff <= 0 {
        let ago = -diff;
        if ago < DAY_MS {
            TimeStatus::DueTodayPastDue
        } else if ago < 2 * DAY_MS {
            TimeStatus::DueYesterday
        } else {
            // Partial days count as a whole day.
            TimeStatus::PastDue {
                days: (ago + DAY_MS - 1) / DAY_MS,
            }
        }
    } else if diff < HOUR_MS {
        TimeStatus::DueWithinHour
    } else if diff < 2 * HOUR_MS {
        TimeStatus::DueInOneHour
    } else if diff < DAY_MS {
        TimeStatus::DueToday {
            hours: diff / HOUR_MS,
        }
    } else if diff < 2 * DAY_MS {
        TimeStatus::DueTomorrow
    } else {
        TimeStatus::DueInDays {
            days: diff / DAY_MS,
        }
    }
}

/// Read-only projection of one assignment for one student at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedAssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,
    pub status: Status,
    pub priority: Priority,
    pub time_status: TimeStatus,
    pub time_label: String,
}

pub fn derive_view(
    assignment: &Assignment,
    submission: Option<&Submission>,
    class_name: Option<&str>,
    now: DateTime<Utc>,
    overdue: OverdueLabel,
) -> DerivedAssignmentView {
    let (status, priority) = priority::derive(assignment, submission, now, overdue);
    let time_status = time_status(assignment.due_date, now);
    DerivedAssignmentView {
        assignment: assignment.clone(),
        class_name: class_name.map(str::to_string),
        submission: submission.cloned(),
        status,
        priority,
        time_status,
        time_label: time_status.label(),
    }
}

pub fn derive_views(
    assignments: &[Assignment],
    submissions: &HashMap<Id, Submission>,
    class_names: &HashMap<Id, String>,
    now: DateTime<Utc>,
    overdue: OverdueLabel,
) -> Vec<DerivedAssignmentView> {
    assignments
        .iter()
        .map(|a| {
            derive_view(
                a,
                submissions.get(&a.id),
                class_names.get(&a.class_id).map(String::as_str),
                now,
                overdue,
            )
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    #[default]
    All,
    Upcoming,
    Past,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewFilters {
    pub window: TimeWindow,
    pub class_id: Option<Id>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    /// Lowercased, trimmed search text; `None` when blank.
    pub search: Option<String>,
    pub published_only: bool,
}

fn is_all(v: &serde_json::Value) -> bool {
    v.is_null()
        || v.as_str()
            .map(|s| s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all"))
            .unwrap_or(false)
}

pub fn parse_view_filters(raw: Option<&serde_json::Value>) -> Result<ViewFilters, ValidationError> {
    let Some(raw) = raw else {
        return Ok(ViewFilters::default());
    };
    if raw.is_null() {
        return Ok(ViewFilters::default());
    }
    let Some(obj) = raw.as_object() else {
        return Err(ValidationError::new("bad_params", "filters must be an object"));
    };

    let window = match obj.get("window") {
        None => TimeWindow::All,
        Some(v) if is_all(v) => TimeWindow::All,
        Some(v) => match v.as_str().map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("upcoming") => TimeWindow::Upcoming,
            Some("past") => TimeWindow::Past,
            _ => {
                return Err(ValidationError::new(
                    "bad_params",
                    "filters.window must be one of: all, upcoming, past",
                ))
            }
        },
    };

    let class_id = match obj.get("classId") {
        None => None,
        Some(v) if is_all(v) => None,
        Some(v) => {
            let Some(n) = v.as_i64() else {
                return Err(ValidationError::new(
                    "bad_params",
                    "filters.classId must be integer or 'all'",
                ));
            };
            Some(n)
        }
    };

    let status = match obj.get("status") {
        None => None,
        Some(v) if is_all(v) => None,
        Some(v) => {
            let Some(s) = v
                .as_str()
                .and_then(|s| Status::parse(&s.trim().to_ascii_lowercase()))
            else {
                return Err(ValidationError::new(
                    "bad_params",
                    "filters.status must be a known status or 'all'",
                ));
            };
            Some(s)
        }
    };

    let priority = match obj.get("priority") {
        None => None,
        Some(v) if is_all(v) => None,
        Some(v) => {
            let Some(p) = v
                .as_str()
                .and_then(|s| Priority::parse(&s.trim().to_ascii_lowercase()))
            else {
                return Err(ValidationError::new(
                    "bad_params",
                    "filters.priority must be one of: high, medium, low, all",
                ));
            };
            Some(p)
        }
    };

    let search = match obj.get("search") {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => {
            let Some(s) = v.as_str() else {
                return Err(ValidationError::new(
                    "bad_params",
                    "filters.search must be string or null",
                ));
            };
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_lowercase())
            }
        }
    };

    let published_only = match obj.get("publishedOnly") {
        None => false,
        Some(v) if v.is_null() => false,
        Some(v) => {
            let Some(b) = v.as_bool() else {
                return Err(ValidationError::new(
                    "bad_params",
                    "filters.publishedOnly must be boolean",
                ));
            };
            b
        }
    };

    Ok(ViewFilters {
        window,
        class_id,
        status,
        priority,
        search,
        published_only,
    })
}

impl ViewFilters {
    pub fn matches(&self, v: &DerivedAssignmentView, now: DateTime<Utc>) -> bool {
        let a = &v.assignment;
        let window_ok = match self.window {
            TimeWindow::All => true,
            TimeWindow::Upcoming => a.due_date.map(|d| d > now).unwrap_or(false),
            TimeWindow::Past => a.due_date.map(|d| d < now).unwrap_or(false),
        };
        let class_ok = self.class_id.map(|c| a.class_id == c).unwrap_or(true);
        let status_ok = self.status.map(|s| v.status == s).unwrap_or(true);
        let priority_ok = self.priority.map(|p| v.priority == p).unwrap_or(true);
        let published_ok = !self.published_only || a.is_published;
        let search_ok = self
            .search
            .as_ref()
            .map(|needle| {
                a.title.to_lowercase().contains(needle)
                    || a.description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(needle))
                        .unwrap_or(false)
                    || v.class_name
                        .as_deref()
                        .map(|c| c.to_lowercase().contains(needle))
                        .unwrap_or(false)
            })
            .unwrap_or(true);
        window_ok && class_ok && status_ok && priority_ok && published_ok && search_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    DueDate,
    Title,
    Class,
    Points,
    Status,
    Priority,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "dueDate" => Some(Self::DueDate),
            "title" => Some(Self::Title),
            "class" => Some(Self::Class),
            "points" => Some(Self::Points),
            "status" => Some(Self::Status),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare(a: &DerivedAssignmentView, b: &DerivedAssignmentView, field: SortField) -> Ordering {
    match field {
        // Undated work sorts after dated work.
        SortField::DueDate => match (a.assignment.due_date, b.assignment.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (None, None) => Ordering::Equal,
        },
        SortField::Title => cmp_text(&a.assignment.title, &b.assignment.title),
        SortField::Class => cmp_text(
            a.class_name.as_deref().unwrap_or(""),
            b.class_name.as_deref().unwrap_or(""),
        ),
        SortField::Points => a
            .assignment
            .points_possible
            .partial_cmp(&b.assignment.points_possible)
            .unwrap_or(Ordering::Equal),
        SortField::Status => a.status.sort_rank().cmp(&b.status.sort_rank()),
        SortField::Priority => a.priority.sort_rank().cmp(&b.priority.sort_rank()),
    }
}

/// Stable sort; descending reverses the whole comparison, so undated work
/// comes first when sorting by due date descending.
pub fn sort_views(views: &mut [DerivedAssignmentView], sort: SortSpec) {
    views.sort_by(|a, b| {
        let ord = compare(a, b, sort.field);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

pub fn filter_and_sort(
    views: Vec<DerivedAssignmentView>,
    filters: &ViewFilters,
    sort: SortSpec,
    now: DateTime<Utc>,
) -> Vec<DerivedAssignmentView> {
    let mut out: Vec<DerivedAssignmentView> =
        views.into_iter().filter(|v| filters.matches(v, now)).collect();
    sort_views(&mut out, sort);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGroup {
    pub class_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub assignments: Vec<DerivedAssignmentView>,
}

/// Groups in order of each class's first appearance, keeping the order of
/// views inside a group.
pub fn group_by_class(views: &[DerivedAssignmentView]) -> Vec<ClassGroup> {
    let mut groups: Vec<ClassGroup> = Vec::new();
    let mut index: HashMap<Id, usize> = HashMap::new();
    for v in views {
        let class_id = v.assignment.class_id;
        let idx = *index.entry(class_id).or_insert_with(|| {
            groups.push(ClassGroup {
                class_id,
                class_name: v.class_name.clone(),
                assignments: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].assignments.push(v.clone());
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewCounts {
    pub total: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub by_priority: BTreeMap<&'static str, usize>,
}

pub fn count_views(views: &[DerivedAssignmentView]) -> ViewCounts {
    let mut by_status: BTreeMap<&'static str, usize> =
        Status::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    let mut by_priority: BTreeMap<&'static str, usize> =
        Priority::ALL.iter().map(|p| (p.as_str(), 0)).collect();
    for v in views {
        *by_status.entry(v.status.as_str()).or_insert(0) += 1;
        *by_priority.entry(v.priority.as_str()).or_insert(0) += 1;
    }
    ViewCounts {
        total: views.len(),
        by_status,
        by_priority,
    }
}
