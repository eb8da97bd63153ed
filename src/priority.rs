use crate::config::OverdueLabel;
use crate::model::{Assignment, Priority, Status, Submission};
use crate::status;
use chrono::{DateTime, Utc};

pub const HIGH_PRIORITY_HOURS: f64 = 48.0;
pub const MEDIUM_PRIORITY_HOURS: f64 = 168.0;

/// Fractional hours from `now` until the due date; negative once overdue.
pub fn hours_until_due(due: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (due - now).num_milliseconds() as f64 / 3_600_000.0
}

pub fn classify(assignment: &Assignment, status: Status, now: DateTime<Utc>) -> Priority {
    if status.is_done() {
        return Priority::Low;
    }
    let Some(due) = assignment.due_date else {
        return Priority::Low;
    };
    let hours = hours_until_due(due, now);
    if hours <= HIGH_PRIORITY_HOURS {
        Priority::High
    } else if hours <= MEDIUM_PRIORITY_HOURS {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Status and priority for one (assignment, submission) pair at `now`.
///
/// Work that was handed in late resolves to `late` but has nothing left to
/// chase, so it is `low` like any other handed-in work.
pub fn derive(
    assignment: &Assignment,
    submission: Option<&Submission>,
    now: DateTime<Utc>,
    overdue: OverdueLabel,
) -> (Status, Priority) {
    let status = status::resolve(assignment, submission, now, overdue);
    let priority = if status::is_handed_in(submission) {
        Priority::Low
    } else {
        classify(assignment, status, now)
    };
    (status, priority)
}
