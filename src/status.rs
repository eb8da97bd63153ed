use crate::config::OverdueLabel;
use crate::model::{Assignment, Status, Submission, SubmissionStatus};
use chrono::{DateTime, Utc};

/// Lifecycle status of `assignment` for the student who owns `submission`.
///
/// First match wins:
/// 1. a graded submission is `graded`;
/// 2. a submitted one is `late` or `submitted` depending on its late flag;
/// 3. a submission recorded as late is `late`;
/// 4. otherwise (no submission, no status, `not_submitted`) the assignment is
///    overdue once its due date is behind `now`, and `assigned` before that or
///    when it has no due date at all.
pub fn resolve(
    assignment: &Assignment,
    submission: Option<&Submission>,
    now: DateTime<Utc>,
    overdue: OverdueLabel,
) -> Status {
    match submission.and_then(|s| s.status.map(|st| (st, s.is_late))) {
        Some((SubmissionStatus::Graded, _)) => Status::Graded,
        Some((SubmissionStatus::Submitted, true)) => Status::Late,
        Some((SubmissionStatus::Submitted, false)) => Status::Submitted,
        Some((SubmissionStatus::Late, _)) => Status::Late,
        Some((SubmissionStatus::NotSubmitted, _)) | None => match assignment.due_date {
            Some(due) if due < now => overdue.status(),
            _ => Status::Assigned,
        },
    }
}

/// Work counts as handed in once the submission carries any status other
/// than `not_submitted`, late or not.
pub fn is_handed_in(submission: Option<&Submission>) -> bool {
    submission
        .and_then(|s| s.status)
        .map(|st| st != SubmissionStatus::NotSubmitted)
        .unwrap_or(false)
}

/// Past due and nothing handed in.
pub fn is_overdue_unsubmitted(
    assignment: &Assignment,
    submission: Option<&Submission>,
    now: DateTime<Utc>,
) -> bool {
    !is_handed_in(submission) && assignment.due_date.map(|due| due < now).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn assignment(due: Option<DateTime<Utc>>) -> Assignment {
        Assignment {
            id: 1,
            class_id: 10,
            title: "Lab report".into(),
            description: None,
            due_date: due,
            points_possible: 100.0,
            is_published: true,
        }
    }

    fn submission(status: Option<SubmissionStatus>, is_late: bool) -> Submission {
        Submission {
            assignment_id: 1,
            student_id: Some(5),
            content: None,
            file_url: None,
            submission_date: None,
            is_late,
            status,
            grade: None,
            feedback: None,
        }
    }

    #[test]
    fn no_due_date_and_no_submission_stays_assigned() {
        let a = assignment(None);
        for offset in [-10_000, 0, 10_000] {
            let t = now() + Duration::hours(offset);
            assert_eq!(resolve(&a, None, t, OverdueLabel::Late), Status::Assigned);
        }
    }

    #[test]
    fn graded_wins_over_lateness_and_due_date() {
        let a = assignment(Some(now() - Duration::days(30)));
        let s = submission(Some(SubmissionStatus::Graded), true);
        assert_eq!(resolve(&a, Some(&s), now(), OverdueLabel::Late), Status::Graded);
        let a = assignment(None);
        assert_eq!(resolve(&a, Some(&s), now(), OverdueLabel::Missing), Status::Graded);
    }

    #[test]
    fn submitted_uses_late_flag() {
        let a = assignment(Some(now() + Duration::hours(200)));
        let on_time = submission(Some(SubmissionStatus::Submitted), false);
        let late = submission(Some(SubmissionStatus::Submitted), true);
        assert_eq!(resolve(&a, Some(&on_time), now(), OverdueLabel::Late), Status::Submitted);
        assert_eq!(resolve(&a, Some(&late), now(), OverdueLabel::Late), Status::Late);
    }

    #[test]
    fn submission_recorded_late_stays_late() {
        let s = submission(Some(SubmissionStatus::Late), false);
        let overdue = assignment(Some(now() - Duration::hours(30)));
        let upcoming = assignment(Some(now() + Duration::hours(30)));
        for label in [OverdueLabel::Late, OverdueLabel::Missing] {
            assert_eq!(resolve(&overdue, Some(&s), now(), label), Status::Late);
            assert_eq!(resolve(&upcoming, Some(&s), now(), label), Status::Late);
        }
        assert!(is_handed_in(Some(&s)));
        assert!(!is_overdue_unsubmitted(&overdue, Some(&s), now()));
    }

    #[test]
    fn past_due_without_submission_is_overdue_label() {
        let a = assignment(Some(now() - Duration::hours(1)));
        assert_eq!(resolve(&a, None, now(), OverdueLabel::Late), Status::Late);
        assert_eq!(resolve(&a, None, now(), OverdueLabel::Missing), Status::Missing);
        let ns = submission(Some(SubmissionStatus::NotSubmitted), false);
        assert_eq!(resolve(&a, Some(&ns), now(), OverdueLabel::Late), Status::Late);
    }

    #[test]
    fn submission_without_status_counts_as_absent() {
        let a = assignment(Some(now() + Duration::hours(1)));
        let blank = submission(None, true);
        assert_eq!(
            resolve(&a, Some(&blank), now(), OverdueLabel::Late),
            resolve(&a, None, now(), OverdueLabel::Late)
        );
    }

    #[test]
    fn due_exactly_now_is_not_yet_overdue() {
        let a = assignment(Some(now()));
        assert_eq!(resolve(&a, None, now(), OverdueLabel::Late), Status::Assigned);
        assert!(!is_overdue_unsubmitted(&a, None, now()));
    }

    #[test]
    fn overdue_check_ignores_handed_in_work() {
        let a = assignment(Some(now() - Duration::hours(5)));
        let s = submission(Some(SubmissionStatus::Submitted), true);
        assert!(!is_overdue_unsubmitted(&a, Some(&s), now()));
        assert!(is_overdue_unsubmitted(&a, None, now()));
    }
}
