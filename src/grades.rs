use crate::config::DeriveConfig;
use crate::error::ValidationError;
use crate::model::{Assignment, ClassInfo, Id, Status, Submission, SubmissionStatus};
use crate::status;
use crate::views::SortDirection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Fixed 90/80/70/60 banding.
pub fn letter_grade(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "A"
    } else if percentage >= 80.0 {
        "B"
    } else if percentage >= 70.0 {
        "C"
    } else if percentage >= 60.0 {
        "D"
    } else {
        "F"
    }
}

fn percent_of(earned: f64, total: f64) -> f64 {
    if total > 0.0 {
        100.0 * earned / total
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentGrade {
    pub assignment_id: Id,
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub points_possible: f64,
    pub grade: Option<f64>,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGradeSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassInfo>,
    pub assignments: Vec<AssignmentGrade>,
    pub total_points: f64,
    pub earned_points: f64,
    pub percentage: f64,
    pub letter_grade: &'static str,
}

impl ClassGradeSummary {
    pub fn with_class(mut self, class: ClassInfo) -> Self {
        self.class = Some(class);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInfo {
    #[serde(alias = "userId")]
    pub student_id: Id,
    #[serde(default)]
    pub student_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One student's summaries across all of their classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGradeSummary {
    #[serde(flatten)]
    pub student: StudentInfo,
    pub classes: Vec<ClassGradeSummary>,
    pub overall_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentClassSummary {
    #[serde(flatten)]
    pub student: StudentInfo,
    pub earned_points: f64,
    pub total_points: f64,
    pub percentage: f64,
    pub letter_grade: &'static str,
}

/// Teacher view: every student of one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStudentsGradeSummary {
    pub class: ClassInfo,
    pub students: Vec<StudentClassSummary>,
    pub average_percentage: f64,
}

/// Rejects records the aggregator cannot total honestly.
pub fn validate(
    assignment: &Assignment,
    submission: Option<&Submission>,
) -> Result<(), ValidationError> {
    if !assignment.points_possible.is_finite() || assignment.points_possible < 0.0 {
        return Err(ValidationError::new(
            "negative_points",
            format!(
                "assignment {} has invalid pointsPossible {}",
                assignment.id, assignment.points_possible
            ),
        )
        .with_details(json!({ "assignmentId": assignment.id })));
    }
    let Some(sub) = submission else {
        return Ok(());
    };
    let Some(grade) = sub.grade else {
        return Ok(());
    };
    if !grade.is_finite() {
        return Err(ValidationError::new(
            "bad_grade",
            format!("assignment {} has a non-finite grade", assignment.id),
        )
        .with_details(json!({ "assignmentId": assignment.id })));
    }
    if sub.status != Some(SubmissionStatus::Graded) {
        return Err(ValidationError::new(
            "grade_without_graded_status",
            format!(
                "assignment {} carries a grade but its submission is not graded",
                assignment.id
            ),
        )
        .with_details(json!({
            "assignmentId": assignment.id,
            "status": sub.status,
        })));
    }
    Ok(())
}

/// Grade summary for one student in one class.
///
/// Only `graded` work with a grade contributes to the totals unless
/// `count_missing_as_zero` is set, in which case overdue unsubmitted work adds
/// its points to the denominator and nothing to the numerator.
pub fn aggregate(
    assignments: &[Assignment],
    submissions: &HashMap<Id, Submission>,
    now: DateTime<Utc>,
    cfg: &DeriveConfig,
) -> Result<ClassGradeSummary, ValidationError> {
    let mut rows: Vec<AssignmentGrade> = Vec::with_capacity(assignments.len());
    let mut total_points = 0.0_f64;
    let mut earned_points = 0.0_f64;

    for a in assignments {
        let sub = submissions.get(&a.id);
        validate(a, sub)?;

        let status = status::resolve(a, sub, now, cfg.overdue_status);
        let grade = if status == Status::Graded {
            sub.and_then(|s| s.grade)
        } else {
            None
        };

        match (status, grade) {
            (Status::Graded, Some(g)) => {
                if g < 0.0 || g > a.points_possible {
                    tracing::warn!(
                        assignment_id = a.id,
                        grade = g,
                        points_possible = a.points_possible,
                        "grade outside 0..=pointsPossible"
                    );
                }
                total_points += a.points_possible;
                earned_points += g;
            }
            (Status::Graded, None) => {
                tracing::warn!(
                    assignment_id = a.id,
                    "graded submission has no grade, leaving it out of the totals"
                );
            }
            _ if cfg.count_missing_as_zero && status::is_overdue_unsubmitted(a, sub, now) => {
                total_points += a.points_possible;
            }
            _ => {}
        }

        let percentage = match grade {
            Some(g) if a.points_possible > 0.0 => Some(100.0 * g / a.points_possible),
            _ => None,
        };

        rows.push(AssignmentGrade {
            assignment_id: a.id,
            title: a.title.clone(),
            due_date: a.due_date,
            points_possible: a.points_possible,
            grade,
            status,
            submission_date: sub.and_then(|s| s.submission_date),
            feedback: sub.and_then(|s| s.feedback.clone()).filter(|f| !f.is_empty()),
            percentage,
        });
    }

    let percentage = percent_of(earned_points, total_points);
    Ok(ClassGradeSummary {
        class: None,
        assignments: rows,
        total_points,
        earned_points,
        percentage,
        letter_grade: letter_grade(percentage),
    })
}

/// Rolls class summaries up into a student's overall percentage, weighting
/// each class by the points it has graded.
pub fn student_summary(student: StudentInfo, classes: Vec<ClassGradeSummary>) -> StudentGradeSummary {
    let total: f64 = classes.iter().map(|c| c.total_points).sum();
    let earned: f64 = classes.iter().map(|c| c.earned_points).sum();
    StudentGradeSummary {
        student,
        classes,
        overall_percentage: percent_of(earned, total),
    }
}

/// Per-student rows for one class; the class average is the plain mean of
/// the student percentages.
pub fn class_students_summary(
    class: ClassInfo,
    students: Vec<(StudentInfo, ClassGradeSummary)>,
) -> ClassStudentsGradeSummary {
    let rows: Vec<StudentClassSummary> = students
        .into_iter()
        .map(|(student, summary)| StudentClassSummary {
            student,
            earned_points: summary.earned_points,
            total_points: summary.total_points,
            percentage: summary.percentage,
            letter_grade: summary.letter_grade,
        })
        .collect();
    let average_percentage = if rows.is_empty() {
        0.0
    } else {
        rows.iter().map(|r| r.percentage).sum::<f64>() / rows.len() as f64
    };
    ClassStudentsGradeSummary {
        class,
        students: rows,
        average_percentage,
    }
}

/// Narrows the per-class rows of a student summary. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeFilters {
    pub class_id: Option<Id>,
    pub min_grade: Option<f64>,
    pub max_grade: Option<f64>,
}

impl GradeFilters {
    pub fn matches(&self, c: &ClassGradeSummary) -> bool {
        let class_ok = match self.class_id {
            Some(id) => c.class.as_ref().map(|k| k.class_id) == Some(id),
            None => true,
        };
        let min_ok = self.min_grade.map(|m| c.percentage >= m).unwrap_or(true);
        let max_ok = self.max_grade.map(|m| c.percentage <= m).unwrap_or(true);
        class_ok && min_ok && max_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GradeSortField {
    #[default]
    ClassName,
    Percentage,
    TotalPoints,
    DueDate,
}

impl GradeSortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "className" => Some(Self::ClassName),
            "percentage" => Some(Self::Percentage),
            "totalPoints" => Some(Self::TotalPoints),
            "dueDate" => Some(Self::DueDate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSortSpec {
    pub field: GradeSortField,
    pub direction: SortDirection,
}

fn optional_number(
    obj: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<Option<f64>, ValidationError> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v.as_f64().filter(|n| n.is_finite()).map(Some).ok_or_else(|| {
            ValidationError::new("bad_params", format!("filters.{} must be a number", key))
        }),
    }
}

pub fn parse_grade_filters(raw: Option<&Value>) -> Result<GradeFilters, ValidationError> {
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        return Ok(GradeFilters::default());
    };
    let Some(obj) = raw.as_object() else {
        return Err(ValidationError::new("bad_params", "filters must be an object"));
    };

    let class_id = match obj.get("classId") {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) if v.as_str().map(|s| s.trim().eq_ignore_ascii_case("all")).unwrap_or(false) => None,
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
    let min_grade = optional_number(obj, "minGrade")?;
    let max_grade = optional_number(obj, "maxGrade")?;

    Ok(GradeFilters {
        class_id,
        min_grade,
        max_grade,
    })
}

/// Parses `{field?, direction?}`; absent keys fall back to class name ascending.
pub fn parse_grade_sort(raw: Option<&Value>) -> Result<GradeSortSpec, ValidationError> {
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        return Ok(GradeSortSpec::default());
    };
    let Some(obj) = raw.as_object() else {
        return Err(ValidationError::new("bad_params", "sort must be an object"));
    };
    let mut out = GradeSortSpec::default();
    if let Some(f) = obj.get("field").filter(|f| !f.is_null()) {
        out.field = f.as_str().and_then(GradeSortField::parse).ok_or_else(|| {
            ValidationError::new(
                "bad_params",
                "sort.field must be one of: className, percentage, totalPoints, dueDate",
            )
        })?;
    }
    if let Some(d) = obj.get("direction").filter(|d| !d.is_null()) {
        out.direction = d.as_str().and_then(SortDirection::parse).ok_or_else(|| {
            ValidationError::new("bad_params", "sort.direction must be asc or desc")
        })?;
    }
    Ok(out)
}

/// Earliest due date among a class's assignments.
fn first_due(c: &ClassGradeSummary) -> Option<DateTime<Utc>> {
    c.assignments.iter().filter_map(|a| a.due_date).min()
}

fn compare_classes(a: &ClassGradeSummary, b: &ClassGradeSummary, field: GradeSortField) -> Ordering {
    match field {
        GradeSortField::ClassName => {
            let name = |c: &ClassGradeSummary| {
                c.class
                    .as_ref()
                    .map(|k| k.class_name.to_lowercase())
                    .unwrap_or_default()
            };
            name(a).cmp(&name(b))
        }
        GradeSortField::Percentage => a
            .percentage
            .partial_cmp(&b.percentage)
            .unwrap_or(Ordering::Equal),
        GradeSortField::TotalPoints => a
            .total_points
            .partial_cmp(&b.total_points)
            .unwrap_or(Ordering::Equal),
        // Classes with nothing dated sort after the rest.
        GradeSortField::DueDate => match (first_due(a), first_due(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Filters then stably sorts class rows. Totals computed before this call
/// are not touched.
pub fn filter_and_sort_classes(
    classes: Vec<ClassGradeSummary>,
    filters: &GradeFilters,
    sort: GradeSortSpec,
) -> Vec<ClassGradeSummary> {
    let mut out: Vec<ClassGradeSummary> =
        classes.into_iter().filter(|c| filters.matches(c)).collect();
    out.sort_by(|a, b| {
        let ord = compare_classes(a, b, sort.field);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    out
}
