use crate::grades::{self, ClassGradeSummary, StudentInfo};
use crate::ipc::error::{err, ok, validation_err};
use crate::ipc::helpers::{optional_field, parse_now, request_config, required_field};
use crate::ipc::types::{AppState, Request};
use crate::model::{submissions_by_assignment, Assignment, ClassInfo, Submission};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassInput {
    class: ClassInfo,
    assignments: Vec<Assignment>,
    #[serde(default)]
    submissions: Vec<Submission>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentInput {
    #[serde(flatten)]
    student: StudentInfo,
    #[serde(default)]
    submissions: Vec<Submission>,
}

fn handle_grades_class_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = &req.params;
    let cfg = match request_config(state, p) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let now = match parse_now(p) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let class: Option<ClassInfo> = match optional_field(p, "class") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let assignments: Vec<Assignment> = match required_field(p, "assignments") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let submissions: Vec<Submission> = match optional_field(p, "submissions") {
        Ok(v) => v.unwrap_or_default(),
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    let by_assignment = submissions_by_assignment(submissions);
    match grades::aggregate(&assignments, &by_assignment, now, &cfg) {
        Ok(summary) => {
            let summary = match class {
                Some(c) => summary.with_class(c),
                None => summary,
            };
            ok(&req.id, json!(summary))
        }
        Err(e) => validation_err(&req.id, e),
    }
}

fn handle_grades_student_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = &req.params;
    let cfg = match request_config(state, p) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let now = match parse_now(p) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let student: StudentInfo = match required_field(p, "student") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let classes: Vec<ClassInput> = match required_field(p, "classes") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let filters = match grades::parse_grade_filters(p.get("filters")) {
        Ok(v) => v,
        Err(e) => return validation_err(&req.id, e),
    };
    let sort = match grades::parse_grade_sort(p.get("sort")) {
        Ok(v) => v,
        Err(e) => return validation_err(&req.id, e),
    };

    let mut summaries: Vec<ClassGradeSummary> = Vec::with_capacity(classes.len());
    for c in classes {
        let by_assignment = submissions_by_assignment(c.submissions);
        match grades::aggregate(&c.assignments, &by_assignment, now, &cfg) {
            Ok(s) => summaries.push(s.with_class(c.class)),
            Err(e) => {
                let e = e.with_context("classId", c.class.class_id);
                return validation_err(&req.id, e);
            }
        }
    }
    // The overall percentage covers every class, not just the listed ones.
    let mut summary = grades::student_summary(student, summaries);
    summary.classes = grades::filter_and_sort_classes(summary.classes, &filters, sort);
    ok(&req.id, json!(summary))
}

fn handle_grades_class_students(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = &req.params;
    let cfg = match request_config(state, p) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let now = match parse_now(p) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let class: ClassInfo = match required_field(p, "class") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let assignments: Vec<Assignment> = match required_field(p, "assignments") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let students: Vec<StudentInput> = match required_field(p, "students") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    let mut rows: Vec<(StudentInfo, ClassGradeSummary)> = Vec::with_capacity(students.len());
    for s in students {
        let by_assignment = submissions_by_assignment(s.submissions);
        match grades::aggregate(&assignments, &by_assignment, now, &cfg) {
            Ok(summary) => rows.push((s.student, summary)),
            Err(e) => {
                let e = e.with_context("studentId", s.student.student_id);
                return validation_err(&req.id, e);
            }
        }
    }
    ok(&req.id, json!(grades::class_students_summary(class, rows)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.classSummary" => Some(handle_grades_class_summary(state, req)),
        "grades.studentSummary" => Some(handle_grades_student_summary(state, req)),
        "grades.classStudents" => Some(handle_grades_class_students(state, req)),
        _ => None,
    }
}
