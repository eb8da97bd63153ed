use crate::config::parse_sort;
use crate::ipc::error::{err, ok, validation_err};
use crate::ipc::helpers::{class_names, optional_field, parse_now, request_config, required_field};
use crate::ipc::types::{AppState, Request};
use crate::model::{submissions_by_assignment, Assignment, ClassInfo, Submission};
use crate::views;
use serde_json::json;

fn handle_assignments_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = &req.params;
    let cfg = match request_config(state, p) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let now = match parse_now(p) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let assignment: Assignment = match required_field(p, "assignment") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let submission: Option<Submission> = match optional_field(p, "submission") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    let view = views::derive_view(
        &assignment,
        submission.as_ref(),
        None,
        now,
        cfg.overdue_status,
    );
    ok(
        &req.id,
        json!({
            "assignmentId": assignment.id,
            "status": view.status,
            "priority": view.priority,
            "timeStatus": view.time_status,
            "timeLabel": view.time_label,
        }),
    )
}

fn handle_assignments_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = &req.params;
    let cfg = match request_config(state, p) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let now = match parse_now(p) {
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
    let classes: Vec<ClassInfo> = match optional_field(p, "classes") {
        Ok(v) => v.unwrap_or_default(),
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let filters = match views::parse_view_filters(p.get("filters")) {
        Ok(v) => v,
        Err(e) => return validation_err(&req.id, e),
    };
    let sort = match p.get("sort") {
        None => cfg.default_sort,
        Some(v) if v.is_null() => cfg.default_sort,
        Some(v) => match parse_sort(v, &cfg.default_sort) {
            Ok(s) => s,
            Err(msg) => return err(&req.id, "bad_params", msg, None),
        },
    };
    let group = match p.get("groupByClass") {
        None => false,
        Some(v) if v.is_null() => false,
        Some(v) => match v.as_bool() {
            Some(b) => b,
            None => return err(&req.id, "bad_params", "groupByClass must be boolean", None),
        },
    };

    let by_assignment = submissions_by_assignment(submissions);
    let names = class_names(&classes);
    let all = views::derive_views(&assignments, &by_assignment, &names, now, cfg.overdue_status);
    let counts = views::count_views(&all);
    let listed = views::filter_and_sort(all, &filters, sort, now);
    tracing::debug!(
        total = counts.total,
        listed = listed.len(),
        "derived assignment views"
    );

    let groups = group.then(|| views::group_by_class(&listed));

    let mut result = json!({
        "now": now,
        "filters": filters,
        "sort": sort,
        "counts": counts,
        "assignments": listed,
    });
    if let Some(groups) = groups {
        result["groups"] = json!(groups);
    }
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.resolve" => Some(handle_assignments_resolve(state, req)),
        "assignments.list" => Some(handle_assignments_list(state, req)),
        _ => None,
    }
}
