use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

const NOW: &str = "2026-10-16T12:00:00Z";

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_classconnectd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env_remove("CLASSCONNECT_OVERDUE_STATUS")
        .env_remove("CLASSCONNECT_COUNT_MISSING_AS_ZERO")
        .spawn()
        .expect("spawn classconnectd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

fn class_fixture() -> serde_json::Value {
    json!([
        { "id": 1, "classId": 10, "title": "Quiz 1", "dueDate": "2026-10-01T12:00:00Z", "pointsPossible": 100 },
        { "id": 2, "classId": 10, "title": "Quiz 2", "dueDate": "2026-10-08T12:00:00Z", "pointsPossible": 50 },
        { "id": 3, "classId": 10, "title": "Lab", "dueDate": "2026-10-15T12:00:00Z", "pointsPossible": 30 }
    ])
}

#[test]
fn class_summary_counts_only_graded_work() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.classSummary",
        json!({
            "now": NOW,
            "class": { "classId": 10, "className": "Biology", "classCode": "BIO-7" },
            "assignments": class_fixture(),
            "submissions": [
                { "assignmentId": 1, "status": "graded", "grade": 90 },
                { "assignmentId": 2, "status": "graded", "grade": 40 }
            ]
        }),
    );
    assert_eq!(summary["totalPoints"], 150.0);
    assert_eq!(summary["earnedPoints"], 130.0);
    let pct = summary["percentage"].as_f64().expect("percentage");
    assert!((pct - 86.6667).abs() < 1e-3, "percentage {}", pct);
    assert_eq!(summary["letterGrade"], "B");
    assert_eq!(summary["class"]["classCode"], "BIO-7");

    let rows = summary["assignments"].as_array().expect("rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["percentage"], 90.0);
    assert_eq!(rows[2]["status"], "late");
    assert!(rows[2]["grade"].is_null());

    // Same data, but overdue unsubmitted work now counts as zero.
    let strict = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.classSummary",
        json!({
            "now": NOW,
            "options": { "countMissingAsZero": true },
            "assignments": class_fixture(),
            "submissions": [
                { "assignmentId": 1, "status": "graded", "grade": 90 },
                { "assignmentId": 2, "status": "graded", "grade": 40 }
            ]
        }),
    );
    assert_eq!(strict["totalPoints"], 180.0);
    assert_eq!(strict["earnedPoints"], 130.0);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn class_summary_rejects_inconsistent_records() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let negative = request(
        &mut stdin,
        &mut reader,
        "1",
        "grades.classSummary",
        json!({
            "now": NOW,
            "assignments": [{ "id": 1, "classId": 10, "title": "Broken", "pointsPossible": -5 }]
        }),
    );
    assert_eq!(error_code(&negative), Some("negative_points"));

    let ungraded = request(
        &mut stdin,
        &mut reader,
        "2",
        "grades.classSummary",
        json!({
            "now": NOW,
            "assignments": [{ "id": 1, "classId": 10, "title": "Essay", "pointsPossible": 20 }],
            "submissions": [{ "assignmentId": 1, "status": "submitted", "grade": 15 }]
        }),
    );
    assert_eq!(error_code(&ungraded), Some("grade_without_graded_status"));
    assert_eq!(ungraded["error"]["details"]["assignmentId"], 1);

    let zero = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.classSummary",
        json!({
            "now": NOW,
            "assignments": [{ "id": 1, "classId": 10, "title": "Participation", "pointsPossible": 0 }],
            "submissions": [{ "assignmentId": 1, "status": "graded", "grade": 0 }]
        }),
    );
    assert_eq!(zero["percentage"], 0.0);
    assert_eq!(zero["letterGrade"], "F");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn student_and_class_rollups() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let student = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.studentSummary",
        json!({
            "now": NOW,
            "student": { "studentId": 7, "studentName": "Riley Park", "email": "riley@example.edu" },
            "classes": [
                {
                    "class": { "classId": 10, "className": "Biology" },
                    "assignments": [{ "id": 1, "classId": 10, "title": "Quiz", "pointsPossible": 100 }],
                    "submissions": [{ "assignmentId": 1, "status": "graded", "grade": 100 }]
                },
                {
                    "class": { "classId": 20, "className": "Algebra" },
                    "assignments": [{ "id": 2, "classId": 20, "title": "Test", "pointsPossible": 300 }],
                    "submissions": [{ "assignmentId": 2, "status": "graded", "grade": 150 }]
                }
            ]
        }),
    );
    assert_eq!(student["studentId"], 7);
    assert_eq!(student["overallPercentage"], 62.5);
    // Classes come back ordered by name.
    assert_eq!(student["classes"][0]["class"]["className"], "Algebra");
    assert_eq!(student["classes"][0]["letterGrade"], "F");
    assert_eq!(student["classes"][1]["class"]["className"], "Biology");

    let roster = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.classStudents",
        json!({
            "now": NOW,
            "class": { "classId": 10, "className": "Biology" },
            "assignments": [{ "id": 1, "classId": 10, "title": "Quiz", "pointsPossible": 20 }],
            "students": [
                { "studentId": 1, "studentName": "A", "submissions": [{ "assignmentId": 1, "status": "graded", "grade": 18 }] },
                { "userId": 2, "studentName": "B", "submissions": [{ "assignmentId": 1, "status": "graded", "grade": 14 }] },
                { "studentId": 3, "studentName": "C" }
            ]
        }),
    );
    let rows = roster["students"].as_array().expect("students");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["letterGrade"], "A");
    assert_eq!(rows[1]["studentId"], 2);
    assert_eq!(rows[1]["letterGrade"], "C");
    assert_eq!(rows[2]["percentage"], 0.0);
    // (90 + 70 + 0) / 3
    let avg = roster["averagePercentage"].as_f64().expect("average");
    assert!((avg - 53.3333).abs() < 1e-3, "average {}", avg);

    let bad = request(
        &mut stdin,
        &mut reader,
        "3",
        "grades.classStudents",
        json!({
            "now": NOW,
            "class": { "classId": 10 },
            "assignments": [{ "id": 1, "classId": 10, "title": "Quiz", "pointsPossible": 20 }],
            "students": [
                { "studentId": 4, "submissions": [{ "assignmentId": 1, "status": "not_submitted", "grade": 3 }] }
            ]
        }),
    );
    assert_eq!(error_code(&bad), Some("grade_without_graded_status"));
    assert_eq!(bad["error"]["details"]["studentId"], 4);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn student_summary_filters_and_sorts_classes() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let class = |id: i64, name: &str, points: i64, grade: i64| {
        json!({
            "class": { "classId": id, "className": name },
            "assignments": [{ "id": id * 10, "classId": id, "title": "Unit test", "pointsPossible": points }],
            "submissions": [{ "assignmentId": id * 10, "status": "graded", "grade": grade }]
        })
    };
    let params = |filters: serde_json::Value, sort: serde_json::Value| {
        json!({
            "now": NOW,
            "student": { "studentId": 7, "studentName": "Riley Park" },
            "classes": [
                class(10, "Biology", 100, 95),
                class(20, "Algebra", 200, 150),
                class(30, "Chemistry", 50, 25)
            ],
            "filters": filters,
            "sort": sort
        })
    };

    let all = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.studentSummary",
        params(json!(null), json!(null)),
    );
    let names: Vec<&str> = all["classes"]
        .as_array()
        .expect("classes")
        .iter()
        .map(|c| c["class"]["className"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Algebra", "Biology", "Chemistry"]);

    let banded = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.studentSummary",
        params(
            json!({ "minGrade": 60 }),
            json!({ "field": "percentage", "direction": "desc" }),
        ),
    );
    let rows = banded["classes"].as_array().expect("classes");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["class"]["classId"], 10);
    assert_eq!(rows[1]["class"]["classId"], 20);
    // (95 + 150 + 25) / (100 + 200 + 50), filtering leaves this alone.
    let overall = banded["overallPercentage"].as_f64().expect("overall");
    assert!((overall - 77.1428).abs() < 1e-3, "overall {}", overall);
    assert_eq!(banded["overallPercentage"], all["overallPercentage"]);

    let bad = request(
        &mut stdin,
        &mut reader,
        "3",
        "grades.studentSummary",
        params(json!(null), json!({ "field": "letter" })),
    );
    assert_eq!(error_code(&bad), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
}
