mod support;

use serde_json::{json, Value};
use support::*;

fn student_account(email: &str, student: Value) -> Value {
    json!({
        "email": email,
        "password": PASSWORD,
        "display_name": email,
        "role": "student",
        "student": student,
    })
}

#[tokio::test]
async fn roll_numbers_follow_the_class_prefix() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;

    assert_eq!(enroll(addr, &admin, "lkg", 2).await, vec!["LKG-001", "LKG-002"]);
    assert_eq!(enroll(addr, &admin, "play", 1).await, vec!["PG-001"]);

    let taken = {
        let mut body = new_student("Twin", "lkg");
        body["roll_number"] = json!("LKG-002");
        post(addr, "/students", &admin, body).await
    };
    assert_eq!(taken.status, 409);

    let listed = get(addr, "/students?class=lkg", &admin).await;
    assert_eq!(listed.json().as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn enrolment_continues_after_a_student_changes_class() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    assert_eq!(enroll(addr, &admin, "lkg", 2).await, vec!["LKG-001", "LKG-002"]);

    let mut promoted = new_student("Child1", "ukg");
    promoted["is_active"] = json!(true);
    let res = put(addr, "/students/LKG-002", &admin, promoted).await;
    assert_eq!(res.status, 200, "{}", res.body);
    assert_eq!(res.json()["class"], "ukg");

    assert_eq!(enroll(addr, &admin, "lkg", 2).await, vec!["LKG-003", "LKG-004"]);
    assert_eq!(get(addr, "/students/LKG-002", &admin).await.json()["class"], "ukg");
}

#[tokio::test]
async fn a_deleted_students_roll_number_is_not_reissued() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    let rolls = enroll(addr, &admin, "lkg", 1).await;
    let report = post(
        addr,
        "/reports",
        &admin,
        json!({
            "roll_number": rolls[0],
            "term": "term1",
            "academic_year": "2023-24",
            "subjects": [{ "subject": "English", "marks": 10, "max_marks": 50 }],
        }),
    )
    .await;
    assert_eq!(report.status, 201, "{}", report.body);
    assert_eq!(delete(addr, "/students/LKG-001", &admin).await.status, 200);

    assert_eq!(enroll(addr, &admin, "lkg", 1).await, vec!["LKG-002"]);
    let reports = get(addr, "/students/LKG-002/reports", &admin).await;
    assert_eq!(reports.status, 200, "{}", reports.body);
    assert_eq!(reports.json().as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn bulk_import_keeps_going_past_invalid_rows() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;

    let nameless = new_student("", "ukg");
    let res = post(
        addr,
        "/students/bulk",
        &admin,
        json!([
            new_student("Asha", "ukg"),
            nameless,
            new_student("Vikram", "ukg"),
        ]),
    )
    .await;
    assert_eq!(res.status, 200, "{}", res.body);
    let report = res.json();
    assert_eq!(report["succeeded"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["failures"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["failures"][0]["index"], 1);
    assert!(report["aborted"].is_null());
    assert_eq!(report["succeeded"][1]["roll_number"], "UKG-002");
}

#[tokio::test]
async fn a_failed_account_removes_the_student_it_enrolled() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    account(addr, &admin, "taken@school.test", "teacher", None).await;

    let res = post(
        addr,
        "/users/bulk",
        &admin,
        json!([
            student_account("first@school.test", new_student("Meera", "1st")),
            student_account("taken@school.test", new_student("Rohan", "1st")),
        ]),
    )
    .await;
    assert_eq!(res.status, 200, "{}", res.body);
    let report = res.json();
    assert_eq!(report["succeeded"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["succeeded"][0]["roll_number"], "1ST-001");
    assert_eq!(report["failures"][0]["label"], "taken@school.test");
    assert!(report["failures"][0]["reason"]
        .as_str()
        .expect("reason")
        .contains("1ST-002"));

    assert_eq!(get(addr, "/students/1ST-002", &admin).await.status, 404);
    let class = get(addr, "/students?class=1st", &admin).await;
    assert_eq!(class.json().as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn deleting_a_student_removes_the_paired_account() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    let rolls = enroll(addr, &admin, "nursery", 1).await;
    let kid = account(addr, &admin, "kid@school.test", "student", Some(&rolls[0])).await;
    assert_eq!(get(addr, &format!("/students/{}", rolls[0]), &kid).await.status, 200);

    let res = delete(addr, &format!("/students/{}", rolls[0]), &admin).await;
    assert_eq!(res.status, 200, "{}", res.body);
    assert_eq!(res.json()["accounts_removed"], 1);
    assert!(res.json()["account_cleanup_error"].is_null());

    assert_eq!(login(addr, "kid@school.test", PASSWORD).await.status, 401);
    assert_eq!(get(addr, "/auth/me", &kid).await.status, 401);
    let students = get(addr, "/users?role=student", &admin).await;
    assert_eq!(students.json().as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn bulk_routes_are_admin_only() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    let teacher = account(addr, &admin, "teacher@school.test", "teacher", None).await;

    let res = post(addr, "/students/bulk", &teacher, json!([new_student("Asha", "ukg")])).await;
    assert_eq!(res.status, 403);
    let res = post(addr, "/users/bulk", &teacher, json!([])).await;
    assert_eq!(res.status, 403);
}
