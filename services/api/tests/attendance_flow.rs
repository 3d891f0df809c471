mod support;

use serde_json::{json, Value};
use support::*;

fn counts(stats: &Value) -> (u64, u64, u64, u64, u64) {
    let n = |k: &str| stats[k].as_u64().expect(k);
    (n("total"), n("present"), n("absent"), n("late"), n("missed"))
}

#[tokio::test]
async fn a_class_without_a_record_counts_everyone_missed() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    enroll(addr, &admin, "lkg", 10).await;

    let res = get(addr, "/attendance/stats/daily?date=2024-01-10", &admin).await;
    assert_eq!(res.status, 200, "{}", res.body);
    let body = res.json();
    assert_eq!(counts(&body["classes"]["lkg"]), (10, 0, 0, 0, 10));
    assert_eq!(body["percentages"]["lkg"], 0);
    // Classes with nobody enrolled are left out.
    assert!(body["classes"].get("ukg").is_none());
}

#[tokio::test]
async fn unmarked_students_are_missed_alongside_the_marked_ones() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    let teacher = account(addr, &admin, "teacher@school.test", "teacher", None).await;
    let rolls = enroll(addr, &admin, "ukg", 5).await;

    let entries = json!([
        { "roll_number": rolls[0], "status": "present" },
        { "roll_number": rolls[1], "status": "present" },
        { "roll_number": rolls[2], "status": "present" },
        { "roll_number": rolls[3], "status": "absent", "remarks": "fever" },
    ]);
    let saved = put(
        addr,
        "/attendance/ukg/2024-01-10",
        &teacher,
        json!({ "entries": entries }),
    )
    .await;
    assert_eq!(saved.status, 200, "{}", saved.body);
    assert_eq!(saved.json()["version"], 1);

    let stats = get(addr, "/attendance/stats/daily?date=2024-01-10", &teacher).await;
    assert_eq!(counts(&stats.json()["classes"]["ukg"]), (5, 3, 1, 0, 1));
    assert_eq!(stats.json()["percentages"]["ukg"], 60);

    let sheet = get(addr, "/attendance/ukg/2024-01-10", &teacher).await;
    assert_eq!(sheet.status, 200, "{}", sheet.body);
    let sheet = sheet.json();
    assert_eq!(sheet["version"], 1);
    assert_eq!(sheet["rows"][3]["remarks"], "fever");
    assert_eq!(sheet["rows"][4]["status"], "missed");
}

#[tokio::test]
async fn stale_writes_are_rejected_with_conflict() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    let rolls = enroll(addr, &admin, "nursery", 2).await;
    let body = |status: &str, expected: Value| {
        json!({
            "entries": [{ "roll_number": rolls[0], "status": status }],
            "expected_version": expected,
        })
    };
    let path = "/attendance/nursery/2024-02-05";

    assert_eq!(put(addr, path, &admin, body("present", Value::Null)).await.status, 200);
    // A second writer who also saw no record loses.
    assert_eq!(put(addr, path, &admin, body("absent", Value::Null)).await.status, 409);

    let updated = put(addr, path, &admin, body("late", json!(1))).await;
    assert_eq!(updated.status, 200);
    assert_eq!(updated.json()["version"], 2);
    assert_eq!(put(addr, path, &admin, body("absent", json!(1))).await.status, 409);

    let stats = get(addr, "/attendance/stats/daily?date=2024-02-05", &admin).await;
    assert_eq!(counts(&stats.json()["classes"]["nursery"]), (2, 0, 0, 1, 1));
}

#[tokio::test]
async fn entries_must_match_the_class_roster() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    let lkg = enroll(addr, &admin, "lkg", 1).await;
    let ukg = enroll(addr, &admin, "ukg", 1).await;

    let res = put(
        addr,
        "/attendance/lkg/2024-01-10",
        &admin,
        json!({ "entries": [
            { "roll_number": lkg[0], "status": "present" },
            { "roll_number": ukg[0], "status": "present" },
        ] }),
    )
    .await;
    assert_eq!(res.status, 422);
    assert!(res.body.contains("not on the class roster"));

    let future = put(
        addr,
        "/attendance/lkg/2999-01-01",
        &admin,
        json!({ "entries": [] }),
    )
    .await;
    assert_eq!(future.status, 422);

    assert_eq!(get(addr, "/attendance/2nd/2024-01-10", &admin).await.status, 400);
}

#[tokio::test]
async fn ranges_are_checked_and_summarised() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    let rolls = enroll(addr, &admin, "play", 2).await;
    put(
        addr,
        "/attendance/play/2024-03-04",
        &admin,
        json!({ "entries": [
            { "roll_number": rolls[0], "status": "present" },
            { "roll_number": rolls[1], "status": "late" },
        ] }),
    )
    .await;

    let inverted = get(
        addr,
        "/attendance/stats/range?start=2024-03-10&end=2024-03-01",
        &admin,
    )
    .await;
    assert_eq!(inverted.status, 400);

    let range = get(
        addr,
        "/attendance/stats/range?start=2024-03-04&end=2024-03-05",
        &admin,
    )
    .await;
    assert_eq!(range.status, 200, "{}", range.body);
    let range = range.json();
    assert_eq!(range["days"].as_array().map(Vec::len), Some(2));
    let summary = &range["summary"]["play"];
    assert_eq!(summary["days_with_attendance"], 1);
    assert_eq!(counts(summary), (4, 1, 0, 1, 2));
    assert_eq!(range["percentages"]["play"], 50);

    let month = get(addr, "/attendance/stats/monthly?year=2024&month=3", &admin).await;
    assert_eq!(month.status, 200);
    assert_eq!(month.json()["working_days"], 21);
    assert_eq!(
        get(addr, "/attendance/stats/monthly?year=2024&month=13", &admin)
            .await
            .status,
        400
    );
}

#[tokio::test]
async fn students_see_only_their_own_attendance() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    let rolls = enroll(addr, &admin, "1st", 2).await;
    put(
        addr,
        "/attendance/1st/2024-01-08",
        &admin,
        json!({ "entries": [{ "roll_number": rolls[0], "status": "present" }] }),
    )
    .await;
    let kid = account(addr, &admin, "kid@school.test", "student", Some(&rolls[0])).await;

    let own = get(
        addr,
        &format!("/students/{}/attendance?start=2024-01-01&end=2024-01-31", rolls[0]),
        &kid,
    )
    .await;
    assert_eq!(own.status, 200, "{}", own.body);
    assert_eq!(own.json()["recorded_days"], 1);
    assert_eq!(own.json()["percentage"], 100);

    let other = get(
        addr,
        &format!("/students/{}/attendance?start=2024-01-01&end=2024-01-31", rolls[1]),
        &kid,
    )
    .await;
    assert_eq!(other.status, 403);
    assert_eq!(get(addr, "/attendance/stats/daily", &kid).await.status, 403);
}
