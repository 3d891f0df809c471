mod support;

use serde_json::{json, Map, Value};
use support::*;

fn answers(count: u16, answer: &str, overrides: &[(u16, &str)]) -> Value {
    let mut map = Map::new();
    for id in 1..=count {
        let value = overrides
            .iter()
            .find(|(q, _)| *q == id)
            .map_or(answer, |(_, a)| *a);
        map.insert(id.to_string(), json!(value));
    }
    json!({ "answers": map })
}

async fn score(addr: std::net::SocketAddr, instrument: &str, body: Value) -> Response {
    send(
        addr,
        "POST",
        &format!("/assessments/{instrument}/score"),
        None,
        Some(body),
    )
    .await
}

#[tokio::test]
async fn two_critical_concerns_make_mchat_high_risk() {
    let addr = spawn_app().await;
    let res = score(
        addr,
        "mchat",
        answers(20, "yes", &[(1, "no"), (6, "no"), (7, "no")]),
    )
    .await;
    assert_eq!(res.status, 200, "{}", res.body);
    let result = res.json();
    assert_eq!(result["score"], 3);
    assert_eq!(result["critical_concerns"], 2);
    assert_eq!(result["risk"], "high");
    assert!(!result["recommendations"].as_array().expect("list").is_empty());
}

#[tokio::test]
async fn a_full_frequency_scale_is_low_risk() {
    let addr = spawn_app().await;
    let res = score(addr, "social_skills", answers(10, "always", &[])).await;
    assert_eq!(res.status, 200, "{}", res.body);
    let result = res.json();
    assert_eq!(result["percentage"], 100);
    assert_eq!(result["max_score"], 50);
    assert_eq!(result["risk"], "low");
}

#[tokio::test]
async fn incomplete_or_foreign_answers_are_rejected() {
    let addr = spawn_app().await;

    let missing = score(addr, "motor_skills", answers(9, "good", &[])).await;
    assert_eq!(missing.status, 422);
    assert!(missing.body.contains("10"));

    let wrong_scale = score(addr, "motor_skills", answers(10, "always", &[])).await;
    assert_eq!(wrong_scale.status, 422);

    let unknown = score(addr, "ages_and_stages", answers(10, "good", &[])).await;
    assert_eq!(unknown.status, 404);
}

#[tokio::test]
async fn instruments_list_their_questions_and_vocabulary() {
    let addr = spawn_app().await;
    let list = send(addr, "GET", "/assessments", None, None).await;
    assert_eq!(list.status, 200);
    assert_eq!(list.json().as_array().map(Vec::len), Some(4));

    let questions = send(addr, "GET", "/assessments/mchat/questions", None, None).await;
    assert_eq!(questions.status, 200);
    let body = questions.json();
    assert_eq!(body["questions"].as_array().map(Vec::len), Some(20));
    assert_eq!(body["vocabulary"], json!(["yes", "no"]));
}

#[tokio::test]
async fn a_guided_session_walks_to_completion_and_resets() {
    let addr = spawn_app().await;
    let created = send(
        addr,
        "POST",
        "/assessments/sessions",
        None,
        Some(json!({ "instrument": "motor_skills" })),
    )
    .await;
    assert_eq!(created.status, 201, "{}", created.body);
    let id = created.json()["session_id"]
        .as_str()
        .expect("session id")
        .to_string();
    let base = format!("/assessments/sessions/{id}");
    let answer = |value: &str| json!({ "answer": value });

    let early = send(addr, "POST", &format!("{base}/answer"), None, Some(answer("good"))).await;
    assert_eq!(early.status, 409);

    let started = send(addr, "POST", &format!("{base}/start"), None, None).await;
    assert_eq!(started.status, 200);
    assert_eq!(started.json()["phase"]["state"], "in_progress");
    assert_eq!(started.json()["current_question"]["id"], 1);
    let again = send(addr, "POST", &format!("{base}/start"), None, None).await;
    assert_eq!(again.status, 409);

    let off_scale = send(addr, "POST", &format!("{base}/answer"), None, Some(answer("yes"))).await;
    assert_eq!(off_scale.status, 422);

    let mut last = None;
    for _ in 0..10 {
        let res = send(
            addr,
            "POST",
            &format!("{base}/answer"),
            None,
            Some(answer("excellent")),
        )
        .await;
        assert_eq!(res.status, 200, "{}", res.body);
        last = Some(res.json());
    }
    let done = last.expect("answered");
    assert_eq!(done["phase"]["state"], "completed");
    assert_eq!(done["phase"]["result"]["percentage"], 100);
    assert_eq!(done["answered"], 10);

    let after = send(addr, "POST", &format!("{base}/answer"), None, Some(answer("good"))).await;
    assert_eq!(after.status, 409);

    let reset = send(addr, "POST", &format!("{base}/reset"), None, None).await;
    assert_eq!(reset.status, 200);
    assert_eq!(reset.json()["phase"]["state"], "idle");
    assert_eq!(reset.json()["answered"], 0);

    assert_eq!(send(addr, "DELETE", &base, None, None).await.status, 204);
    assert_eq!(send(addr, "GET", &base, None, None).await.status, 404);
}

#[tokio::test]
async fn unknown_sessions_are_not_found() {
    let addr = spawn_app().await;
    let res = send(
        addr,
        "GET",
        "/assessments/sessions/00000000-0000-0000-0000-000000000000",
        None,
        None,
    )
    .await;
    assert_eq!(res.status, 404);
}
