mod support;

use serde_json::json;
use support::*;

#[tokio::test]
async fn first_signup_becomes_admin_and_closes_signup() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;

    let me = get(addr, "/auth/me", &admin).await;
    assert_eq!(me.status, 200);
    assert_eq!(me.json()["role"], "admin");

    let second = send(
        addr,
        "POST",
        "/auth/signup",
        None,
        Some(json!({
            "email": "other@school.test",
            "password": PASSWORD,
            "display_name": "Other",
        })),
    )
    .await;
    assert_eq!(second.status, 403);
}

#[tokio::test]
async fn login_rejects_a_wrong_password() {
    let addr = spawn_app().await;
    bootstrap_admin(addr).await;

    assert_eq!(login(addr, ADMIN_EMAIL, "not-the-password").await.status, 401);
    assert_eq!(login(addr, "nobody@school.test", PASSWORD).await.status, 401);

    let ok = login(addr, "HEAD@school.test", PASSWORD).await;
    assert_eq!(ok.status, 200);
    assert!(ok.session_cookie().starts_with("session="));
}

#[tokio::test]
async fn protected_routes_need_a_live_session() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;

    assert_eq!(send(addr, "GET", "/auth/me", None, None).await.status, 401);
    assert_eq!(get(addr, "/auth/me", "session=forged").await.status, 401);

    let out = send(addr, "POST", "/auth/logout", Some(&admin), None).await;
    assert_eq!(out.status, 200);
    assert_eq!(get(addr, "/auth/me", &admin).await.status, 401);
}

#[tokio::test]
async fn only_admins_manage_accounts() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;
    let teacher = account(addr, &admin, "teacher@school.test", "teacher", None).await;

    let attempt = post(
        addr,
        "/users",
        &teacher,
        json!({
            "email": "sneaky@school.test",
            "password": PASSWORD,
            "display_name": "Sneaky",
            "role": "admin",
        }),
    )
    .await;
    assert_eq!(attempt.status, 403);

    let duplicate = post(
        addr,
        "/users",
        &admin,
        json!({
            "email": "Teacher@school.test",
            "password": PASSWORD,
            "display_name": "Again",
            "role": "teacher",
        }),
    )
    .await;
    assert_eq!(duplicate.status, 409);

    let users = get(addr, "/users?role=teacher", &admin).await;
    assert_eq!(users.status, 200);
    assert_eq!(users.json().as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn student_accounts_must_point_at_an_existing_student() {
    let addr = spawn_app().await;
    let admin = bootstrap_admin(addr).await;

    let res = post(
        addr,
        "/users",
        &admin,
        json!({
            "email": "kid@school.test",
            "password": PASSWORD,
            "display_name": "Kid",
            "role": "student",
            "roll_number": "LKG-001",
        }),
    )
    .await;
    assert_eq!(res.status, 404);

    let missing_roll = post(
        addr,
        "/users",
        &admin,
        json!({
            "email": "kid@school.test",
            "password": PASSWORD,
            "display_name": "Kid",
            "role": "student",
        }),
    )
    .await;
    assert_eq!(missing_roll.status, 422);
}
