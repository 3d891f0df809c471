#![allow(dead_code)]

use api_lib::adapters::InMemoryStore;
use api_lib::config::Config;
use api_lib::web::{self, AppState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub struct Response {
    pub status: u16,
    pub head: String,
    pub body: String,
}

impl Response {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("response is not json ({e}): {}", self.body))
    }

    /// `session=<id>` taken from the `Set-Cookie` header.
    pub fn session_cookie(&self) -> String {
        self.head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if !name.eq_ignore_ascii_case("set-cookie") {
                    return None;
                }
                value.trim().split(';').next().map(str::to_string)
            })
            .expect("set-cookie header")
    }
}

pub async fn spawn_app() -> SocketAddr {
    let state = Arc::new(AppState::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(Config::default()),
    ));
    let app = web::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

pub async fn send(
    addr: SocketAddr,
    method: &str,
    path: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let payload = body.map(|b| b.to_string());
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(cookie) = cookie {
        req.push_str(&format!("Cookie: {cookie}\r\n"));
    }
    match &payload {
        Some(payload) => {
            req.push_str("Content-Type: application/json\r\n");
            req.push_str(&format!("Content-Length: {}\r\n", payload.len()));
        }
        None => req.push_str("Content-Length: 0\r\n"),
    }
    req.push_str("\r\n");
    if let Some(payload) = &payload {
        req.push_str(payload);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    Response {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

pub async fn get(addr: SocketAddr, path: &str, cookie: &str) -> Response {
    send(addr, "GET", path, Some(cookie), None).await
}

pub async fn post(addr: SocketAddr, path: &str, cookie: &str, body: Value) -> Response {
    send(addr, "POST", path, Some(cookie), Some(body)).await
}

pub async fn put(addr: SocketAddr, path: &str, cookie: &str, body: Value) -> Response {
    send(addr, "PUT", path, Some(cookie), Some(body)).await
}

pub async fn delete(addr: SocketAddr, path: &str, cookie: &str) -> Response {
    send(addr, "DELETE", path, Some(cookie), None).await
}

pub const ADMIN_EMAIL: &str = "head@school.test";
pub const PASSWORD: &str = "correct-horse";

/// Signs up the first account (the admin) and returns its session cookie.
pub async fn bootstrap_admin(addr: SocketAddr) -> String {
    let res = send(
        addr,
        "POST",
        "/auth/signup",
        None,
        Some(json!({
            "email": ADMIN_EMAIL,
            "password": PASSWORD,
            "display_name": "Head Teacher",
        })),
    )
    .await;
    assert_eq!(res.status, 201, "{}", res.body);
    res.session_cookie()
}

pub async fn login(addr: SocketAddr, email: &str, password: &str) -> Response {
    send(
        addr,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

pub fn new_student(first_name: &str, class: &str) -> Value {
    json!({
        "first_name": first_name,
        "last_name": "Sharma",
        "class": class,
        "age": 4,
        "parent": {
            "father_name": "Ravi Sharma",
            "mother_name": "Asha Sharma",
            "phone": "9876543210"
        },
        "admission_date": "2023-06-01"
    })
}

/// Enrols `count` students in `class` and returns their roll numbers.
pub async fn enroll(addr: SocketAddr, cookie: &str, class: &str, count: usize) -> Vec<String> {
    let mut rolls = Vec::with_capacity(count);
    for i in 0..count {
        let res = post(addr, "/students", cookie, new_student(&format!("Child{i}"), class)).await;
        assert_eq!(res.status, 201, "{}", res.body);
        rolls.push(res.json()["roll_number"].as_str().expect("roll").to_string());
    }
    rolls
}

/// Creates a non-admin account and returns its session cookie.
pub async fn account(
    addr: SocketAddr,
    admin: &str,
    email: &str,
    role: &str,
    roll_number: Option<&str>,
) -> String {
    let res = post(
        addr,
        "/users",
        admin,
        json!({
            "email": email,
            "password": PASSWORD,
            "display_name": email,
            "role": role,
            "roll_number": roll_number,
        }),
    )
    .await;
    assert_eq!(res.status, 201, "{}", res.body);
    let res = login(addr, email, PASSWORD).await;
    assert_eq!(res.status, 200, "{}", res.body);
    res.session_cookie()
}
