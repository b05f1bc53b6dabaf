#![allow(dead_code)]
use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use std::sync::Arc;
use tower::ServiceExt;

use portal_backend::{
    config::Config,
    routes::build_router,
    state::AppState,
    utils::{
        cookies::{ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME},
        time::ManualClock,
    },
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: ManualClock,
}

pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credentials {
    pub fn cookie_header(&self) -> String {
        format!(
            "{}={}; {}={}",
            ACCESS_COOKIE_NAME, self.access_token, REFRESH_COOKIE_NAME, self.refresh_token
        )
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| {
        let value = match key {
            "ACCESS_TOKEN_SECRET" => "test-access-secret",
            "REFRESH_TOKEN_SECRET" => "test-refresh-secret",
            "TOKEN_ISSUER" => "portal-test",
            "COOKIE_SECURE" => "false",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test config")
}

pub fn test_app() -> TestApp {
    let clock = ManualClock::new(Utc::now());
    let state = AppState::in_memory(test_config(), Arc::new(clock.clone()));
    TestApp {
        router: build_router(state.clone()),
        state,
        clock,
    }
}

pub async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router
        .clone()
        .oneshot(request)
        .await
        .expect("router response")
}

pub fn get_with_cookies(uri: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::empty()).expect("build request")
}

pub async fn login(app: &TestApp, username: &str) -> Credentials {
    let response = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "username": username }).to_string(),
            ))
            .expect("build login request"),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    credentials_from(response.headers()).expect("login cookies")
}

pub fn credentials_from(headers: &HeaderMap) -> Option<Credentials> {
    Some(Credentials {
        access_token: extract_set_cookie_value(headers, ACCESS_COOKIE_NAME)?,
        refresh_token: extract_set_cookie_value(headers, REFRESH_COOKIE_NAME)?,
    })
}

pub fn extract_set_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .find_map(|value| {
            let value = value.to_str().ok()?;
            let token = value.strip_prefix(&prefix)?.split(';').next()?.trim();
            if token.is_empty() {
                None
            } else {
                Some(token.to_string())
            }
        })
}

pub fn set_cookie_headers(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(str::to_string))
        .collect()
}

pub async fn response_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json")
}

pub async fn response_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
