//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use user_service::config::AppConfig;
use user_service::lifecycle::build_server;

/// A fully wired service over a throwaway SQLite file.
pub struct TestApp {
    pub router: Router,
    pub config: AppConfig,
    _dir: TempDir,
}

/// Response pieces the tests assert on.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or_else(|e| panic!("invalid JSON {:?}: {}", self.body, e))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Config pointing at a fresh database inside `dir`.
pub fn test_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.database.path = dir.path().join("test.db").to_string_lossy().into_owned();
    config
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(|_| {})
}

/// Build the app after letting the caller adjust the config.
pub fn spawn_app_with(adjust: impl FnOnce(&mut AppConfig)) -> TestApp {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut config = test_config(&dir);
    adjust(&mut config);
    let server = build_server(config.clone()).expect("server builds");
    TestApp {
        router: server.router(),
        config,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(&self, method: Method, path: &str, body: &str) -> TestResponse {
        self.send_with_headers(method, path, body, &[]).await
    }

    pub async fn send_with_headers(
        &self,
        method: Method,
        path: &str,
        body: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .expect("request builds");

        let response = self.router.clone().oneshot(request).await.expect("infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).expect("utf-8 body"),
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path, "").await
    }

    pub async fn post(&self, path: &str, body: &str) -> TestResponse {
        self.send(Method::POST, path, body).await
    }

    /// Create a user and return its assigned id.
    pub async fn create_user(&self, name: &str, email: &str) -> i64 {
        let body = serde_json::json!({ "name": name, "email": email }).to_string();
        let res = self.post("/api/users", &body).await;
        assert_eq!(res.status, StatusCode::CREATED, "create failed: {}", res.body);
        res.json()["id"].as_i64().expect("numeric id")
    }
}
