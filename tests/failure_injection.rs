//! Persistence faults surface as 500 envelopes without crashing the server.

use axum::http::StatusCode;

mod common;

use common::{spawn_app, spawn_app_with};

#[tokio::test]
async fn test_missing_table_is_internal_error() {
    let app = spawn_app_with(|config| config.database.initialize_schema = false);

    let res = app.get("/api/users").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = res.json()["error"].as_str().unwrap().to_string();
    assert!(message.starts_with("Internal Server Error: "), "{}", message);

    let res = app.post("/api/users", r#"{"name":"Ann","email":"a@x.com"}"#).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_database_removed_after_startup() {
    let app = spawn_app();
    app.create_user("Ann", "a@x.com").await;

    let db = std::path::PathBuf::from(&app.config.database.path);
    std::fs::remove_file(&db).unwrap();
    // A fresh empty file replaces it; the table is gone
    let res = app.get("/api/users").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);

    // Validation still happens before any storage work
    let res = app.post("/api/users", r#"{"name":"","email":"a@x.com"}"#).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unreachable_database_directory() {
    let app = spawn_app_with(|config| {
        config.database.initialize_schema = false;
        config.database.path = "/nonexistent-dir/for/tests/users.db".into();
    });
    let res = app.get("/api/users/1").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.json()["error"]
        .as_str()
        .unwrap()
        .contains("failed to acquire database connection"));
}
