//! The service over a real TCP socket.

use std::time::Duration;

use tokio::net::TcpListener;

use user_service::lifecycle::{build_server, Shutdown};

mod common;

#[tokio::test]
async fn test_serves_over_tcp_and_shuts_down() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(&dir);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = build_server(config).unwrap();

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    let task = tokio::spawn(async move { server.run(listener, stop).await });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let base = format!("http://{}", addr);

    let res = client
        .post(format!("{}/api/users", base))
        .json(&serde_json::json!({ "name": "Ann", "email": "a@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    assert_eq!(
        res.headers()["content-type"],
        "application/json; charset=utf-8"
    );
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let res = client
        .get(format!("{}/api/users/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched, created);

    let res = client
        .request(reqwest::Method::OPTIONS, format!("{}/api/users", base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert!(res.text().await.unwrap().is_empty());

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("server stops after shutdown")
        .unwrap();
    assert!(result.is_ok());
}
