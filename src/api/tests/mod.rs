use super::*;
use crate::fetcher::test_helpers::{ScriptedExtractor, create_test_fetcher};
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test VideoFetcher wrapped in Arc, plus its config
async fn create_test_app(
    extractor: ScriptedExtractor,
) -> (
    Arc<VideoFetcher>,
    Arc<Config>,
    Arc<ScriptedExtractor>,
    tempfile::TempDir,
) {
    let (fetcher, extractor, temp_dir) = create_test_fetcher(extractor).await;
    let config = fetcher.config().clone();
    (Arc::new(fetcher), config, extractor, temp_dir)
}

/// Same fetcher, with the config adjusted before the router is built
fn with_config(config: &Arc<Config>, adjust: impl FnOnce(&mut Config)) -> Arc<Config> {
    let mut config = (**config).clone();
    adjust(&mut config);
    Arc::new(config)
}

fn get(uri: &str) -> Request {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_serves_and_shuts_down() {
    let (fetcher, config, _extractor, _temp_dir) =
        create_test_app(ScriptedExtractor::default()).await;

    // Port 0 = OS assigns a free port
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(serve(listener, fetcher, config, async move {
        let _ = shutdown_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (fetcher, config, _extractor, _temp_dir) =
        create_test_app(ScriptedExtractor::default()).await;
    let config = with_config(&config, |c| {
        c.server.api.cors_enabled = true;
        c.server.api.cors_origins = vec!["*".to_string()];
    });

    let app = create_router(fetcher, config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (fetcher, config, _extractor, _temp_dir) =
        create_test_app(ScriptedExtractor::default()).await;
    let config = with_config(&config, |c| c.server.api.cors_enabled = false);

    let app = create_router(fetcher, config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_cors_specific_origins() {
    let (fetcher, config, _extractor, _temp_dir) =
        create_test_app(ScriptedExtractor::default()).await;
    // Unparseable origins are skipped rather than rejected
    let config = with_config(&config, |c| {
        c.server.api.cors_enabled = true;
        c.server.api.cors_origins = vec![
            "http://localhost:3000".to_string(),
            "not a header\u{7f}".to_string(),
        ];
    });
    let app = create_router(fetcher, config);

    let from_origin = |origin: &str| {
        Request::builder()
            .uri("/health")
            .header("Origin", origin)
            .body(Body::empty())
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(from_origin("http://localhost:3000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );

    let response = app
        .oneshot(from_origin("http://evil.example"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_authentication_with_api_key() {
    let (fetcher, config, _extractor, _temp_dir) =
        create_test_app(ScriptedExtractor::default()).await;
    let config = with_config(&config, |c| {
        c.server.api.api_key = Some("test-secret-key".to_string())
    });

    let app = create_router(fetcher, config);

    // Protected route without a key
    let response = app.clone().oneshot(get("/progress/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["code"], "unauthorized");

    // With the header the request reaches the handler (unknown task)
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/progress/abc")
                .header("X-Api-Key", "test-secret-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The query parameter works for plain navigation
    let response = app
        .clone()
        .oneshot(get("/file/abc?api_key=test-secret-key"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Wrong key
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/progress/abc")
                .header("X-Api-Key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The page and health stay public
    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (fetcher, config, _extractor, _temp_dir) =
        create_test_app(ScriptedExtractor::default()).await;
    let app = create_router(fetcher, config);

    let response = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
