use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use geoextract_core::{Gazetteer, Location, Pipeline};
use geoextract_web::config::ServerConfig;
use geoextract_web::state::AppState;
use tower::ServiceExt;

const BOUNDARY: &str = "geoextract-test-boundary";

fn app_with(config: &ServerConfig) -> Router {
    let gazetteer = Gazetteer::new(vec![
        Location::new("Konzerthaus")
            .with_attribute("street", "Festplatz")
            .with_attribute("house_number", "9"),
        Location::new("Festplatz").with_kind("street"),
    ]);
    let pipeline = Pipeline::builder()
        .extractor(geoextract_core::NameExtractor::default())
        .build(Arc::new(gazetteer))
        .unwrap();
    geoextract_web::app(AppState::new(pipeline), config)
}

fn app() -> Router {
    app_with(&ServerConfig::default())
}

fn multipart(field: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"input.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/extract")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn index_reports_version() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        format!("GeoExtract {}", env!("CARGO_PKG_VERSION"))
    );
}

#[tokio::test]
async fn extract_returns_records() {
    let response = app()
        .oneshot(multipart("text", "Konzert im Konzerthaus".as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"name": "Konzerthaus", "street": "Festplatz", "house_number": "9"}
        ])
    );
}

#[tokio::test]
async fn extract_without_matches_is_empty() {
    let response = app()
        .oneshot(multipart("text", b"nothing here"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "[]");
}

#[tokio::test]
async fn extract_missing_text_field() {
    let response = app()
        .oneshot(multipart("document", b"Konzerthaus"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Missing \"text\" parameter.");
}

#[tokio::test]
async fn extract_without_multipart_body() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/extract")
        .body(Body::from("Konzerthaus"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Missing \"text\" parameter.");
}

#[tokio::test]
async fn extract_rejects_invalid_utf8() {
    let response = app()
        .oneshot(multipart("text", &[0x4b, 0xff, 0xfe, 0x6f]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_text(response).await,
        "Decoding error. Data must be encoded as UTF-8."
    );
}

#[tokio::test]
async fn extract_requires_post() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/extract")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn extract_rejects_large_bodies() {
    let config = ServerConfig {
        max_body: 256,
        ..ServerConfig::default()
    };
    let text = "Konzerthaus ".repeat(100);
    let response = app_with(&config)
        .oneshot(multipart("text", text.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
