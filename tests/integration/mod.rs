//! Integration tests for the QR service router.
//!
//! These drive the public router in-process with `tower::ServiceExt::oneshot`.
//! Run with: cargo test --test integration

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

use qr_api::api::{create_router, AppState};
use qr_api::config::{Config, ErrorStatusPolicy};

fn app_with(config: Config) -> Router {
    create_router(AppState::new(config).expect("valid config"))
}

fn app() -> Router {
    app_with(Config::default())
}

async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn png_dimensions(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png).unwrap();
    (img.width(), img.height())
}

fn assert_cors(response: &Response<Body>) {
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
}

#[tokio::test]
async fn status_endpoint_describes_the_service() {
    let response = get(app(), "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

    let body = body_json(response).await;
    assert_eq!(body["status"], "running");
    assert_eq!(body["message"], "QR Code API is operational");
    assert_eq!(body["developed_by"], "zerodev");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));

    let qr = &body["endpoints"]["qr_generator"];
    assert_eq!(qr["path"], "/api/qr");
    assert_eq!(qr["parameters"]["data"]["required"], true);
    assert_eq!(qr["parameters"]["size"]["default"], 300);
    assert_eq!(qr["parameters"]["size"]["max"], 2000);
    assert_eq!(qr["parameters"]["format"]["options"][1], "svg");
    assert_eq!(body["features"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn png_is_the_default_format() {
    let response = get(app(), "/api/qr?data=https://example.com").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );
    assert_eq!(headers["x-developed-by"], "zerodev");

    let bytes = body_bytes(response).await;
    assert!(!bytes.is_empty());
    let (w, h) = png_dimensions(&bytes);
    assert_eq!(w, h);
    // Default size keeps the native raster: whole modules plus border.
    assert_eq!(w % 10, 0);
}

#[tokio::test]
async fn size_resizes_png_exactly() {
    let response = get(app(), "/api/qr?data=Hello%20World&size=500").await;
    let bytes = body_bytes(response).await;
    assert_eq!(png_dimensions(&bytes), (500, 500));
}

#[tokio::test]
async fn oversized_request_is_clamped() {
    let response = get(app(), "/api/qr?data=x&size=5000").await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = body_bytes(response).await;
    assert_eq!(png_dimensions(&bytes), (2000, 2000));
}

#[tokio::test]
async fn svg_format_is_case_insensitive() {
    let response = get(app(), "/api/qr?data=Contact&format=SVG&fg=%23FF5733").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );

    let svg = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("#ff5733"));
}

#[tokio::test]
async fn unknown_format_falls_back_to_png() {
    let response = get(app(), "/api/qr?data=x&format=gif").await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn missing_data_is_a_json_error_at_200() {
    let response = get(app(), "/api/qr").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());

    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Missing required parameter"));
    assert_eq!(body["usage"]["endpoint"], "/api/qr");
    assert_eq!(body["usage"]["method"], "GET");
}

#[tokio::test]
async fn bad_color_is_a_json_error_not_a_crash() {
    let response = get(app(), "/api/qr?data=x&fg=notacolor").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "unknown color specifier: 'notacolor'");
    assert!(body.get("usage").is_none());
}

#[tokio::test]
async fn non_numeric_size_is_a_json_error() {
    let response = get(app(), "/api/qr?data=x&size=big").await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn identical_queries_yield_identical_bytes() {
    let uri = "/api/qr?data=repeatable&size=420&fg=darkgreen&bg=ivory";
    let first = body_bytes(get(app(), uri).await).await;
    let second = body_bytes(get(app(), uri).await).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn conventional_policy_uses_http_status_codes() {
    let config = Config {
        error_status_policy: ErrorStatusPolicy::Conventional,
        ..Config::default()
    };

    let response = get(app_with(config.clone()), "/api/qr").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);

    let long = "x".repeat(4000);
    let response = get(app_with(config), &format!("/api/qr?data={long}")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["status"], "error");
}

#[tokio::test]
async fn marker_header_follows_config() {
    let config = Config {
        developed_by: "acme".to_string(),
        ..Config::default()
    };
    let response = get(app_with(config), "/api/qr?data=x").await;
    assert_eq!(response.headers()["x-developed-by"], "acme");
}

#[tokio::test]
async fn blank_form_fields_use_defaults() {
    for uri in [
        "/api/qr?data=x&fg=",
        "/api/qr?data=x&bg=&fg=",
        "/api/qr?data=x&size=",
        "/api/qr?data=&data=hello",
    ] {
        let response = get(app(), uri).await;
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png", "{uri}");
    }

    let defaults = body_bytes(get(app(), "/api/qr?data=x").await).await;
    let blanks = body_bytes(get(app(), "/api/qr?data=x&fg=&bg=&size=&format=").await).await;
    assert_eq!(defaults, blanks);
}

#[tokio::test]
async fn huge_integer_size_is_clamped() {
    let response = get(app(), "/api/qr?data=x&size=99999999999999999999").await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = body_bytes(response).await;
    assert_eq!(png_dimensions(&bytes), (2000, 2000));
}
