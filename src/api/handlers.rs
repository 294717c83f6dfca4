//! HTTP API handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::warn;

use crate::config::{Config, ErrorStatusPolicy};
use crate::error::{AppError, QrError};
use crate::metrics;
use crate::qr::{self, QrImage, QrParams, DEFAULT_SIZE, MAX_SIZE};
use crate::utils::utc_timestamp;

/// Header naming who built the service.
pub static X_DEVELOPED_BY: HeaderName = HeaderName::from_static("x-developed-by");

/// Cache policy for images. The same query always yields the same bytes.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

const QR_PATH: &str = "/api/qr";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// `X-Developed-By` value, checked once at startup.
    developed_by: HeaderValue,
    /// Prometheus handle when a recorder is installed.
    prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let developed_by = HeaderValue::from_str(&config.developed_by).map_err(|_| {
            AppError::InvalidConfig("DEVELOPED_BY is not a valid header value".to_string())
        })?;

        Ok(Self {
            config: Arc::new(config),
            developed_by,
            prometheus: None,
        })
    }

    /// Expose `/metrics` through the given handle.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    fn error_status(&self, error: &QrError) -> StatusCode {
        match self.config.error_status_policy {
            ErrorStatusPolicy::AlwaysOk => StatusCode::OK,
            ErrorStatusPolicy::Conventional if error.is_client_error() => StatusCode::BAD_REQUEST,
            ErrorStatusPolicy::Conventional => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Service description returned by `GET /`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub endpoints: Endpoints,
    pub features: [&'static str; 6],
    pub developed_by: String,
    pub documentation: String,
    pub support: String,
}

/// Endpoint catalogue in the status response.
#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub qr_generator: EndpointDoc,
}

#[derive(Debug, Serialize)]
pub struct EndpointDoc {
    pub path: &'static str,
    pub method: &'static str,
    pub description: &'static str,
    pub parameters: ParameterDocs,
    pub example: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ParameterDocs {
    pub data: ParamDoc,
    pub size: ParamDoc,
    pub fg: ParamDoc,
    pub bg: ParamDoc,
    pub format: ParamDoc,
}

/// Documentation for one query parameter.
#[derive(Debug, Serialize)]
pub struct ParamDoc {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<[&'static str; 2]>,
    pub description: &'static str,
}

/// Body of every failed QR request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always "error".
    pub status: &'static str,
    pub error: String,
    pub timestamp: String,
    /// Present only when `data` was missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub developed_by: String,
}

/// How to call the QR endpoint.
#[derive(Debug, Serialize)]
pub struct Usage {
    pub endpoint: &'static str,
    pub method: &'static str,
    pub parameters: UsageParameters,
    pub examples: [&'static str; 3],
}

#[derive(Debug, Serialize)]
pub struct UsageParameters {
    pub data: &'static str,
    pub size: &'static str,
    pub fg: &'static str,
    pub bg: &'static str,
    pub format: &'static str,
}

impl Usage {
    fn qr() -> Self {
        Self {
            endpoint: QR_PATH,
            method: "GET",
            parameters: UsageParameters {
                data: "Required - Text or URL to encode",
                size: "Optional - Size in pixels (default: 300, max: 2000)",
                fg: "Optional - Foreground color (default: black)",
                bg: "Optional - Background color (default: white)",
                format: "Optional - png or svg (default: png)",
            },
            examples: [
                "/api/qr?data=https://example.com",
                "/api/qr?data=Hello%20World&size=400&fg=blue&bg=yellow",
                "/api/qr?data=Contact&format=svg&fg=%23FF5733",
            ],
        }
    }
}

fn param(kind: &'static str, description: &'static str) -> ParamDoc {
    ParamDoc {
        kind,
        required: false,
        default: None,
        max: None,
        options: None,
        description,
    }
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// CORS preflight: 200, no body. CORS headers are added by the router.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Status handler - describes the service and its endpoint.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let config = &state.config;

    Json(StatusResponse {
        status: "running",
        message: "QR Code API is operational",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: utc_timestamp(),
        endpoints: Endpoints {
            qr_generator: EndpointDoc {
                path: QR_PATH,
                method: "GET",
                description: "Generate QR codes with custom parameters",
                parameters: ParameterDocs {
                    data: ParamDoc {
                        required: true,
                        ..param("string", "Text or URL to encode")
                    },
                    size: ParamDoc {
                        default: Some(DEFAULT_SIZE.into()),
                        max: Some(MAX_SIZE),
                        ..param("integer", "QR code size in pixels")
                    },
                    fg: ParamDoc {
                        default: Some(qr::params::DEFAULT_FG.into()),
                        ..param("string", "Foreground color (name or hex)")
                    },
                    bg: ParamDoc {
                        default: Some(qr::params::DEFAULT_BG.into()),
                        ..param("string", "Background color (name or hex)")
                    },
                    format: ParamDoc {
                        default: Some("png".into()),
                        options: Some(["png", "svg"]),
                        ..param("string", "Output format")
                    },
                },
                example: "/api/qr?data=https://example.com&size=400&fg=blue&bg=yellow",
            },
        },
        features: [
            "CORS enabled for all origins",
            "Permanent QR codes with 1-year cache",
            "PNG and SVG format support",
            "Custom colors and sizes",
            "High error correction",
            "No rate limits",
        ],
        developed_by: config.developed_by.clone(),
        documentation: config.documentation_url.clone(),
        support: config.support_url.clone(),
    })
}

/// QR handler - renders the image described by the query string.
///
/// Failures never surface as image bytes; they become a JSON body whose
/// status code follows the configured [`ErrorStatusPolicy`].
pub async fn qr_code(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let start = Instant::now();

    let result = match QrParams::from_query(query.as_deref()) {
        Ok(params) => generate_off_runtime(params).await,
        Err(e) => Err(e),
    };

    let response = match result {
        Ok(image) => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(image.content_type())),
                (header::CACHE_CONTROL, HeaderValue::from_static(IMAGE_CACHE_CONTROL)),
                (X_DEVELOPED_BY.clone(), state.developed_by.clone()),
            ],
            image.bytes,
        )
            .into_response(),
        Err(error) => {
            // Generation errors are counted by the generator itself.
            if matches!(error, QrError::MissingData | QrError::InvalidSize(_)) {
                metrics::inc_errors(error.kind());
            }
            error_response(&state, error)
        }
    };

    metrics::record_http_latency(start, QR_PATH);
    response
}

/// Encoding and resizing are CPU-bound, so they run on the blocking pool.
async fn generate_off_runtime(params: QrParams) -> Result<QrImage, QrError> {
    tokio::task::spawn_blocking(move || {
        qr::generate(&params).inspect_err(|e| {
            warn!(error = %e, format = %params.format, "QR generation failed");
        })
    })
    .await
    .map_err(|e| QrError::Worker(e.to_string()))?
}

fn error_response(state: &AppState, error: QrError) -> Response {
    let usage = matches!(error, QrError::MissingData).then(Usage::qr);
    let body = ErrorResponse {
        status: "error",
        error: error.to_string(),
        timestamp: utc_timestamp(),
        usage,
        developed_by: state.config.developed_by.clone(),
    };

    (state.error_status(&error), Json(body)).into_response()
}

/// Prometheus exposition, 404 when no recorder is installed.
pub async fn metrics_text(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_follows_policy() {
        let state = AppState::new(Config::default()).unwrap();
        assert_eq!(state.error_status(&QrError::MissingData), StatusCode::OK);

        let state = AppState::new(Config {
            error_status_policy: ErrorStatusPolicy::Conventional,
            ..Config::default()
        })
        .unwrap();
        assert_eq!(
            state.error_status(&QrError::MissingData),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            state.error_status(&QrError::InvalidColor("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            state.error_status(&QrError::Encode(qrcode::types::QrError::DataTooLong)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn worker_failures_are_server_side() {
        let state = AppState::new(Config {
            error_status_policy: ErrorStatusPolicy::Conventional,
            ..Config::default()
        })
        .unwrap();
        assert_eq!(
            state.error_status(&QrError::Worker("task panicked".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn generation_runs_on_the_blocking_pool() {
        let image = generate_off_runtime(QrParams {
            size: 2000,
            fg: "navy".into(),
            ..QrParams::new("hello")
        })
        .await
        .unwrap();
        assert_eq!(image.content_type(), "image/png");

        let err = generate_off_runtime(QrParams {
            bg: "nope".into(),
            ..QrParams::new("hello")
        })
        .await
        .unwrap_err();
        assert!(matches!(err, QrError::InvalidColor(_)));
    }

    #[test]
    fn app_state_rejects_bad_marker() {
        let config = Config {
            developed_by: "bad\nvalue".to_string(),
            ..Config::default()
        };
        assert!(AppState::new(config).is_err());
    }

    #[test]
    fn missing_data_body_carries_usage() {
        let body = ErrorResponse {
            status: "error",
            error: QrError::MissingData.to_string(),
            timestamp: utc_timestamp(),
            usage: Some(Usage::qr()),
            developed_by: "zerodev".to_string(),
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["usage"]["endpoint"], "/api/qr");
        assert_eq!(value["usage"]["examples"].as_array().unwrap().len(), 3);
    }
}
