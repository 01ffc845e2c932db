//! Route handlers for the generation, health and metrics endpoints.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use super::identity::client_address;
use super::AppState;
use crate::error::GatewayError;
use crate::generator::GenerationRequest;
use crate::metrics;
use crate::prompts::ElementType;
use crate::rate_limit::Decision;

/// Body of `POST /api/generate`
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(rename = "type", default)]
    pub element: Option<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

/// Generation endpoint
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, GatewayError> {
    let body = read_body(body, state.max_image_bytes)?;
    let request: GenerateBody =
        serde_json::from_slice(&body).map_err(|e| GatewayError::InvalidBody(e.to_string()))?;

    let element: ElementType = request.element.as_deref().unwrap_or_default().parse()?;

    let image = request
        .image
        .filter(|image| image.starts_with("data:image"))
        .ok_or(GatewayError::MissingImage)?;
    if image.len() > state.max_image_bytes {
        return Err(too_large(state.max_image_bytes));
    }

    let address = client_address(&headers);
    let session = request.session_id.as_deref();

    let decision = state.gate.evaluate(&address, session);
    if !decision.allowed {
        let now_secs = state.clock.now_millis() / 1000;
        return Ok(rate_limited(&decision, now_secs));
    }

    let started = Instant::now();
    let result = state
        .generator
        .generate(GenerationRequest::portrait(image, element.generation_prompt()))
        .await;
    let elapsed = started.elapsed().as_secs_f64();

    let image_url = match result {
        Ok(Some(url)) => {
            metrics::GENERATION_DURATION_SECONDS
                .with_label_values(&["success"])
                .observe(elapsed);
            url
        }
        Ok(None) => {
            metrics::GENERATION_DURATION_SECONDS
                .with_label_values(&["empty"])
                .observe(elapsed);
            warn!(element = %element, "Generation returned no image");
            return Err(GatewayError::EmptyOutput);
        }
        Err(e) => {
            metrics::GENERATION_DURATION_SECONDS
                .with_label_values(&["error"])
                .observe(elapsed);
            error!(element = %element, error = %e, "Generation error");
            return Err(e.into());
        }
    };

    // Only successful generations count against quotas
    state.gate.record(&address, session);
    info!(element = %element, elapsed_secs = elapsed, "Generated image");

    Ok(Json(json!({
        "imageUrl": image_url,
        "type": element,
        "model": state.generator.model(),
    }))
    .into_response())
}

fn too_large(max_image_bytes: usize) -> GatewayError {
    GatewayError::ImageTooLarge(max_image_bytes.div_ceil(1024 * 1024))
}

/// Bodies past the router's length limit carry an oversized image
fn read_body(
    body: Result<Bytes, BytesRejection>,
    max_image_bytes: usize,
) -> Result<Bytes, GatewayError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large(max_image_bytes)
        } else {
            GatewayError::InvalidBody(rejection.body_text())
        }
    })
}

/// 429 response carrying the retry hint
pub fn rate_limited(decision: &Decision, now_secs: u64) -> Response {
    let retry_after = decision.retry_after_seconds.unwrap_or(60);
    let body = Json(json!({
        "error": decision.reason.as_deref().unwrap_or("Too many requests."),
        "retryAfterSeconds": retry_after,
    }));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    let headers = response.headers_mut();
    headers.insert("retry-after", HeaderValue::from(retry_after));
    headers.insert("x-ratelimit-reset", HeaderValue::from(now_secs + retry_after));
    response
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Response {
    let ready = state.generator.is_configured();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if ready { "ready" } else { "missing configuration" },
        "service": "PawForge",
        "checks": {
            "generator": if ready { "configured" } else { "missing REPLICATE_API_TOKEN" },
            "model": state.generator.model(),
        },
        "types": ElementType::ALL,
        "rateLimit": state.gate.snapshot(),
    });

    (status, Json(body)).into_response()
}

/// Metrics endpoint handler
pub async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error gathering metrics: {}", e),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::QuotaKind;

    #[test]
    fn test_rate_limited_headers() {
        let decision = Decision::denied(QuotaKind::SessionPerDay, 120);
        let response = rate_limited(&decision, 1_700_000_000);

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "120");
        assert_eq!(response.headers()["x-ratelimit-reset"], "1700000120");
    }

    #[test]
    fn test_body_field_names() {
        let body: GenerateBody = serde_json::from_str(
            r#"{"type":"fire","image":"data:image/png;base64,AA","sessionId":"abc"}"#,
        )
        .unwrap();
        assert_eq!(body.element.as_deref(), Some("fire"));
        assert_eq!(body.session_id.as_deref(), Some("abc"));

        let body: GenerateBody = serde_json::from_str("{}").unwrap();
        assert!(body.element.is_none() && body.image.is_none());
    }
}
