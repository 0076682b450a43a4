//! HTTP surface: two scoring routes plus liveness probes.
//!
//! Handlers are stateless per request; the only shared state is the
//! collaborator client and the configured reference body. Deterministic
//! scoring always completes — only malformed input turns a request away.

use crate::oracle::{Oracle, DEFAULT_API_URL, DEFAULT_MODEL};
use crate::report::{
    CompatibilityReport, CompatibilityRequest, EnhancedResponse, EnhancedVedicData,
};
use crate::{cast_chart, Chart, EngineError, ReferenceBody};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::env;
use std::sync::Arc;
use tracing::{info, warn};

// ---------------------------
// ## Configuration
// ---------------------------

fn env_str(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub reference_body: ReferenceBody,
}

impl Config {
    pub fn from_env() -> Self {
        let reference_body = match env_str("REFERENCE_BODY").as_deref() {
            Some("sun") | Some("Sun") | Some("SUN") => ReferenceBody::Sun,
            Some(other) if !other.eq_ignore_ascii_case("moon") => {
                warn!(value = other, "unknown REFERENCE_BODY, using moon");
                ReferenceBody::Moon
            }
            _ => ReferenceBody::Moon,
        };
        Config {
            port: env_u16("PORT", 5001),
            api_key: env_str("OPENAI_API_KEY"),
            api_url: env_str("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: env_str("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            reference_body,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub oracle: Arc<Oracle>,
    pub reference_body: ReferenceBody,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        AppState {
            oracle: Arc::new(Oracle::new(
                config.api_key.clone(),
                config.api_url.clone(),
                config.model.clone(),
            )),
            reference_body: config.reference_body,
        }
    }
}

// ---------------------------
// ## Router
// ---------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(status))
        .route("/api/compatibility", post(compatibility))
        .route("/api/compatibility/enhanced", post(enhanced_compatibility))
        .with_state(state)
}

async fn status() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "message": "Vedic Compatibility API v2.0 is running"
    }))
}

/// A partner whose chart could not be cast, mapped to the wire error.
fn partner_error(which: &str, error: &EngineError) -> Response {
    warn!(partner = which, %error, "birth chart computation failed");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": format!("Failed to calculate birth chart for {which}"),
            "details": error.to_string(),
        })),
    )
        .into_response()
}

fn bad_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Missing partner data"})),
    )
        .into_response()
}

/// Cast both charts or produce the 400 naming the failing partner.
fn cast_pair(
    request: &CompatibilityRequest,
    body: ReferenceBody,
) -> Result<(Chart, Chart), Response> {
    let p1 = &request.partner1;
    let chart1 = cast_chart(&p1.date, &p1.time, &p1.place, body)
        .map_err(|e| partner_error("partner1", &e))?;
    let p2 = &request.partner2;
    let chart2 = cast_chart(&p2.date, &p2.time, &p2.place, body)
        .map_err(|e| partner_error("partner2", &e))?;
    Ok((chart1, chart2))
}

async fn compatibility(
    State(state): State<AppState>,
    payload: Result<Json<CompatibilityRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return bad_request();
    };
    info!(route = "/api/compatibility", "request start");
    let (chart1, chart2) = match cast_pair(&request, state.reference_body) {
        Ok(pair) => pair,
        Err(response) => return response,
    };
    let report = CompatibilityReport::assemble(&chart1, &chart2);
    info!(
        route = "/api/compatibility",
        score = report.gun_milan_score,
        level = %report.compatibility_level,
        "request complete"
    );
    Json(report).into_response()
}

async fn enhanced_compatibility(
    State(state): State<AppState>,
    payload: Result<Json<CompatibilityRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return bad_request();
    };
    info!(route = "/api/compatibility/enhanced", "request start");
    let (chart1, chart2) = match cast_pair(&request, state.reference_body) {
        Ok(pair) => pair,
        Err(response) => return response,
    };
    let vedic_data = EnhancedVedicData {
        report: CompatibilityReport::assemble(&chart1, &chart2),
        partner1_details: request.partner1,
        partner2_details: request.partner2,
    };
    // The collaborator may fail; the deterministic data goes out either way.
    let enhanced_report = state.oracle.narrative_report(&vedic_data).await;
    Json(EnhancedResponse {
        vedic_data,
        enhanced_report,
    })
    .into_response()
}
