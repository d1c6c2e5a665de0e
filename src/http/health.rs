//! Proxy self-report at `GET /api/health`.

use axum::extract::State;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub message: &'static str,
    pub timestamp: String,
    pub environment: EnvironmentReport,
}

/// What the proxy knows about its upstream. The API key itself is never shown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentReport {
    pub api_base_url: Option<String>,
    pub has_api_key: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        message: "API proxy is working!",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        environment: EnvironmentReport {
            api_base_url: state.settings.base_url().ok().map(str::to_string),
            has_api_key: state.settings.has_api_key(),
        },
    })
}
