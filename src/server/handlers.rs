use axum::extract::{Query as QueryParams, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;
use tracing::info;

use crate::location::{
    LocationDetails, LocationError, Pending, PresetChoices, Query, Resolution, ResolvedLocation,
    UnresolvedReason,
};
use crate::tool::{self, WeatherReport};
use crate::transport::ProviderFailure;
use crate::weather::WeatherError;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

/// Returned with 300 when the caller has to pick before resolution can finish.
#[derive(Serialize)]
pub struct AmbiguousResponse {
    multiple: bool,
    query: String,
    #[serde(flatten)]
    pending: Pending,
}

pub enum ApiError {
    Status {
        status: StatusCode,
        message: String,
        reason: Option<&'static str>,
    },
    Ambiguous(AmbiguousResponse),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Status { status, message, reason } => {
                let body = ApiErrorBody {
                    error: message,
                    code: status.as_u16(),
                    reason,
                };
                (status, Json(body)).into_response()
            }
            Self::Ambiguous(body) => (StatusCode::MULTIPLE_CHOICES, Json(body)).into_response(),
        }
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError::Status {
        status,
        message: msg.into(),
        reason: None,
    }
}

fn join_error(err: JoinError) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn unresolved_error(query: &str, reason: &UnresolvedReason) -> ApiError {
    let status = match reason {
        UnresolvedReason::NotFound => StatusCode::NOT_FOUND,
        UnresolvedReason::Cancelled | UnresolvedReason::NoSelection => StatusCode::CONFLICT,
        UnresolvedReason::Provider(ProviderFailure::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        UnresolvedReason::MalformedData | UnresolvedReason::Provider(_) => StatusCode::BAD_GATEWAY,
    };
    ApiError::Status {
        status,
        message: format!("could not resolve '{}': {}", query, reason),
        reason: Some(reason.code()),
    }
}

impl From<LocationError> for ApiError {
    fn from(err: LocationError) -> Self {
        let status = match &err {
            LocationError::InvalidInput => StatusCode::BAD_REQUEST,
            LocationError::NotFound(_) => StatusCode::NOT_FOUND,
            LocationError::Provider(_) | LocationError::MalformedData(_) => StatusCode::BAD_GATEWAY,
        };
        api_error(status, err.to_string())
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        let status = match &err {
            WeatherError::InvalidRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            WeatherError::Provider(_) => StatusCode::BAD_GATEWAY,
        };
        api_error(status, err.to_string())
    }
}

// ─── Resolution from form parameters ─────────────────────────────

#[derive(Deserialize, Default)]
pub struct ResolveParams {
    pub query: Option<String>,
    pub country: Option<String>,
    /// Answer to the country question.
    pub pick_country: Option<String>,
    /// One-based answer to the place question.
    pub pick: Option<usize>,
    #[serde(default)]
    pub forecast: bool,
}

async fn resolve_params(state: &Arc<AppState>, params: &ResolveParams) -> Result<ResolvedLocation, ApiError> {
    let query = Query::new(params.query.as_deref().unwrap_or(""))?
        .with_country(params.country.as_deref());
    let text = query.text().to_string();
    let mut choices = PresetChoices::new(params.pick_country.clone(), params.pick);

    let state = Arc::clone(state);
    let (resolution, pending) = tokio::task::spawn_blocking(move || {
        let resolution = state.tool.resolver().resolve(&query, &mut choices);
        (resolution, choices.into_pending())
    })
    .await
    .map_err(join_error)?;

    match (resolution, pending) {
        (Resolution::Resolved(location), _) => Ok(location),
        (Resolution::Unresolved(UnresolvedReason::Cancelled), Some(pending)) => {
            Err(ApiError::Ambiguous(AmbiguousResponse {
                multiple: true,
                query: text,
                pending,
            }))
        }
        (Resolution::Unresolved(reason), _) => Err(unresolved_error(&text, &reason)),
    }
}

// ─── GET /api/resolve ────────────────────────────────────────────

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ResolveParams>,
) -> Result<Json<ResolvedLocation>, ApiError> {
    let start = Instant::now();
    let location = resolve_params(&state, &params).await?;

    info!(
        query = params.query.as_deref().unwrap_or(""),
        display_name = %location.display_name,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/resolve"
    );
    Ok(Json(location))
}

// ─── GET /api/details ────────────────────────────────────────────

pub async fn details(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ResolveParams>,
) -> Result<Json<LocationDetails>, ApiError> {
    let location = resolve_params(&state, &params).await?;
    let details = tokio::task::spawn_blocking(move || state.tool.resolver().details(&location))
        .await
        .map_err(join_error)??;
    Ok(Json(details))
}

// ─── GET /api/weather ────────────────────────────────────────────

pub async fn weather(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ResolveParams>,
) -> Result<Json<WeatherReport>, ApiError> {
    let start = Instant::now();
    let location = resolve_params(&state, &params).await?;

    let forecast = params.forecast;
    let (lat, lon) = (location.latitude, location.longitude);
    let fetch_state = Arc::clone(&state);
    let weather = tokio::task::spawn_blocking(move || fetch_state.tool.weather().fetch(lat, lon, forecast))
        .await
        .map_err(join_error)??;

    info!(
        query = params.query.as_deref().unwrap_or(""),
        display_name = %location.display_name,
        forecast,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/weather"
    );
    Ok(Json(WeatherReport { location, weather }))
}

// ─── /api/tool ───────────────────────────────────────────────────

pub async fn tool_definition() -> Json<Value> {
    Json(tool::definition())
}

/// Run a tool call without a human; ambiguity is reported under `pending`.
pub async fn tool_call(
    State(state): State<Arc<AppState>>,
    Json(args): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let output = tokio::task::spawn_blocking(move || {
        let mut choices = PresetChoices::default();
        let mut output = state.tool.invoke(&args, &mut choices);
        if let Some(pending) = choices.into_pending() {
            output["pending"] = serde_json::to_value(pending).unwrap_or(Value::Null);
        }
        output
    })
    .await
    .map_err(join_error)?;
    Ok(Json(output))
}
