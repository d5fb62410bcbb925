//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::sse::sse_stream;
use super::types::{
    BmiRequest, BmiResponse, BreathingResponse, CaloriesRequest, CaloriesResponse,
    CancelResponse, ChatRequest, ChatResponse, ConfigResponse, ErrorResponse,
    SleepHygieneResponse, TipsQuery, WaterRequest, WaterResponse,
};
use super::AppState;
use crate::runtime::{ChatSnapshot, SessionError};
use crate::wellness::{self, DailyTips, Profile, ProfileError};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_spa))
        .route("/assets/*path", get(serve_static))
        .route("/api/config", get(get_config))
        // Chat
        .route("/api/chat", get(get_chat).post(send_chat))
        .route("/api/chat/stream", get(stream_chat))
        .route("/api/chat/regenerate", post(regenerate))
        .route("/api/chat/cancel", post(cancel_chat))
        // Wellness panels
        .route("/api/profile", get(get_profile).put(save_profile))
        .route("/api/tips", get(get_tips))
        .route("/api/tools/bmi", post(calculate_bmi))
        .route("/api/tools/calories", post(calculate_calories))
        .route("/api/tools/water", post(calculate_water))
        .route("/api/tools/breathing", get(get_breathing))
        .route("/api/tools/sleep-hygiene", get(get_sleep_hygiene))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// SPA
// ============================================================

async fn serve_spa() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let processor = state.runtime.processor();
    Json(ConfigResponse {
        model: processor.model_id().to_string(),
        token_budget: processor.policy().budget,
        thread_id: state.thread_id.to_string(),
    })
}

// ============================================================
// Chat
// ============================================================

async fn get_chat(State(state): State<AppState>) -> Result<Json<ChatSnapshot>, AppError> {
    Ok(Json(state.runtime.snapshot(&state.thread_id).await?))
}

async fn stream_chat(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let (snapshot, broadcast_rx) = state.runtime.subscribe(&state.thread_id).await?;
    Ok(sse_stream(snapshot, broadcast_rx))
}

async fn send_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = payload?;
    state
        .runtime
        .send_message(&state.thread_id, req.text)
        .await?;
    Ok(Json(ChatResponse { queued: true }))
}

async fn regenerate(State(state): State<AppState>) -> Result<Json<ChatResponse>, AppError> {
    state.runtime.regenerate(&state.thread_id).await?;
    Ok(Json(ChatResponse { queued: true }))
}

async fn cancel_chat(State(state): State<AppState>) -> Result<Json<CancelResponse>, AppError> {
    let cancelled = state.runtime.cancel(&state.thread_id).await?;
    Ok(Json(CancelResponse {
        ok: true,
        cancelled,
    }))
}

// ============================================================
// Profile and tips
// ============================================================

async fn get_profile(State(state): State<AppState>) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.runtime.profile(&state.thread_id).await?))
}

async fn save_profile(
    State(state): State<AppState>,
    payload: Result<Json<Profile>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let Json(profile) = payload?;
    Ok(Json(
        state
            .runtime
            .save_profile(&state.thread_id, profile)
            .await?,
    ))
}

async fn get_tips(Query(query): Query<TipsQuery>) -> Json<DailyTips> {
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());
    Json(wellness::daily_tips(date))
}

// ============================================================
// Tools
// ============================================================

async fn calculate_bmi(
    payload: Result<Json<BmiRequest>, JsonRejection>,
) -> Result<Json<BmiResponse>, AppError> {
    let Json(req) = payload?;
    req.validate()?;
    Ok(Json(BmiResponse {
        bmi: wellness::bmi(req.height_cm, req.weight_kg),
    }))
}

async fn calculate_calories(
    payload: Result<Json<CaloriesRequest>, JsonRejection>,
) -> Result<Json<CaloriesResponse>, AppError> {
    let Json(req) = payload?;
    req.validate()?;
    Ok(Json(CaloriesResponse {
        bmr: wellness::bmr(req.weight_kg, req.height_cm, req.age, req.gender),
        calories: wellness::daily_calories(
            req.weight_kg,
            req.height_cm,
            req.age,
            req.gender,
            req.activity,
        ),
    }))
}

async fn calculate_water(
    payload: Result<Json<WaterRequest>, JsonRejection>,
) -> Result<Json<WaterResponse>, AppError> {
    let Json(req) = payload?;
    req.validate()?;
    Ok(Json(WaterResponse {
        liters_per_day: wellness::water_intake_liters(req.weight_kg),
    }))
}

async fn get_breathing() -> Json<BreathingResponse> {
    Json(BreathingResponse {
        pattern: "4-7-8",
        steps: wellness::breathing_schedule(),
    })
}

async fn get_sleep_hygiene() -> Json<SleepHygieneResponse> {
    Json(SleepHygieneResponse {
        items: wellness::SLEEP_HYGIENE_CHECKLIST.to_vec(),
    })
}

async fn get_version() -> &'static str {
    concat!("wellness-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Busy => AppError::Conflict(e.to_string()),
            SessionError::EmptyMessage
            | SessionError::NothingToRegenerate
            | SessionError::Profile(_) => AppError::BadRequest(e.to_string()),
            SessionError::Stopped(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<ProfileError> for AppError {
    fn from(e: ProfileError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
