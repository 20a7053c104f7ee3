use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::json_body,
    middleware::CurrentUser,
    models::{
        parking_session::{
            AckResponse, CurrentSessionResponse, ExtendSessionRequest, HistoryResponse,
            NavigationResponse, NavigationView, SessionResponse, StartSessionRequest,
        },
        HistoryQuery,
    },
    state::AppState,
    types::ParkingSessionId,
    utils::time::server_time,
};

fn parse_session_id(raw: &str) -> Result<ParkingSessionId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid session id".into()))
}

pub async fn start_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<StartSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let details = state
        .parking_sessions
        .start_session(user.id, payload, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            success: true,
            data: details.view(&state.config.time_zone),
        }),
    ))
}

pub async fn get_current_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<CurrentSessionResponse>, AppError> {
    let tz = state.config.time_zone;
    let current = state
        .parking_sessions
        .get_current_session(user.id, Utc::now())
        .await?;

    Ok(Json(CurrentSessionResponse {
        success: true,
        data: current.map(|details| details.view(&tz)),
        server_time: server_time(&tz),
    }))
}

pub async fn get_session_history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let page = state
        .parking_sessions
        .get_session_history(user.id, query.page_request())
        .await?;

    Ok(Json(HistoryResponse {
        success: true,
        data: page.items(&state.config.time_zone),
        total: page.total,
        page: page.page.page,
        page_size: page.page.page_size,
    }))
}

pub async fn refresh_navigation(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> Result<Json<NavigationResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let session = state
        .parking_sessions
        .refresh_navigation(user.id, session_id)
        .await?;

    Ok(Json(NavigationResponse {
        success: true,
        data: NavigationView::from(&session),
    }))
}

pub async fn pay_current_fee(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> Result<Json<AckResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let record = state
        .parking_sessions
        .pay_current_fee(user.id, session_id, Utc::now())
        .await?;

    Ok(Json(AckResponse::ok(format!(
        "Payment successful, total fee {:.2}",
        record.fee
    ))))
}

pub async fn extend_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(session_id): Path<String>,
    payload: Result<Json<ExtendSessionRequest>, JsonRejection>,
) -> Result<Json<AckResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let payload = json_body(payload)?;
    payload.validate()?;

    let extended = state
        .parking_sessions
        .extend_session(user.id, session_id, payload.minutes)
        .await?;

    let message = if extended {
        format!("Session extended by {} minutes", payload.minutes)
    } else {
        "Session has no pending billing to extend".to_string()
    };
    Ok(Json(AckResponse::ok(message)))
}
