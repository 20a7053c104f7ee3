use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
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
        parking_session::AckResponse,
        vehicle::{CreateVehicleRequest, VehicleListResponse, VehicleResponse, VehicleView},
    },
    state::AppState,
    types::VehicleId,
};

fn parse_vehicle_id(raw: &str) -> Result<VehicleId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid vehicle id".into()))
}

pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<VehicleListResponse>, AppError> {
    let tz = state.config.time_zone;
    let vehicles = state.directory.list_vehicles(user.id).await?;
    let data: Vec<VehicleView> = vehicles
        .iter()
        .map(|vehicle| VehicleView::build(vehicle, &tz))
        .collect();

    Ok(Json(VehicleListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}

pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<CreateVehicleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VehicleResponse>), AppError> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let vehicle = state
        .directory
        .register_vehicle(user.id, payload, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(VehicleResponse {
            success: true,
            data: VehicleView::build(&vehicle, &state.config.time_zone),
        }),
    ))
}

pub async fn set_default_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<AckResponse>, AppError> {
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    state
        .directory
        .set_default_vehicle(user.id, vehicle_id)
        .await?;
    Ok(Json(AckResponse::ok("Default vehicle updated")))
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<AckResponse>, AppError> {
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    state.directory.remove_vehicle(user.id, vehicle_id).await?;
    Ok(Json(AckResponse::ok("Vehicle removed")))
}
