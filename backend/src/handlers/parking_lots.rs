use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppError,
    models::parking_lot::{ParkingLotResponse, ParkingLotView},
    state::AppState,
    types::ParkingLotId,
};

pub async fn get_parking_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<String>,
) -> Result<Json<ParkingLotResponse>, AppError> {
    let lot_id: ParkingLotId = lot_id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid parking lot id".into()))?;
    let lot = state.directory.parking_lot(lot_id).await?;

    Ok(Json(ParkingLotResponse {
        success: true,
        data: ParkingLotView::from(lot),
    }))
}
