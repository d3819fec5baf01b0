use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use presenteio_types::api::{Claims, ReserveRequest, ReserveResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// Claim a gift for the authenticated viewer. The exclusivity check happens
/// inside the store transaction; a losing racer gets 409 `already_reserved`.
pub async fn reserve(
    State(state): State<AppState>,
    Path(gift_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReserveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let viewer = claims.sub;
    let reservation_id =
        tokio::task::spawn_blocking(move || db.db.reserve(gift_id, viewer, &req.message))
            .await
            .map_err(|e| ApiError::internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    Ok((
        StatusCode::CREATED,
        Json(ReserveResponse { reservation_id }),
    ))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(gift_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let viewer = claims.sub;
    tokio::task::spawn_blocking(move || db.db.cancel(gift_id, viewer))
        .await
        .map_err(|e| ApiError::internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(StatusCode::NO_CONTENT)
}
