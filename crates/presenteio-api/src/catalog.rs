use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;
use uuid::Uuid;

use presenteio_db::catalog::CatalogStats;
use presenteio_db::models::parse_timestamp;
use presenteio_types::api::{
    CatalogEntry, CatalogStatsResponse, Claims, MyReservation, MyReservationsResponse,
    SiteResponse,
};
use presenteio_types::models::parse_purchase_links;

use crate::error::ApiError;
use crate::state::AppState;

/// The gift listing every guest sees, annotated per viewer.
pub async fn catalog(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // Run blocking DB work off the async runtime
    let db = state.clone();
    let viewer = claims.sub;
    let items = tokio::task::spawn_blocking(move || db.db.list_catalog(Some(viewer)))
        .await
        .map_err(|e| ApiError::internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    let entries: Vec<CatalogEntry> = items
        .into_iter()
        .map(|item| {
            Ok(CatalogEntry {
                id: parse_uuid(&item.gift.id, "gift")?,
                title: item.gift.title,
                description: item.gift.description,
                images: item.images,
                purchase_links: parse_purchase_links(&item.gift.purchase_links),
                reserved: item.reserved,
                reserved_by_viewer: item.reserved_by_viewer,
            })
        })
        .collect::<Result<_, ApiError>>()?;

    Ok(Json(entries))
}

pub async fn my_reservations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let viewer = claims.sub;
    let rows = tokio::task::spawn_blocking(move || db.db.reservations_for_user(viewer))
        .await
        .map_err(|e| ApiError::internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    let reservations: Vec<MyReservation> = rows
        .into_iter()
        .map(|row| {
            Ok(MyReservation {
                reservation_id: parse_uuid(&row.id, "reservation")?,
                gift_id: parse_uuid(&row.gift_id, "gift")?,
                gift_title: row.gift_title,
                message: row.message,
                created_at: parse_timestamp(&row.created_at),
            })
        })
        .collect::<Result<_, ApiError>>()?;

    Ok(Json(MyReservationsResponse {
        count: reservations.len(),
        reservations,
    }))
}

/// Public branding-plus-stats overview, served without authentication.
pub async fn site_overview(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = state.db.load_site_settings()?;
    let stats = state.db.catalog_stats()?;

    let days_left = settings
        .event_date
        .map(|date| (date - Utc::now().date_naive()).num_days());

    Ok(Json(SiteResponse {
        settings,
        stats: stats_response(stats),
        days_left,
    }))
}

pub(crate) fn stats_response(stats: CatalogStats) -> CatalogStatsResponse {
    CatalogStatsResponse {
        total: stats.total,
        reserved: stats.reserved,
        available: stats.available,
        reserved_percent: stats.reserved_percent,
    }
}

/// Stored ids are written from `Uuid::to_string`, so a parse failure means
/// the row is corrupt and the request fails as a storage error.
pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::internal(anyhow::anyhow!("corrupt {} id '{}': {}", what, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_ids_parse() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string(), "gift").unwrap(), id);
    }

    #[test]
    fn corrupt_ids_surface_as_errors() {
        let err = parse_uuid("nao-e-um-uuid", "gift").err().unwrap();
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
