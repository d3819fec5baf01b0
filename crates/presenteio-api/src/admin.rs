//! Organizer panel: dashboard, gift CRUD, branding, anonymous-message
//! inbox. Structural edits and deletes of a gift are refused while a
//! reservation exists (advisory guard, see `registry::gift_is_reserved`).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use presenteio_db::gifts::GiftInput;
use presenteio_db::models::{GiftRow, InboxMessageRow, parse_timestamp};
use presenteio_types::api::{
    AdminGift, AnonymousMessage, DashboardGift, DashboardResponse, GiftUpsertRequest,
    MessageInboxResponse, SiteSettingsBody,
};

use crate::catalog::{parse_uuid, stats_response};
use crate::error::ApiError;
use crate::state::AppState;

// -- Dashboard --

pub async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.db.catalog_stats()?;
    let settings = state.db.load_site_settings()?;
    let days_left = settings
        .event_date
        .map(|date| (date - Utc::now().date_naive()).num_days());

    let gifts = state
        .db
        .list_gifts_admin()?
        .into_iter()
        .filter(|(gift, _, _)| gift.is_active)
        .map(|(gift, _, reserved)| {
            Ok(DashboardGift {
                id: parse_uuid(&gift.id, "gift")?,
                title: gift.title,
                reserved,
            })
        })
        .collect::<Result<_, ApiError>>()?;

    Ok(Json(DashboardResponse {
        stats: stats_response(stats),
        days_left,
        gifts,
    }))
}

// -- Gift CRUD --

pub async fn list_gifts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let gifts: Vec<AdminGift> = state
        .db
        .list_gifts_admin()?
        .into_iter()
        .map(|(gift, images, reserved)| admin_gift(gift, images, reserved))
        .collect::<Result<_, ApiError>>()?;
    Ok(Json(gifts))
}

pub async fn get_gift(
    State(state): State<AppState>,
    Path(gift_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (gift, images) = state
        .db
        .get_gift(gift_id)?
        .ok_or_else(gift_not_found)?;
    let reserved = state.db.gift_is_reserved(gift_id)?;
    Ok(Json(admin_gift(gift, images, reserved)?))
}

pub async fn create_gift(
    State(state): State<AppState>,
    Json(req): Json<GiftUpsertRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_gift(&req)?;
    let gift_id = Uuid::new_v4();
    state.db.create_gift(gift_id, &gift_input(&req))?;

    let (gift, images) = state
        .db
        .get_gift(gift_id)?
        .ok_or_else(|| ApiError::internal(anyhow::anyhow!("gift vanished after insert")))?;
    Ok((StatusCode::CREATED, Json(admin_gift(gift, images, false)?)))
}

pub async fn update_gift(
    State(state): State<AppState>,
    Path(gift_id): Path<Uuid>,
    Json(req): Json<GiftUpsertRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_gift(&req)?;
    if state.db.gift_is_reserved(gift_id)? {
        return Err(gift_reserved());
    }
    if !state.db.update_gift(gift_id, &gift_input(&req))? {
        return Err(gift_not_found());
    }

    let (gift, images) = state
        .db
        .get_gift(gift_id)?
        .ok_or_else(gift_not_found)?;
    Ok(Json(admin_gift(gift, images, false)?))
}

pub async fn delete_gift(
    State(state): State<AppState>,
    Path(gift_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.gift_is_reserved(gift_id)? {
        return Err(gift_reserved());
    }
    if !state.db.delete_gift(gift_id)? {
        return Err(gift_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

// -- Branding --

pub async fn get_settings(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.db.load_site_settings()?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(req): Json<SiteSettingsBody>,
) -> Result<impl IntoResponse, ApiError> {
    if req.site_title.trim().is_empty() {
        return Err(ApiError::bad_request("missing_title", "informe o título do site"));
    }
    state.db.update_site_settings(&req)?;
    Ok(Json(state.db.load_site_settings()?))
}

// -- Anonymous messages --

pub async fn message_inbox(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let messages: Vec<AnonymousMessage> = state
        .db
        .message_inbox()?
        .into_iter()
        .map(inbox_message)
        .collect::<Result<_, ApiError>>()?;
    let (seen, unseen): (Vec<_>, Vec<_>) = messages.into_iter().partition(|m| m.seen);

    Ok(Json(MessageInboxResponse {
        unseen_count: unseen.len(),
        seen_count: seen.len(),
        unseen,
        seen,
    }))
}

pub async fn mark_message_seen(
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.mark_message_seen(reservation_id)? {
        return Err(ApiError::not_found("message_not_found", "mensagem não encontrada"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_messages_seen(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.mark_all_messages_seen()?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Helpers --

fn gift_not_found() -> ApiError {
    ApiError::not_found("gift_not_found", "presente não encontrado")
}

fn gift_reserved() -> ApiError {
    ApiError::conflict(
        "gift_reserved",
        "este presente já foi reservado e não pode ser alterado",
    )
}

fn validate_gift(req: &GiftUpsertRequest) -> Result<(), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::bad_request("missing_title", "informe o título do presente"));
    }
    Ok(())
}

fn gift_input(req: &GiftUpsertRequest) -> GiftInput<'_> {
    GiftInput {
        title: req.title.trim(),
        description: &req.description,
        purchase_links: &req.purchase_links,
        is_active: req.is_active,
        images: &req.images,
    }
}

fn admin_gift(gift: GiftRow, images: Vec<String>, reserved: bool) -> Result<AdminGift, ApiError> {
    Ok(AdminGift {
        id: parse_uuid(&gift.id, "gift")?,
        title: gift.title,
        description: gift.description,
        images,
        purchase_links: gift.purchase_links,
        is_active: gift.is_active,
        reserved,
        created_at: parse_timestamp(&gift.created_at),
        updated_at: parse_timestamp(&gift.updated_at),
    })
}

fn inbox_message(row: InboxMessageRow) -> Result<AnonymousMessage, ApiError> {
    Ok(AnonymousMessage {
        reservation_id: parse_uuid(&row.reservation_id, "reservation")?,
        gift_title: row.gift_title,
        message: row.message,
        seen: row.seen,
        created_at: parse_timestamp(&row.created_at),
    })
}
