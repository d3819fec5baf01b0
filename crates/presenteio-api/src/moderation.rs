//! Moderator surface: the full message list (reserver identity included),
//! hide/show/clear controls, account password overrides, and bulk
//! reservation removal.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use presenteio_db::models::parse_timestamp;
use presenteio_types::api::{ModerationMessage, RemoveReservationsRequest, SetPasswordRequest};

use crate::auth::{hash_password, validate_password};
use crate::catalog::parse_uuid;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_messages(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let messages: Vec<ModerationMessage> = state
        .db
        .moderation_messages()?
        .into_iter()
        .map(|row| {
            Ok(ModerationMessage {
                reservation_id: parse_uuid(&row.reservation_id, "reservation")?,
                gift_title: row.gift_title,
                user_name: row.user_name,
                user_email: row.user_email,
                message: row.message,
                hidden: row.hidden,
                created_at: parse_timestamp(&row.created_at),
            })
        })
        .collect::<Result<_, ApiError>>()?;

    Ok(Json(messages))
}

/// Override a user's password. Guests who lost access to their contact
/// channels end up here via the moderator.
pub async fn set_user_password(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&req.new_password)?;

    let hash = hash_password(&req.new_password)?;
    if !state.db.set_password(user_id, &hash)? {
        return Err(ApiError::not_found("account_not_found", "conta não encontrada"));
    }

    info!(user = %user_id, "password overridden by moderator");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn hide_message(
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    set_hidden(&state, reservation_id, true)
}

pub async fn show_message(
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    set_hidden(&state, reservation_id, false)
}

/// Blank the message text for good; the reservation itself survives.
pub async fn clear_message(
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.clear_message(reservation_id)? {
        return Err(message_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct RemovedResponse {
    pub removed: usize,
}

pub async fn remove_reservations(
    State(state): State<AppState>,
    Json(req): Json<RemoveReservationsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ids: Vec<String> = req.reservation_ids.iter().map(|id| id.to_string()).collect();
    let removed = state.db.remove_reservations(req.user_id, &ids)?;
    Ok(Json(RemovedResponse { removed }))
}

fn set_hidden(
    state: &AppState,
    reservation_id: Uuid,
    hidden: bool,
) -> Result<StatusCode, ApiError> {
    if !state.db.set_message_hidden(reservation_id, hidden)? {
        return Err(message_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

fn message_not_found() -> ApiError {
    ApiError::not_found("message_not_found", "mensagem não encontrada")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use presenteio_db::Database;
    use presenteio_db::users::NewUser;
    use presenteio_types::models::Role;

    use crate::state::{AppConfig, AppStateInner};

    use super::*;

    fn test_state() -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            config: AppConfig {
                jwt_secret: "test-secret".to_string(),
                setup_token: None,
                otp_ttl_minutes: 10,
            },
        })
    }

    #[tokio::test]
    async fn moderator_override_sets_a_hash() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        state
            .db
            .create_user(
                user_id,
                &NewUser {
                    username: "bia",
                    full_name: "Bia",
                    email: "bia@example.com",
                    phone: None,
                    password_hash: None,
                    role: Role::Guest,
                },
            )
            .unwrap();

        let result = set_user_password(
            State(state.clone()),
            Path(user_id),
            Json(SetPasswordRequest {
                new_password: "senha-da-bia-nova".to_string(),
            }),
        )
        .await;
        assert!(result.is_ok());

        let user = state.db.get_user_by_id(user_id).unwrap().unwrap();
        assert!(user.password.is_some());
    }

    #[tokio::test]
    async fn override_for_unknown_user_is_not_found() {
        let state = test_state();
        let err = set_user_password(
            State(state),
            Path(Uuid::new_v4()),
            Json(SetPasswordRequest {
                new_password: "senha-suficiente".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "account_not_found");
    }
}
