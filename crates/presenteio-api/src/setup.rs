//! One-time bootstrap of the first organizer account, gated by a secret
//! token from the environment. The endpoint 404s when the token is unset or
//! wrong, indistinguishable from a route that does not exist.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;
use uuid::Uuid;

use presenteio_db::users::NewUser;
use presenteio_types::api::{SetupRequest, SetupResponse};
use presenteio_types::models::Role;

use crate::auth::hash_password;
use crate::error::ApiError;
use crate::otp::normalize_phone;
use crate::state::AppState;

pub async fn setup(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<SetupRequest>,
) -> Result<(StatusCode, Json<SetupResponse>), ApiError> {
    let hidden = || ApiError::not_found("not_found", "not found");

    let expected = state
        .config
        .setup_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(hidden)?;
    if token != expected {
        return Err(hidden());
    }

    if state.db.organizer_exists()? {
        return Err(ApiError::conflict(
            "setup_complete",
            "o setup inicial já foi concluído",
        ));
    }

    let site_title = req.site_title.trim();
    if site_title.is_empty() {
        return Err(ApiError::bad_request("missing_title", "informe o título do site"));
    }
    let phone = normalize_phone(&req.admin_phone);
    if phone.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_phone",
            "informe o telefone do organizador",
        ));
    }
    if state.db.get_user_by_phone(&phone)?.is_some() {
        return Err(ApiError::conflict("phone_taken", "telefone já cadastrado"));
    }

    // Branding: empty color fields keep the seeded defaults.
    let mut settings = state.db.load_site_settings()?;
    settings.site_title = site_title.to_string();
    settings.event_date = req.event_date;
    for (current, submitted) in [
        (&mut settings.primary_color, &req.primary_color),
        (&mut settings.secondary_color, &req.secondary_color),
        (&mut settings.background_color, &req.background_color),
        (&mut settings.text_color, &req.text_color),
        (&mut settings.card_color, &req.card_color),
    ] {
        let submitted = submitted.trim();
        if !submitted.is_empty() {
            *current = submitted.to_string();
        }
    }
    state.db.update_site_settings(&settings)?;

    let password = req.admin_password.trim();
    let password_hash = if password.is_empty() {
        None
    } else {
        Some(hash_password(password)?)
    };

    let email = req.admin_email.trim().to_lowercase();
    let organizer_id = Uuid::new_v4();
    state.db.create_user(
        organizer_id,
        &NewUser {
            username: &phone,
            full_name: "",
            email: &email,
            phone: Some(&phone),
            password_hash: password_hash.as_deref(),
            role: Role::Organizer,
        },
    )?;

    info!(organizer = %organizer_id, "initial setup complete");
    Ok((StatusCode::CREATED, Json(SetupResponse { organizer_id })))
}
