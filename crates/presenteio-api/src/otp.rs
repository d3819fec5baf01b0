//! One-time-code login and password reset. Codes are generated and checked
//! here; actual SMS/e-mail delivery is handled out of band — the handler
//! only records which channel would carry the code.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use presenteio_db::Database;
use presenteio_db::models::UserRow;
use presenteio_db::otp::{PURPOSE_LOGIN, PURPOSE_RESET_PASSWORD};
use presenteio_types::api::{OtpRequest, OtpRequestResponse, OtpVerifyRequest, ResetPasswordRequest};
use presenteio_types::models::OtpChannel;

use crate::auth::{hash_password, issue_auth_response, validate_password};
use crate::error::ApiError;
use crate::state::AppState;

const CODE_LENGTH: usize = 6;
const MAX_CODE_ATTEMPTS: u32 = 5;

pub async fn request_code(
    State(state): State<AppState>,
    Json(req): Json<OtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let phone = normalize_phone(&req.phone);
    let email = req.email.trim().to_lowercase();
    if phone.is_empty() && email.is_empty() {
        return Err(ApiError::bad_request(
            "missing_contact",
            "informe telefone ou e-mail",
        ));
    }
    let purpose = match req.purpose.as_str() {
        PURPOSE_LOGIN => PURPOSE_LOGIN,
        PURPOSE_RESET_PASSWORD => PURPOSE_RESET_PASSWORD,
        other => {
            return Err(ApiError::bad_request(
                "invalid_purpose",
                format!("finalidade desconhecida: {}", other),
            ));
        }
    };

    // SMS when a phone is given, e-mail otherwise.
    let channel = if phone.is_empty() {
        OtpChannel::Email
    } else {
        OtpChannel::Sms
    };

    let code = generate_code(CODE_LENGTH);
    let expires_at = Utc::now() + Duration::minutes(state.config.otp_ttl_minutes);
    state.db.insert_verification_code(
        Uuid::new_v4(),
        &phone,
        &email,
        purpose,
        channel,
        &code,
        expires_at,
    )?;

    info!(channel = channel.as_str(), purpose, "verification code issued");
    debug!(code = %code, "verification code (delivery is out of band)");

    Ok(Json(OtpRequestResponse {
        channel,
        expires_at,
    }))
}

pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<OtpVerifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let phone = normalize_phone(&req.phone);
    let email = req.email.trim().to_lowercase();

    consume_code(&state.db, &phone, &email, PURPOSE_LOGIN, &req.code)?;
    let user = find_account(&state.db, &phone, &email)?;

    issue_auth_response(&state.config.jwt_secret, &user)
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&req.new_password)?;

    let phone = normalize_phone(&req.phone);
    let email = req.email.trim().to_lowercase();

    consume_code(&state.db, &phone, &email, PURPOSE_RESET_PASSWORD, &req.code)?;
    let user = find_account(&state.db, &phone, &email)?;

    let hash = hash_password(&req.new_password)?;
    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::internal(anyhow::anyhow!("corrupt user id '{}': {}", user.id, e)))?;
    state.db.set_password(user_id, &hash)?;

    info!(user = %user_id, "password reset via verification code");
    Ok(StatusCode::NO_CONTENT)
}

/// Validate and burn a code. All failure modes look the same to the caller,
/// which keeps code existence and attempt state unobservable.
fn consume_code(
    db: &Database,
    phone: &str,
    email: &str,
    purpose: &str,
    code: &str,
) -> Result<(), ApiError> {
    let invalid = || ApiError::unauthorized("invalid_code", "código inválido ou expirado");

    let row = db
        .latest_active_code(phone, email, purpose)?
        .ok_or_else(invalid)?;
    if row.attempts >= MAX_CODE_ATTEMPTS {
        return Err(invalid());
    }
    if row.code != code.trim() {
        db.bump_code_attempts(&row.id)?;
        return Err(invalid());
    }

    db.mark_code_used(&row.id)?;
    Ok(())
}

fn find_account(db: &Database, phone: &str, email: &str) -> Result<UserRow, ApiError> {
    let user = if !phone.is_empty() {
        db.get_user_by_phone(phone)?
    } else {
        db.get_user_by_email(email)?
    };
    user.ok_or_else(|| {
        ApiError::not_found("account_not_found", "nenhuma conta com este contato")
    })
}

/// Normalize a phone number to E.164, defaulting to Brazil (+55) for
/// 10/11-digit national numbers.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    if digits.starts_with("55") && digits.len() >= 12 {
        return format!("+{}", digits);
    }
    if digits.len() == 10 || digits.len() == 11 {
        return format!("+55{}", digits);
    }
    format!("+{}", digits)
}

pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}
