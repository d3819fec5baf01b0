use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use presenteio_db::Database;
use presenteio_db::models::UserRow;
use presenteio_db::users::NewUser;
use presenteio_types::api::{
    AuthResponse, Claims, LoginRequest, RegisterRequest, SetPasswordRequest,
};
use presenteio_types::models::Role;

use crate::error::ApiError;
use crate::otp::normalize_phone;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let full_name = req.full_name.trim();
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("invalid_email", "informe um e-mail válido"));
    }
    validate_password(&req.password)?;

    if state.db.get_user_by_email(&email)?.is_some() {
        return Err(ApiError::conflict("email_taken", "e-mail já cadastrado"));
    }
    let phone = normalize_phone(&req.phone);
    if !phone.is_empty() && state.db.get_user_by_phone(&phone)?.is_some() {
        return Err(ApiError::conflict("phone_taken", "telefone já cadastrado"));
    }

    let username = unique_username_from_email(&state.db, &email)?;
    let password_hash = hash_password(&req.password)?;

    let user_id = Uuid::new_v4();
    state.db.create_user(
        user_id,
        &NewUser {
            username: &username,
            full_name,
            email: &email,
            phone: (!phone.is_empty()).then_some(phone.as_str()),
            password_hash: Some(&password_hash),
            role: Role::Guest,
        },
    )?;

    let display_name = if full_name.is_empty() { &username } else { full_name };
    let token = create_token(&state.config.jwt_secret, user_id, display_name, Role::Guest)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            name: display_name.to_string(),
            role: Role::Guest,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || ApiError::unauthorized("invalid_credentials", "credenciais inválidas");

    let user = find_by_identifier(&state.db, &req.identifier)?.ok_or_else(invalid)?;

    // Accounts created via OTP or setup may have no password at all.
    let stored_hash = user.password.as_deref().ok_or_else(invalid)?;
    let parsed_hash =
        PasswordHash::new(stored_hash).map_err(|e| ApiError::internal(anyhow::anyhow!(e)))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid())?;

    issue_auth_response(&state.config.jwt_secret, &user)
}

/// Set or replace the authenticated account's own password. Accounts created
/// through OTP login or setup start without one.
pub async fn set_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&req.new_password)?;

    let hash = hash_password(&req.new_password)?;
    if !state.db.set_password(claims.sub, &hash)? {
        return Err(ApiError::not_found("account_not_found", "conta não encontrada"));
    }

    info!(user = %claims.sub, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::bad_request(
            "weak_password",
            "a senha precisa de ao menos 8 caracteres",
        ));
    }
    Ok(())
}

/// Username first, then e-mail, then normalized phone.
fn find_by_identifier(db: &Database, identifier: &str) -> Result<Option<UserRow>, anyhow::Error> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Ok(None);
    }
    if let Some(user) = db.get_user_by_username(identifier)? {
        return Ok(Some(user));
    }
    if let Some(user) = db.get_user_by_email(&identifier.to_lowercase())? {
        return Ok(Some(user));
    }
    let phone = normalize_phone(identifier);
    if phone.is_empty() {
        return Ok(None);
    }
    db.get_user_by_phone(&phone)
}

pub(crate) fn issue_auth_response(
    secret: &str,
    user: &UserRow,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::internal(anyhow::anyhow!("corrupt user id '{}': {}", user.id, e)))?;
    let role = Role::parse(&user.role).unwrap_or(Role::Guest);
    let name = if user.full_name.is_empty() {
        &user.username
    } else {
        &user.full_name
    };

    let token = create_token(secret, user_id, name, role)?;
    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            user_id,
            name: name.to_string(),
            role,
            token,
        }),
    ))
}

pub(crate) fn create_token(
    secret: &str,
    user_id: Uuid,
    name: &str,
    role: Role,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        name: name.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(anyhow::anyhow!(e)))?
        .to_string();
    Ok(hash)
}

/// Derive a username from the e-mail, appending a numeric suffix on
/// collision.
pub(crate) fn unique_username_from_email(db: &Database, email: &str) -> anyhow::Result<String> {
    let base = {
        let trimmed = email.trim().to_lowercase();
        if trimmed.is_empty() { "convidado".to_string() } else { trimmed }
    };

    if !db.username_taken(&base)? {
        return Ok(base);
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !db.username_taken(&candidate)? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use jsonwebtoken::{DecodingKey, Validation, decode};

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

    fn claims_for(user_id: Uuid, role: Role) -> Claims {
        Claims {
            sub: user_id,
            name: "Ana".to_string(),
            role,
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        }
    }

    #[test]
    fn token_round_trips_role_and_subject() {
        let user_id = Uuid::new_v4();
        let token = create_token("test-secret", user_id, "Ana", Role::Organizer).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, user_id);
        assert_eq!(data.claims.role, Role::Organizer);
        assert_eq!(data.claims.name, "Ana");
    }

    #[test]
    fn username_collisions_get_suffixes() {
        let db = Database::open_in_memory().unwrap();
        let first = unique_username_from_email(&db, "ana@example.com").unwrap();
        assert_eq!(first, "ana@example.com");

        db.create_user(
            Uuid::new_v4(),
            &NewUser {
                username: &first,
                full_name: "",
                email: "ana@example.com",
                phone: None,
                password_hash: None,
                role: Role::Guest,
            },
        )
        .unwrap();

        let second = unique_username_from_email(&db, "ana@example.com").unwrap();
        assert_eq!(second, "ana@example.com-2");
    }

    #[test]
    fn empty_email_falls_back_to_default_base() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(unique_username_from_email(&db, "  ").unwrap(), "convidado");
    }

    #[tokio::test]
    async fn own_password_can_be_set_and_used_for_login() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        state
            .db
            .create_user(
                user_id,
                &NewUser {
                    username: "ana",
                    full_name: "Ana",
                    email: "ana@example.com",
                    phone: None,
                    password_hash: None,
                    role: Role::Guest,
                },
            )
            .unwrap();

        let result = set_password(
            State(state.clone()),
            Extension(claims_for(user_id, Role::Guest)),
            Json(SetPasswordRequest {
                new_password: "nova-senha-123".to_string(),
            }),
        )
        .await;
        assert!(result.is_ok());

        let login_result = login(
            State(state),
            Json(LoginRequest {
                identifier: "ana".to_string(),
                password: "nova-senha-123".to_string(),
            }),
        )
        .await;
        assert!(login_result.is_ok());
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let state = test_state();
        let err = set_password(
            State(state),
            Extension(claims_for(Uuid::new_v4(), Role::Guest)),
            Json(SetPasswordRequest {
                new_password: "curta".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "weak_password");
    }

    #[tokio::test]
    async fn set_password_for_unknown_account_is_not_found() {
        let state = test_state();
        let err = set_password(
            State(state),
            Extension(claims_for(Uuid::new_v4(), Role::Guest)),
            Json(SetPasswordRequest {
                new_password: "senha-suficiente".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correto-cavalo-bateria").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correto-cavalo-bateria", &parsed)
                .is_ok()
        );
        assert!(Argon2::default().verify_password(b"errada", &parsed).is_err());
    }
}
