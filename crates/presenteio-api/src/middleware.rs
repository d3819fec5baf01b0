use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use presenteio_types::api::Claims;
use presenteio_types::models::Role;

use crate::state::AppState;

/// Extract and validate the JWT from the Authorization header. The claims
/// (including the role) travel as a request extension from here on.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Layered after `require_auth`: the organizer panel.
pub async fn require_organizer(req: Request, next: Next) -> Result<Response, StatusCode> {
    require_role(req, next, Role::Organizer).await
}

/// Layered after `require_auth`: the moderation surface.
pub async fn require_moderator(req: Request, next: Next) -> Result<Response, StatusCode> {
    require_role(req, next, Role::Moderator).await
}

async fn require_role(req: Request, next: Next, role: Role) -> Result<Response, StatusCode> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if claims.role != role {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(next.run(req).await)
}
