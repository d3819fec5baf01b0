mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use presenteio_api::middleware::{require_auth, require_moderator, require_organizer};
use presenteio_api::{AppConfig, AppState, AppStateInner, admin, auth, catalog, moderation, otp, reservations, setup};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PRESENTEIO_LOG")
                .unwrap_or_else(|_| "presenteio=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = presenteio_db::Database::open(&config.db_path)?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        config: AppConfig {
            jwt_secret: config.jwt_secret.clone(),
            setup_token: config.setup_token.clone(),
            otp_ttl_minutes: config.otp_ttl_minutes,
        },
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/otp/request", post(otp::request_code))
        .route("/auth/otp/verify", post(otp::verify_code))
        .route("/auth/password/reset", post(otp::reset_password))
        .route("/setup/{token}", post(setup::setup))
        .route("/site", get(catalog::site_overview));

    let guest_routes = Router::new()
        .route("/auth/password", post(auth::set_password))
        .route("/catalog", get(catalog::catalog))
        .route("/catalog/mine", get(catalog::my_reservations))
        .route("/gifts/{gift_id}/reserve", post(reservations::reserve))
        .route("/gifts/{gift_id}/cancel", post(reservations::cancel));

    let organizer_routes = Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/gifts", get(admin::list_gifts))
        .route("/admin/gifts", post(admin::create_gift))
        .route("/admin/gifts/{gift_id}", get(admin::get_gift))
        .route("/admin/gifts/{gift_id}", put(admin::update_gift))
        .route("/admin/gifts/{gift_id}", delete(admin::delete_gift))
        .route("/admin/settings", get(admin::get_settings))
        .route("/admin/settings", put(admin::update_settings))
        .route("/admin/messages", get(admin::message_inbox))
        .route("/admin/messages/{reservation_id}/seen", post(admin::mark_message_seen))
        .route("/admin/messages/seen-all", post(admin::mark_all_messages_seen))
        .layer(middleware::from_fn(require_organizer));

    let moderator_routes = Router::new()
        .route("/moderation/messages", get(moderation::list_messages))
        .route("/moderation/messages/{reservation_id}/hide", post(moderation::hide_message))
        .route("/moderation/messages/{reservation_id}/show", post(moderation::show_message))
        .route("/moderation/messages/{reservation_id}/clear", post(moderation::clear_message))
        .route("/moderation/reservations/remove", post(moderation::remove_reservations))
        .route("/moderation/users/{user_id}/password", post(moderation::set_user_password))
        .layer(middleware::from_fn(require_moderator));

    let protected_routes = Router::new()
        .merge(guest_routes)
        .merge(organizer_routes)
        .merge(moderator_routes)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Presenteio server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
