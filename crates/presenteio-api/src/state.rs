use std::sync::Arc;

use presenteio_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: AppConfig,
}

/// The slice of server configuration the handlers need. Built once at
/// startup from the environment and carried in state — handlers never read
/// environment variables themselves.
#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    /// None disables the setup endpoint entirely.
    pub setup_token: Option<String>,
    pub otp_ttl_minutes: i64,
}
