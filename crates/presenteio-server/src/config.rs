use std::path::PathBuf;

/// Server configuration, read from the environment exactly once at startup.
/// Everything downstream receives this (or the `AppConfig` slice of it) by
/// reference; nothing else reads environment variables.
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    /// Gates the one-time setup endpoint; unset disables it.
    pub setup_token: Option<String>,
    pub otp_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("PRESENTEIO_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("PRESENTEIO_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()?;
        let db_path =
            PathBuf::from(std::env::var("PRESENTEIO_DB_PATH").unwrap_or_else(|_| "presenteio.db".into()));
        let jwt_secret = std::env::var("PRESENTEIO_JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-me".into());
        let setup_token = std::env::var("SETUP_TOKEN").ok().filter(|t| !t.is_empty());
        let otp_ttl_minutes: i64 = std::env::var("OTP_TTL_MINUTES")
            .unwrap_or_else(|_| "10".into())
            .parse()?;

        Ok(Self {
            host,
            port,
            db_path,
            jwt_secret,
            setup_token,
            otp_ttl_minutes,
        })
    }
}
