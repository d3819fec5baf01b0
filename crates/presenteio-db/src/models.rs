//! Database row types — these map directly to SQLite rows.
//! Distinct from presenteio-types API models to keep the DB layer independent.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Argon2 hash; None means the account can only log in via OTP.
    pub password: Option<String>,
    pub role: String,
    pub created_at: String,
}

pub struct GiftRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub purchase_links: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub struct VerificationCodeRow {
    pub id: String,
    pub phone: String,
    pub email: String,
    pub purpose: String,
    pub channel: String,
    pub code: String,
    pub attempts: u32,
    pub expires_at: String,
    pub used_at: Option<String>,
    pub created_at: String,
}

/// An anonymous-message row as the organizer inbox sees it (no reserver
/// identity attached).
pub struct InboxMessageRow {
    pub reservation_id: String,
    pub gift_title: String,
    pub message: String,
    pub seen: bool,
    pub created_at: String,
}

/// The moderation view carries the reserver identity as well.
pub struct ModerationMessageRow {
    pub reservation_id: String,
    pub gift_title: String,
    pub user_name: String,
    pub user_email: String,
    pub message: String,
    pub hidden: bool,
    pub created_at: String,
}

pub struct UserReservationRow {
    pub id: String,
    pub gift_id: String,
    pub gift_title: String,
    pub message: String,
    pub created_at: String,
}

/// Parse a timestamp column. SQLite's datetime('now') emits
/// "YYYY-MM-DD HH:MM:SS" without a timezone; treat it as UTC.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}
