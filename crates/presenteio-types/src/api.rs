use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{OtpChannel, PurchaseLink, Role};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and the auth handlers.
/// Canonical definition lives here in presenteio-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    /// Username, e-mail or phone number.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    /// `login` (default) or `reset_password`.
    #[serde(default = "default_purpose")]
    pub purpose: String,
}

fn default_purpose() -> String {
    "login".to_string()
}

#[derive(Debug, Serialize)]
pub struct OtpRequestResponse {
    pub channel: OtpChannel,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpVerifyRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub code: String,
    pub new_password: String,
}

// -- Setup --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupRequest {
    pub site_title: String,
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub primary_color: String,
    #[serde(default)]
    pub secondary_color: String,
    #[serde(default)]
    pub background_color: String,
    #[serde(default)]
    pub text_color: String,
    #[serde(default)]
    pub card_color: String,
    pub admin_phone: String,
    #[serde(default)]
    pub admin_email: String,
    /// Leave empty for an OTP-only organizer account.
    #[serde(default)]
    pub admin_password: String,
}

#[derive(Debug, Serialize)]
pub struct SetupResponse {
    pub organizer_id: Uuid,
}

// -- Catalog --

#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub purchase_links: Vec<PurchaseLink>,
    pub reserved: bool,
    pub reserved_by_viewer: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ReserveRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ReserveResponse {
    pub reservation_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MyReservation {
    pub reservation_id: Uuid,
    pub gift_id: Uuid,
    pub gift_title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MyReservationsResponse {
    pub count: usize,
    pub reservations: Vec<MyReservation>,
}

// -- Site overview & stats --

#[derive(Debug, Serialize)]
pub struct CatalogStatsResponse {
    pub total: u64,
    pub reserved: u64,
    pub available: u64,
    pub reserved_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSettingsBody {
    pub site_title: String,
    pub event_date: Option<NaiveDate>,
    pub primary_color: String,
    pub secondary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub card_color: String,
}

#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub settings: SiteSettingsBody,
    pub stats: CatalogStatsResponse,
    pub days_left: Option<i64>,
}

// -- Admin --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GiftUpsertRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Raw text, one `label | url` per line.
    #[serde(default)]
    pub purchase_links: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct AdminGift {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub purchase_links: String,
    pub is_active: bool,
    pub reserved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: CatalogStatsResponse,
    pub days_left: Option<i64>,
    pub gifts: Vec<DashboardGift>,
}

#[derive(Debug, Serialize)]
pub struct DashboardGift {
    pub id: Uuid,
    pub title: String,
    pub reserved: bool,
}

// -- Anonymous messages --

/// An anonymous note attached to a reservation, as shown to organizers.
/// Deliberately carries no reserver identity.
#[derive(Debug, Serialize)]
pub struct AnonymousMessage {
    pub reservation_id: Uuid,
    pub gift_title: String,
    pub message: String,
    pub seen: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessageInboxResponse {
    pub unseen: Vec<AnonymousMessage>,
    pub seen: Vec<AnonymousMessage>,
    pub unseen_count: usize,
    pub seen_count: usize,
}

// -- Moderation --

/// Moderators see the full picture, including who reserved what.
#[derive(Debug, Serialize)]
pub struct ModerationMessage {
    pub reservation_id: Uuid,
    pub gift_title: String,
    pub user_name: String,
    pub user_email: String,
    pub message: String,
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveReservationsRequest {
    pub user_id: Uuid,
    pub reservation_ids: Vec<Uuid>,
}
