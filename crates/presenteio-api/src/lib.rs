pub mod admin;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod middleware;
pub mod moderation;
pub mod otp;
pub mod reservations;
pub mod setup;
pub mod state;

pub use state::{AppConfig, AppState, AppStateInner};
