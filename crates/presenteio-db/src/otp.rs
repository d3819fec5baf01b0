//! Storage for one-time login/reset codes. Code generation, matching and
//! the attempt policy live in the API layer; this module only persists.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use presenteio_types::models::OtpChannel;

use crate::Database;
use crate::models::VerificationCodeRow;

pub const PURPOSE_LOGIN: &str = "login";
pub const PURPOSE_RESET_PASSWORD: &str = "reset_password";

/// Timestamp format comparable with SQLite's datetime('now').
fn sqlite_datetime(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

impl Database {
    pub fn insert_verification_code(
        &self,
        id: Uuid,
        phone: &str,
        email: &str,
        purpose: &str,
        channel: OtpChannel,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO verification_codes (id, phone, email, purpose, channel, code, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id.to_string(),
                    phone,
                    email,
                    purpose,
                    channel.as_str(),
                    code,
                    sqlite_datetime(expires_at)
                ],
            )?;
            Ok(())
        })
    }

    /// Most recent unused, unexpired code for the given contact and purpose.
    pub fn latest_active_code(
        &self,
        phone: &str,
        email: &str,
        purpose: &str,
    ) -> Result<Option<VerificationCodeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, phone, email, purpose, channel, code, attempts,
                        expires_at, used_at, created_at
                 FROM verification_codes
                 WHERE phone = ?1 AND email = ?2 AND purpose = ?3
                   AND used_at IS NULL AND expires_at > datetime('now')
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1",
            )?;

            let row = stmt
                .query_row(params![phone, email, purpose], |row| {
                    Ok(VerificationCodeRow {
                        id: row.get(0)?,
                        phone: row.get(1)?,
                        email: row.get(2)?,
                        purpose: row.get(3)?,
                        channel: row.get(4)?,
                        code: row.get(5)?,
                        attempts: row.get(6)?,
                        expires_at: row.get(7)?,
                        used_at: row.get(8)?,
                        created_at: row.get(9)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    /// Returns the new attempt count.
    pub fn bump_code_attempts(&self, id: &str) -> Result<u32> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE verification_codes SET attempts = attempts + 1 WHERE id = ?1",
                [id],
            )?;
            let attempts = conn.query_row(
                "SELECT attempts FROM verification_codes WHERE id = ?1",
                [id],
                |row| row.get(0),
            )?;
            Ok(attempts)
        })
    }

    pub fn mark_code_used(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE verification_codes SET used_at = datetime('now') WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn insert(db: &Database, phone: &str, code: &str, ttl_minutes: i64) -> Uuid {
        let id = Uuid::new_v4();
        db.insert_verification_code(
            id,
            phone,
            "",
            PURPOSE_LOGIN,
            OtpChannel::Sms,
            code,
            Utc::now() + Duration::minutes(ttl_minutes),
        )
        .unwrap();
        id
    }

    #[test]
    fn finds_latest_active_code() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, "+5511999990000", "111111", 10);
        let newest = insert(&db, "+5511999990000", "222222", 10);

        let found = db
            .latest_active_code("+5511999990000", "", PURPOSE_LOGIN)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, newest.to_string());
        assert_eq!(found.code, "222222");
    }

    #[test]
    fn expired_codes_are_ignored() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, "+5511999990000", "111111", -1);
        assert!(
            db.latest_active_code("+5511999990000", "", PURPOSE_LOGIN)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn used_codes_are_ignored() {
        let db = Database::open_in_memory().unwrap();
        let id = insert(&db, "+5511999990000", "111111", 10);
        db.mark_code_used(&id.to_string()).unwrap();
        assert!(
            db.latest_active_code("+5511999990000", "", PURPOSE_LOGIN)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn attempts_accumulate() {
        let db = Database::open_in_memory().unwrap();
        let id = insert(&db, "+5511999990000", "111111", 10);
        assert_eq!(db.bump_code_attempts(&id.to_string()).unwrap(), 1);
        assert_eq!(db.bump_code_attempts(&id.to_string()).unwrap(), 2);
    }
}
