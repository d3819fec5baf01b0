//! Reservation writes: the one place in the system with a real race
//! (two guests claiming the same gift at once). All mutation of the
//! reservations table goes through here.

use rusqlite::{OptionalExtension, TransactionBehavior, params};
use tracing::info;
use uuid::Uuid;

use crate::Database;
use crate::error::{CancelError, ReserveError};

/// Anonymous messages are silently clipped to this many characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

impl Database {
    /// Reserve a gift for a user.
    ///
    /// The existence check and the insert run inside one IMMEDIATE
    /// transaction, which takes SQLite's write lock up front. Two calls
    /// racing on the same gift therefore serialize: the first inserts, the
    /// second sees the row and gets `AlreadyReserved`. Without the shared
    /// transaction both could pass the check and double-book the gift; the
    /// UNIQUE constraint on reservations.gift_id backstops that case.
    pub fn reserve(
        &self,
        gift_id: Uuid,
        user_id: Uuid,
        message: &str,
    ) -> Result<Uuid, ReserveError> {
        let mut conn = self.lock().map_err(ReserveError::Storage)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let gid = gift_id.to_string();
        let is_active: Option<bool> = tx
            .query_row("SELECT is_active FROM gifts WHERE id = ?1", [&gid], |row| {
                row.get(0)
            })
            .optional()?;
        match is_active {
            None => return Err(ReserveError::NotFound),
            Some(false) => return Err(ReserveError::Inactive),
            Some(true) => {}
        }

        let taken: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE gift_id = ?1)",
            [&gid],
            |row| row.get(0),
        )?;
        if taken {
            return Err(ReserveError::AlreadyReserved);
        }

        let reservation_id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO reservations (id, gift_id, user_id, message) VALUES (?1, ?2, ?3, ?4)",
            params![
                reservation_id.to_string(),
                gid,
                user_id.to_string(),
                clip_message(message)
            ],
        )?;
        tx.commit()?;

        info!(gift = %gift_id, reservation = %reservation_id, "gift reserved");
        Ok(reservation_id)
    }

    /// Cancel a user's reservation of a gift. Scoped to the (gift, user)
    /// pair; a second cancel, or a cancel against someone else's
    /// reservation, yields `NotOwner`.
    pub fn cancel(&self, gift_id: Uuid, user_id: Uuid) -> Result<(), CancelError> {
        let mut conn = self.lock().map_err(CancelError::Storage)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let gid = gift_id.to_string();
        let is_active: Option<bool> = tx
            .query_row("SELECT is_active FROM gifts WHERE id = ?1", [&gid], |row| {
                row.get(0)
            })
            .optional()?;
        if !is_active.unwrap_or(false) {
            return Err(CancelError::NotFound);
        }

        let deleted = tx.execute(
            "DELETE FROM reservations WHERE gift_id = ?1 AND user_id = ?2",
            params![gid, user_id.to_string()],
        )?;
        if deleted == 0 {
            return Err(CancelError::NotOwner);
        }
        tx.commit()?;

        info!(gift = %gift_id, "reservation canceled");
        Ok(())
    }

    /// Advisory check used by the admin layer before editing or deleting a
    /// gift. Read-only; a cancel landing between this check and the
    /// mutation is benign, since the mutation only needs to avoid touching
    /// gifts that are genuinely reserved at the time of the user's intent.
    pub fn gift_is_reserved(&self, gift_id: Uuid) -> anyhow::Result<bool> {
        self.with_conn(|conn| {
            let reserved = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM reservations WHERE gift_id = ?1)",
                [gift_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(reserved)
        })
    }
}

fn clip_message(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= MAX_MESSAGE_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().take(MAX_MESSAGE_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database) -> Uuid {
        let id = Uuid::new_v4();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username) VALUES (?1, ?2)",
                params![id.to_string(), format!("guest-{}", id)],
            )?;
            Ok(())
        })
        .unwrap();
        id
    }

    fn seed_gift(db: &Database, active: bool) -> Uuid {
        let id = Uuid::new_v4();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO gifts (id, title, is_active) VALUES (?1, ?2, ?3)",
                params![id.to_string(), "Jogo de panelas", active],
            )?;
            Ok(())
        })
        .unwrap();
        id
    }

    fn reservation_count(db: &Database, gift: Uuid) -> i64 {
        db.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM reservations WHERE gift_id = ?1",
                [gift.to_string()],
                |row| row.get(0),
            )?;
            Ok(n)
        })
        .unwrap()
    }

    #[test]
    fn second_reserve_conflicts() {
        let db = test_db();
        let gift = seed_gift(&db, true);
        let (a, b) = (seed_user(&db), seed_user(&db));

        db.reserve(gift, a, "parabéns!").unwrap();
        let err = db.reserve(gift, b, "").unwrap_err();
        assert!(matches!(err, ReserveError::AlreadyReserved));
        assert_eq!(reservation_count(&db, gift), 1);
    }

    #[test]
    fn reserve_missing_gift_is_not_found() {
        let db = test_db();
        let user = seed_user(&db);
        let err = db.reserve(Uuid::new_v4(), user, "").unwrap_err();
        assert!(matches!(err, ReserveError::NotFound));
    }

    #[test]
    fn reserve_inactive_gift_is_rejected() {
        let db = test_db();
        let gift = seed_gift(&db, false);
        let user = seed_user(&db);

        let err = db.reserve(gift, user, "oi").unwrap_err();
        assert!(matches!(err, ReserveError::Inactive));
        assert_eq!(reservation_count(&db, gift), 0);
    }

    #[test]
    fn cancel_is_idempotent_via_not_owner() {
        let db = test_db();
        let gift = seed_gift(&db, true);
        let user = seed_user(&db);

        db.reserve(gift, user, "").unwrap();
        db.cancel(gift, user).unwrap();
        let err = db.cancel(gift, user).unwrap_err();
        assert!(matches!(err, CancelError::NotOwner));
    }

    #[test]
    fn cancel_by_non_owner_does_not_release() {
        let db = test_db();
        let gift = seed_gift(&db, true);
        let (a, b) = (seed_user(&db), seed_user(&db));

        db.reserve(gift, a, "").unwrap();
        let err = db.cancel(gift, b).unwrap_err();
        assert!(matches!(err, CancelError::NotOwner));
        assert_eq!(reservation_count(&db, gift), 1);
    }

    #[test]
    fn reserve_cancel_reserve_round_trip() {
        let db = test_db();
        let gift = seed_gift(&db, true);
        let (a, b) = (seed_user(&db), seed_user(&db));

        let first = db.reserve(gift, a, "").unwrap();
        db.cancel(gift, a).unwrap();
        let second = db.reserve(gift, b, "").unwrap();

        assert_ne!(first, second);
        assert_eq!(reservation_count(&db, gift), 1);
    }

    #[test]
    fn guard_reflects_reservation_state() {
        let db = test_db();
        let gift = seed_gift(&db, true);
        let user = seed_user(&db);

        assert!(!db.gift_is_reserved(gift).unwrap());
        db.reserve(gift, user, "").unwrap();
        assert!(db.gift_is_reserved(gift).unwrap());
        db.cancel(gift, user).unwrap();
        assert!(!db.gift_is_reserved(gift).unwrap());
    }

    #[test]
    fn message_is_trimmed_and_clipped() {
        let db = test_db();
        let gift = seed_gift(&db, true);
        let user = seed_user(&db);

        let long = format!("  {}  ", "a".repeat(MAX_MESSAGE_CHARS + 50));
        db.reserve(gift, user, &long).unwrap();

        let stored: String = db
            .with_conn(|conn| {
                let m = conn.query_row(
                    "SELECT message FROM reservations WHERE gift_id = ?1",
                    [gift.to_string()],
                    |row| row.get(0),
                )?;
                Ok(m)
            })
            .unwrap();
        assert_eq!(stored.chars().count(), MAX_MESSAGE_CHARS);
        assert!(!stored.starts_with(' '));
    }

    #[test]
    fn concurrent_reserves_have_exactly_one_winner() {
        let db = Arc::new(test_db());
        let gift = seed_gift(&db, true);
        let users: Vec<Uuid> = (0..8).map(|_| seed_user(&db)).collect();

        let handles: Vec<_> = users
            .into_iter()
            .map(|user| {
                let db = db.clone();
                std::thread::spawn(move || db.reserve(gift, user, ""))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(ReserveError::AlreadyReserved)))
            .count();

        assert_eq!(wins, 1);
        assert_eq!(conflicts, results.len() - 1);
        assert_eq!(reservation_count(&db, gift), 1);
    }
}
