//! Anonymous-message queries for the organizer inbox and the moderation
//! view. The inbox never selects reserver identity; moderation does.

use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use crate::Database;
use crate::models::{InboxMessageRow, ModerationMessageRow};

impl Database {
    /// Non-empty, non-hidden messages, newest first. Callers split on the
    /// `seen` flag.
    pub fn message_inbox(&self) -> Result<Vec<InboxMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, g.title, r.message, r.message_seen, r.created_at
                 FROM reservations r
                 JOIN gifts g ON g.id = r.gift_id
                 WHERE r.message != '' AND r.message_hidden = 0
                 ORDER BY r.created_at DESC, r.id DESC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(InboxMessageRow {
                        reservation_id: row.get(0)?,
                        gift_title: row.get(1)?,
                        message: row.get(2)?,
                        seen: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn mark_message_seen(&self, reservation_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE reservations SET message_seen = 1
                 WHERE id = ?1 AND message_hidden = 0",
                [reservation_id.to_string()],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn mark_all_messages_seen(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE reservations SET message_seen = 1
                 WHERE message != '' AND message_seen = 0 AND message_hidden = 0",
                [],
            )?;
            Ok(changed)
        })
    }

    /// Every non-empty message, hidden ones included, with the reserver.
    pub fn moderation_messages(&self) -> Result<Vec<ModerationMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, g.title, u.full_name, u.email, r.message,
                        r.message_hidden, r.created_at
                 FROM reservations r
                 JOIN gifts g ON g.id = r.gift_id
                 JOIN users u ON u.id = r.user_id
                 WHERE r.message != ''
                 ORDER BY r.created_at DESC, r.id DESC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(ModerationMessageRow {
                        reservation_id: row.get(0)?,
                        gift_title: row.get(1)?,
                        user_name: row.get(2)?,
                        user_email: row.get(3)?,
                        message: row.get(4)?,
                        hidden: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn set_message_hidden(&self, reservation_id: Uuid, hidden: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE reservations SET message_hidden = ?2 WHERE id = ?1",
                params![reservation_id.to_string(), hidden],
            )?;
            Ok(changed > 0)
        })
    }

    /// Blank the text and drop the message from the inbox; the reservation
    /// itself stays.
    pub fn clear_message(&self, reservation_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE reservations
                 SET message = '', message_hidden = 1, message_seen = 1
                 WHERE id = ?1",
                [reservation_id.to_string()],
            )?;
            Ok(changed > 0)
        })
    }

    /// Moderator bulk removal, scoped to one user so a stray id cannot
    /// delete someone else's reservation.
    pub fn remove_reservations(&self, user_id: Uuid, reservation_ids: &[String]) -> Result<usize> {
        if reservation_ids.is_empty() {
            return Ok(0);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (2..=reservation_ids.len() + 1).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "DELETE FROM reservations WHERE user_id = ?1 AND id IN ({})",
                placeholders.join(", ")
            );

            let uid = user_id.to_string();
            let mut params: Vec<&dyn rusqlite::types::ToSql> = vec![&uid];
            for id in reservation_ids {
                params.push(id);
            }

            let removed = conn.execute(&sql, params.as_slice())?;
            Ok(removed)
        })
    }
}
