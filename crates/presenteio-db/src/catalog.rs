//! Read-side projections over gifts and reservations. Everything here is a
//! plain query; reservation conflicts are resolved at write time in
//! `registry`, so a slightly stale read is acceptable.

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;
use uuid::Uuid;

use crate::Database;
use crate::models::{GiftRow, UserReservationRow};

pub struct CatalogItem {
    pub gift: GiftRow,
    pub images: Vec<String>,
    pub reserved: bool,
    pub reserved_by_viewer: bool,
}

pub struct CatalogStats {
    pub total: u64,
    pub reserved: u64,
    pub available: u64,
    /// Rounded to one decimal place; 0.0 when the catalog is empty.
    pub reserved_percent: f64,
}

impl Database {
    /// List active gifts with their derived reservation flags.
    ///
    /// Both flags come from correlated EXISTS subqueries evaluated in the
    /// listing query itself — only booleans are needed, so no reservation
    /// rows are materialized and there is no per-gift follow-up query.
    pub fn list_catalog(&self, viewer: Option<Uuid>) -> Result<Vec<CatalogItem>> {
        self.with_conn(|conn| {
            // An absent viewer never matches any user_id.
            let viewer_id = viewer.map(|u| u.to_string()).unwrap_or_default();

            let mut stmt = conn.prepare(
                "SELECT g.id, g.title, g.description, g.purchase_links, g.is_active,
                        g.created_at, g.updated_at,
                        EXISTS(SELECT 1 FROM reservations r WHERE r.gift_id = g.id),
                        EXISTS(SELECT 1 FROM reservations r
                               WHERE r.gift_id = g.id AND r.user_id = ?1)
                 FROM gifts g
                 WHERE g.is_active = 1
                 ORDER BY g.title",
            )?;

            let mut items = stmt
                .query_map([viewer_id], |row| {
                    Ok(CatalogItem {
                        gift: GiftRow {
                            id: row.get(0)?,
                            title: row.get(1)?,
                            description: row.get(2)?,
                            purchase_links: row.get(3)?,
                            is_active: row.get(4)?,
                            created_at: row.get(5)?,
                            updated_at: row.get(6)?,
                        },
                        images: vec![],
                        reserved: row.get(7)?,
                        reserved_by_viewer: row.get(8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let ids: Vec<String> = items.iter().map(|i| i.gift.id.clone()).collect();
            let mut images = images_for_gifts(conn, &ids)?;
            for item in &mut items {
                if let Some(urls) = images.remove(&item.gift.id) {
                    item.images = urls;
                }
            }

            Ok(items)
        })
    }

    /// Aggregate counts for the dashboard and the public site header.
    pub fn catalog_stats(&self) -> Result<CatalogStats> {
        self.with_conn(|conn| {
            let total: u64 =
                conn.query_row("SELECT COUNT(*) FROM gifts WHERE is_active = 1", [], |row| {
                    row.get(0)
                })?;
            let reserved: u64 = conn.query_row(
                "SELECT COUNT(*) FROM reservations r
                 JOIN gifts g ON g.id = r.gift_id
                 WHERE g.is_active = 1",
                [],
                |row| row.get(0),
            )?;

            let reserved_percent = if total == 0 {
                0.0
            } else {
                ((reserved as f64 / total as f64) * 1000.0).round() / 10.0
            };

            Ok(CatalogStats {
                total,
                reserved,
                available: total - reserved,
                reserved_percent,
            })
        })
    }

    /// A viewer's own reservations, newest first.
    pub fn reservations_for_user(&self, user_id: Uuid) -> Result<Vec<UserReservationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.gift_id, g.title, r.message, r.created_at
                 FROM reservations r
                 JOIN gifts g ON g.id = r.gift_id
                 WHERE r.user_id = ?1
                 ORDER BY r.created_at DESC, r.id DESC",
            )?;

            let rows = stmt
                .query_map([user_id.to_string()], |row| {
                    Ok(UserReservationRow {
                        id: row.get(0)?,
                        gift_id: row.get(1)?,
                        gift_title: row.get(2)?,
                        message: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

/// Batch-fetch image URLs for a set of gifts, ordered by position.
pub(crate) fn images_for_gifts(
    conn: &Connection,
    gift_ids: &[String],
) -> Result<HashMap<String, Vec<String>>> {
    if gift_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=gift_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT gift_id, url FROM gift_images WHERE gift_id IN ({}) ORDER BY gift_id, position",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = gift_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (gift_id, url) = row?;
        map.entry(gift_id).or_default().push(url);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use rusqlite::params;

    use super::*;

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

    fn seed_gift(db: &Database, title: &str, active: bool) -> Uuid {
        let id = Uuid::new_v4();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO gifts (id, title, is_active) VALUES (?1, ?2, ?3)",
                params![id.to_string(), title, active],
            )?;
            Ok(())
        })
        .unwrap();
        id
    }

    #[test]
    fn flags_reflect_viewer_and_other_reservations() {
        let db = Database::open_in_memory().unwrap();
        let mine = seed_gift(&db, "Aparelho de jantar", true);
        let theirs = seed_gift(&db, "Cafeteira", true);
        let free = seed_gift(&db, "Tábua de corte", true);
        let (me, other) = (seed_user(&db), seed_user(&db));

        db.reserve(mine, me, "").unwrap();
        db.reserve(theirs, other, "").unwrap();

        let items = db.list_catalog(Some(me)).unwrap();
        assert_eq!(items.len(), 3);

        let by_id = |id: Uuid| {
            items
                .iter()
                .find(|i| i.gift.id == id.to_string())
                .unwrap()
        };
        assert!(by_id(mine).reserved && by_id(mine).reserved_by_viewer);
        assert!(by_id(theirs).reserved && !by_id(theirs).reserved_by_viewer);
        assert!(!by_id(free).reserved && !by_id(free).reserved_by_viewer);
    }

    #[test]
    fn anonymous_viewer_gets_no_viewer_flags() {
        let db = Database::open_in_memory().unwrap();
        let gift = seed_gift(&db, "Liquidificador", true);
        let user = seed_user(&db);
        db.reserve(gift, user, "").unwrap();

        let items = db.list_catalog(None).unwrap();
        assert!(items[0].reserved);
        assert!(!items[0].reserved_by_viewer);
    }

    #[test]
    fn inactive_gifts_are_excluded() {
        let db = Database::open_in_memory().unwrap();
        seed_gift(&db, "Panela de pressão", true);
        seed_gift(&db, "Item retirado", false);

        assert_eq!(db.list_catalog(None).unwrap().len(), 1);
    }

    #[test]
    fn stats_handle_empty_catalog() {
        let db = Database::open_in_memory().unwrap();
        let stats = db.catalog_stats().unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.reserved_percent, 0.0);
    }

    #[test]
    fn stats_round_to_one_decimal() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db);
        for i in 0..3 {
            seed_gift(&db, &format!("Presente {}", i), true);
        }
        let reserved = seed_gift(&db, "Reservado", true);
        db.reserve(reserved, user, "").unwrap();

        let stats = db.catalog_stats().unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.reserved, 1);
        assert_eq!(stats.available, 3);
        assert_eq!(stats.reserved_percent, 25.0);

        // 1 of 3 → 33.333…% rounds to 33.3
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db);
        let g = seed_gift(&db, "A", true);
        seed_gift(&db, "B", true);
        seed_gift(&db, "C", true);
        db.reserve(g, user, "").unwrap();
        assert_eq!(db.catalog_stats().unwrap().reserved_percent, 33.3);
    }

    #[test]
    fn user_reservations_include_gift_titles() {
        let db = Database::open_in_memory().unwrap();
        let gift = seed_gift(&db, "Jogo de copos", true);
        let user = seed_user(&db);
        db.reserve(gift, user, "felicidades").unwrap();

        let mine = db.reservations_for_user(user).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].gift_title, "Jogo de copos");
        assert_eq!(mine[0].message, "felicidades");
    }
}
