//! Organizer-facing gift CRUD. Callers are expected to consult
//! `gift_is_reserved` before update/delete; these queries do not re-check.

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::Database;
use crate::catalog::images_for_gifts;
use crate::models::GiftRow;

pub struct GiftInput<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub purchase_links: &'a str,
    pub is_active: bool,
    pub images: &'a [String],
}

impl Database {
    pub fn create_gift(&self, id: Uuid, input: &GiftInput<'_>) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO gifts (id, title, description, purchase_links, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.to_string(),
                    input.title,
                    input.description,
                    input.purchase_links,
                    input.is_active
                ],
            )?;
            insert_images(&tx, &id.to_string(), input.images)?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Returns false when the gift does not exist.
    pub fn update_gift(&self, id: Uuid, input: &GiftInput<'_>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let gid = id.to_string();
            let changed = tx.execute(
                "UPDATE gifts
                 SET title = ?2, description = ?3, purchase_links = ?4, is_active = ?5,
                     updated_at = datetime('now')
                 WHERE id = ?1",
                params![
                    gid,
                    input.title,
                    input.description,
                    input.purchase_links,
                    input.is_active
                ],
            )?;
            if changed == 0 {
                return Ok(false);
            }
            tx.execute("DELETE FROM gift_images WHERE gift_id = ?1", [&gid])?;
            insert_images(&tx, &gid, input.images)?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// Cascade removes the gift's images and reservation, if any.
    pub fn delete_gift(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM gifts WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }

    pub fn get_gift(&self, id: Uuid) -> Result<Option<(GiftRow, Vec<String>)>> {
        self.with_conn(|conn| {
            let gid = id.to_string();
            let row = conn
                .query_row(
                    "SELECT id, title, description, purchase_links, is_active, created_at, updated_at
                     FROM gifts WHERE id = ?1",
                    [&gid],
                    map_gift_row,
                )
                .optional()?;

            match row {
                Some(gift) => {
                    let mut images = images_for_gifts(conn, std::slice::from_ref(&gid))?;
                    Ok(Some((gift, images.remove(&gid).unwrap_or_default())))
                }
                None => Ok(None),
            }
        })
    }

    /// All gifts (active or not) with their reserved flag and images,
    /// newest first. Used by the admin listing.
    pub fn list_gifts_admin(&self) -> Result<Vec<(GiftRow, Vec<String>, bool)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT g.id, g.title, g.description, g.purchase_links, g.is_active,
                        g.created_at, g.updated_at,
                        EXISTS(SELECT 1 FROM reservations r WHERE r.gift_id = g.id)
                 FROM gifts g
                 ORDER BY g.created_at DESC, g.id DESC",
            )?;

            let rows = stmt
                .query_map([], |row| Ok((map_gift_row(row)?, row.get::<_, bool>(7)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let ids: Vec<String> = rows.iter().map(|(g, _)| g.id.clone()).collect();
            let mut images = images_for_gifts(conn, &ids)?;

            Ok(rows
                .into_iter()
                .map(|(gift, reserved)| {
                    let urls = images.remove(&gift.id).unwrap_or_default();
                    (gift, urls, reserved)
                })
                .collect())
        })
    }
}

fn map_gift_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GiftRow> {
    Ok(GiftRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        purchase_links: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn insert_images(conn: &Connection, gift_id: &str, images: &[String]) -> Result<()> {
    for (position, url) in images.iter().enumerate() {
        conn.execute(
            "INSERT INTO gift_images (gift_id, position, url) VALUES (?1, ?2, ?3)",
            params![gift_id, position as i64, url],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gift_input<'a>(title: &'a str, images: &'a [String]) -> GiftInput<'a> {
        GiftInput {
            title,
            description: "",
            purchase_links: "",
            is_active: true,
            images,
        }
    }

    #[test]
    fn create_and_fetch_with_images() {
        let db = Database::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        let images = vec!["/media/a.jpg".to_string(), "/media/b.jpg".to_string()];
        db.create_gift(id, &gift_input("Faqueiro", &images)).unwrap();

        let (gift, fetched) = db.get_gift(id).unwrap().unwrap();
        assert_eq!(gift.title, "Faqueiro");
        assert_eq!(fetched, images);
    }

    #[test]
    fn update_replaces_images() {
        let db = Database::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        db.create_gift(id, &gift_input("Forma", &["/media/old.jpg".to_string()]))
            .unwrap();

        let replacement = vec!["/media/new.jpg".to_string()];
        assert!(db.update_gift(id, &gift_input("Forma grande", &replacement)).unwrap());

        let (gift, images) = db.get_gift(id).unwrap().unwrap();
        assert_eq!(gift.title, "Forma grande");
        assert_eq!(images, replacement);
    }

    #[test]
    fn update_missing_gift_reports_false() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.update_gift(Uuid::new_v4(), &gift_input("x", &[])).unwrap());
    }

    #[test]
    fn delete_cascades_to_reservation() {
        let db = Database::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        db.create_gift(id, &gift_input("Jarra", &[])).unwrap();

        let user = Uuid::new_v4();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username) VALUES (?1, 'guest')",
                [user.to_string()],
            )?;
            Ok(())
        })
        .unwrap();
        db.reserve(id, user, "").unwrap();

        assert!(db.delete_gift(id).unwrap());
        let orphans: i64 = db
            .with_conn(|conn| {
                let n = conn.query_row("SELECT COUNT(*) FROM reservations", [], |row| row.get(0))?;
                Ok(n)
            })
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
