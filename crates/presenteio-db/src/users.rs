use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use presenteio_types::models::Role;

use crate::Database;
use crate::models::UserRow;

pub struct NewUser<'a> {
    pub username: &'a str,
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    /// None leaves the account OTP-only.
    pub password_hash: Option<&'a str>,
    pub role: Role,
}

impl Database {
    pub fn create_user(&self, id: Uuid, user: &NewUser<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, full_name, email, phone, password, role)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id.to_string(),
                    user.username,
                    user.full_name,
                    user.email,
                    user.phone,
                    user.password_hash,
                    user.role.as_str()
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", &id.to_string()))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1 COLLATE NOCASE", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1 COLLATE NOCASE AND email != ''", email))
    }

    pub fn get_user_by_phone(&self, phone: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "phone = ?1", phone))
    }

    pub fn username_taken(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 COLLATE NOCASE)",
                [username],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    pub fn set_password(&self, user_id: Uuid, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?2 WHERE id = ?1",
                params![user_id.to_string(), password_hash],
            )?;
            Ok(changed > 0)
        })
    }

    /// Whether the one-time setup flow already ran.
    pub fn organizer_exists(&self) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE role = 'organizer')",
                [],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }
}

fn query_user(conn: &Connection, predicate: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, full_name, email, phone, password, role, created_at
         FROM users WHERE {}",
        predicate
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                full_name: row.get(2)?,
                email: row.get(3)?,
                phone: row.get(4)?,
                password: row.get(5)?,
                role: row.get(6)?,
                created_at: row.get(7)?,
            })
        })
        .optional()?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user<'a>(username: &'a str, email: &'a str, phone: Option<&'a str>) -> NewUser<'a> {
        NewUser {
            username,
            full_name: "Convidada",
            email,
            phone,
            password_hash: None,
            role: Role::Guest,
        }
    }

    #[test]
    fn lookups_by_each_identifier() {
        let db = Database::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        db.create_user(id, &new_user("ana", "ana@example.com", Some("+5511999990000")))
            .unwrap();

        assert!(db.get_user_by_username("ANA").unwrap().is_some());
        assert!(db.get_user_by_email("ana@example.com").unwrap().is_some());
        assert!(db.get_user_by_phone("+5511999990000").unwrap().is_some());
        assert!(db.get_user_by_phone("+5511888880000").unwrap().is_none());
    }

    #[test]
    fn empty_email_never_matches() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(Uuid::new_v4(), &new_user("sememail", "", None))
            .unwrap();
        assert!(db.get_user_by_email("").unwrap().is_none());
    }

    #[test]
    fn organizer_flag_tracks_roles() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.organizer_exists().unwrap());

        let mut organizer = new_user("casal", "casal@example.com", None);
        organizer.role = Role::Organizer;
        db.create_user(Uuid::new_v4(), &organizer).unwrap();
        assert!(db.organizer_exists().unwrap());
    }

    #[test]
    fn set_password_updates_hash() {
        let db = Database::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        db.create_user(id, &new_user("bia", "bia@example.com", None))
            .unwrap();

        assert!(db.set_password(id, "$argon2id$fake").unwrap());
        let user = db.get_user_by_id(id).unwrap().unwrap();
        assert_eq!(user.password.as_deref(), Some("$argon2id$fake"));
    }
}
