use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            full_name   TEXT NOT NULL DEFAULT '',
            email       TEXT NOT NULL DEFAULT '',
            phone       TEXT UNIQUE,
            password    TEXT,
            role        TEXT NOT NULL DEFAULT 'guest'
                        CHECK (role IN ('guest', 'organizer', 'moderator')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS gifts (
            id              TEXT PRIMARY KEY,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL DEFAULT '',
            purchase_links  TEXT NOT NULL DEFAULT '',
            is_active       INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS gift_images (
            gift_id     TEXT NOT NULL REFERENCES gifts(id) ON DELETE CASCADE,
            position    INTEGER NOT NULL,
            url         TEXT NOT NULL,
            PRIMARY KEY (gift_id, position)
        );

        -- UNIQUE(gift_id) is the exclusivity invariant: at most one
        -- reservation per gift, even for writes that bypass registry.
        CREATE TABLE IF NOT EXISTS reservations (
            id              TEXT PRIMARY KEY,
            gift_id         TEXT NOT NULL UNIQUE REFERENCES gifts(id) ON DELETE CASCADE,
            user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            message         TEXT NOT NULL DEFAULT '',
            message_seen    INTEGER NOT NULL DEFAULT 0,
            message_hidden  INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_reservations_user
            ON reservations(user_id);

        CREATE TABLE IF NOT EXISTS verification_codes (
            id          TEXT PRIMARY KEY,
            phone       TEXT NOT NULL DEFAULT '',
            email       TEXT NOT NULL DEFAULT '',
            purpose     TEXT NOT NULL CHECK (purpose IN ('login', 'reset_password')),
            channel     TEXT NOT NULL CHECK (channel IN ('sms', 'email')),
            code        TEXT NOT NULL,
            attempts    INTEGER NOT NULL DEFAULT 0,
            expires_at  TEXT NOT NULL,
            used_at     TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_verification_codes_lookup
            ON verification_codes(phone, email, purpose, created_at);

        CREATE TABLE IF NOT EXISTS site_settings (
            id                  INTEGER PRIMARY KEY CHECK (id = 1),
            site_title          TEXT NOT NULL,
            event_date          TEXT,
            primary_color       TEXT NOT NULL,
            secondary_color     TEXT NOT NULL,
            background_color    TEXT NOT NULL,
            text_color          TEXT NOT NULL,
            card_color          TEXT NOT NULL,
            updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Seed the branding row explicitly; it is only ever updated after
        -- this, never lazily created on read.
        INSERT OR IGNORE INTO site_settings
            (id, site_title, primary_color, secondary_color, background_color, text_color, card_color)
        VALUES
            (1, 'Chá de Panela', '#0d6efd', '#6c757d', '#f8f9fa', '#212529', '#ffffff');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
