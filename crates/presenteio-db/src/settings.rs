//! Site branding. The single row is seeded by the migration with defined
//! defaults; reads fail loudly if it is missing instead of creating it.

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use rusqlite::{OptionalExtension, params};
use tracing::warn;

use presenteio_types::api::SiteSettingsBody;

use crate::Database;

impl Database {
    pub fn load_site_settings(&self) -> Result<SiteSettingsBody> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT site_title, event_date, primary_color, secondary_color,
                            background_color, text_color, card_color
                     FROM site_settings WHERE id = 1",
                    [],
                    |row| {
                        Ok(SiteSettingsBody {
                            site_title: row.get(0)?,
                            event_date: parse_event_date(row.get::<_, Option<String>>(1)?),
                            primary_color: row.get(2)?,
                            secondary_color: row.get(3)?,
                            background_color: row.get(4)?,
                            text_color: row.get(5)?,
                            card_color: row.get(6)?,
                        })
                    },
                )
                .optional()?;

            row.ok_or_else(|| anyhow!("site_settings row missing; migrations did not run"))
        })
    }

    pub fn update_site_settings(&self, settings: &SiteSettingsBody) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE site_settings
                 SET site_title = ?1, event_date = ?2, primary_color = ?3,
                     secondary_color = ?4, background_color = ?5, text_color = ?6,
                     card_color = ?7, updated_at = datetime('now')
                 WHERE id = 1",
                params![
                    settings.site_title,
                    settings.event_date.map(|d| d.to_string()),
                    settings.primary_color,
                    settings.secondary_color,
                    settings.background_color,
                    settings.text_color,
                    settings.card_color
                ],
            )?;
            Ok(())
        })
    }
}

fn parse_event_date(raw: Option<String>) -> Option<NaiveDate> {
    let raw = raw?;
    match raw.parse::<NaiveDate>() {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Corrupt event_date '{}': {}", raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_seeded() {
        let db = Database::open_in_memory().unwrap();
        let settings = db.load_site_settings().unwrap();
        assert_eq!(settings.site_title, "Chá de Panela");
        assert_eq!(settings.primary_color, "#0d6efd");
        assert!(settings.event_date.is_none());
    }

    #[test]
    fn update_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let mut settings = db.load_site_settings().unwrap();
        settings.site_title = "Chá da Ana e do João".to_string();
        settings.event_date = NaiveDate::from_ymd_opt(2026, 10, 17);
        settings.primary_color = "#aa3366".to_string();

        db.update_site_settings(&settings).unwrap();

        let reloaded = db.load_site_settings().unwrap();
        assert_eq!(reloaded.site_title, "Chá da Ana e do João");
        assert_eq!(reloaded.event_date, NaiveDate::from_ymd_opt(2026, 10, 17));
        assert_eq!(reloaded.primary_color, "#aa3366");
    }
}
