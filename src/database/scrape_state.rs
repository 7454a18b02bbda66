use chrono::{DateTime, Utc};
use sqlx::Row;

use super::Database;
use crate::errors::{AppResult, RepositoryError};
use crate::utils::DateTimeParser;

const LAST_CHECKED_KEY: &str = "last_checked";

impl Database {
    /// Persist the time of the last completed scrape. Informational only.
    pub async fn record_last_checked(&self, at: DateTime<Utc>) -> AppResult<()> {
        let value = DateTimeParser::format_for_storage(&at);
        let updated_at = DateTimeParser::format_for_storage(&Utc::now());

        sqlx::query(
            "INSERT INTO scrape_state (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(LAST_CHECKED_KEY)
        .bind(&value)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn last_checked(&self) -> AppResult<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT value FROM scrape_state WHERE key = ?")
            .bind(LAST_CHECKED_KEY)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value: String = row.get("value");
        let parsed = DateTimeParser::parse_flexible(&value)
            .map_err(|e| RepositoryError::decode_failed(LAST_CHECKED_KEY, e.to_string()))?;
        Ok(Some(parsed))
    }
}
