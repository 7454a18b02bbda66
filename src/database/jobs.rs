//! Dedup store operations on the `jobs` table
//!
//! `unique_id` carries a UNIQUE constraint and rows are written with
//! `INSERT OR IGNORE`, so the first scrape to see an opening decides its
//! stored fields and later sightings are no-ops. `announced` only ever moves
//! from false to true.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::HashSet;
use tracing::{debug, info};

use super::Database;
use crate::errors::{AppResult, RepositoryError};
use crate::models::{Job, JobCounts, StoredJob};
use crate::utils::DateTimeParser;

// Keeps every statement well under SQLite's bound-parameter limit.
const MAX_BINDS_PER_QUERY: usize = 500;

const JOB_COLUMNS: &str = "id, unique_id, company, title, location, apply_link, date_posted, \
     source, category, first_seen_at, announced, announced_at";

fn row_to_stored_job(row: &SqliteRow) -> AppResult<StoredJob> {
    let first_seen_at: String = row.get("first_seen_at");
    let announced_at: Option<String> = row.get("announced_at");

    Ok(StoredJob {
        id: row.get("id"),
        unique_id: row.get("unique_id"),
        company: row.get("company"),
        title: row.get("title"),
        location: row.get("location"),
        apply_link: row.get("apply_link"),
        date_posted: row.get("date_posted"),
        source: row.get("source"),
        category: row.get("category"),
        first_seen_at: DateTimeParser::parse_flexible(&first_seen_at)
            .map_err(|e| RepositoryError::decode_failed("first_seen_at", e.to_string()))?,
        announced: row.get("announced"),
        announced_at: announced_at
            .map(|s| DateTimeParser::parse_flexible(&s))
            .transpose()
            .map_err(|e| RepositoryError::decode_failed("announced_at", e.to_string()))?,
    })
}

impl Database {
    /// Insert every candidate not already stored; returns rows actually inserted.
    ///
    /// Candidates without a company or title are skipped. Safe to call with
    /// overlapping or repeated input.
    pub async fn store_jobs(&self, jobs: &[Job]) -> AppResult<u64> {
        if jobs.is_empty() {
            return Ok(0);
        }

        let first_seen_at = DateTimeParser::format_for_storage(&Utc::now());
        let mut transaction = self.pool.begin().await?;
        let mut inserted = 0u64;

        for job in jobs {
            if !job.is_storable() {
                debug!(
                    "Skipping job without company or title from '{}': {:?}",
                    job.source,
                    job.unique_id()
                );
                continue;
            }

            let result = sqlx::query(
                "INSERT OR IGNORE INTO jobs
                 (unique_id, company, title, location, apply_link, date_posted, source, category, first_seen_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(job.unique_id())
            .bind(&job.company)
            .bind(&job.title)
            .bind(&job.location)
            .bind(&job.apply_link)
            .bind(&job.date_posted)
            .bind(&job.source)
            .bind(&job.category)
            .bind(&first_seen_at)
            .execute(&mut *transaction)
            .await?;

            inserted += result.rows_affected();
        }

        transaction.commit().await?;
        info!("Stored {} new jobs out of {} candidates", inserted, jobs.len());
        Ok(inserted)
    }

    /// Up to `limit` unannounced rows, oldest discovery first.
    pub async fn get_unannounced(&self, limit: i64) -> AppResult<Vec<StoredJob>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {JOB_COLUMNS} FROM jobs
             WHERE announced = 0
             ORDER BY first_seen_at ASC, id ASC
             LIMIT ?"
        );
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_stored_job).collect()
    }

    /// Flag rows as announced. Rows already announced keep their original
    /// `announced_at`. Returns the number of rows that changed.
    pub async fn mark_announced(&self, ids: &[i64]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let announced_at = DateTimeParser::format_for_storage(&Utc::now());
        let mut updated = 0u64;

        for chunk in ids.chunks(MAX_BINDS_PER_QUERY) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("UPDATE jobs SET announced = 1, announced_at = ");
            builder.push_bind(&announced_at);
            builder.push(" WHERE announced = 0 AND id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            updated += builder.build().execute(&self.pool).await?.rows_affected();
        }

        debug!("Marked {} jobs as announced", updated);
        Ok(updated)
    }

    /// Which of the given unique ids are already stored.
    pub async fn known_unique_ids(&self, unique_ids: &[String]) -> AppResult<HashSet<String>> {
        let mut known = HashSet::new();

        for chunk in unique_ids.chunks(MAX_BINDS_PER_QUERY) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT unique_id FROM jobs WHERE unique_id IN (");
            let mut separated = builder.separated(", ");
            for unique_id in chunk {
                separated.push_bind(unique_id);
            }
            separated.push_unseparated(")");

            let rows = builder.build().fetch_all(&self.pool).await?;
            known.extend(rows.iter().map(|row| row.get::<String, _>("unique_id")));
        }

        Ok(known)
    }

    pub async fn get_job_by_unique_id(&self, unique_id: &str) -> AppResult<Option<StoredJob>> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE unique_id = ?");
        let row = sqlx::query(&query)
            .bind(unique_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_stored_job).transpose()
    }

    pub async fn job_counts(&self) -> AppResult<JobCounts> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN announced = 0 THEN 1 ELSE 0 END), 0) AS unannounced
             FROM jobs",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(JobCounts {
            total: row.get("total"),
            unannounced: row.get("unannounced"),
        })
    }
}
