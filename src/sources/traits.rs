//! Source parser trait definitions
//!
//! Every listing origin is read by one `JobSource` implementation. An
//! implementation only has to say how a row of cells maps to a job; fetching
//! the document, extracting rows and dropping unusable rows are shared.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::errors::{SourceError, SourceResult};
use crate::models::Job;

use super::table::markdown_rows;

/// Parses one origin's listing document into jobs.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Origin tag stored on every job from this source
    fn source_name(&self) -> &str;

    /// Raw document URL
    fn document_url(&self) -> &str;

    /// Rows with fewer cells than this are ignored
    fn min_cells(&self) -> usize;

    /// Map one row of cells to a job, or `None` when the row is unusable.
    fn parse_row(&self, cells: &[String]) -> Option<Job>;

    /// Candidate rows of the document, in document order.
    fn extract_rows<'a>(&self, document: &'a str) -> Box<dyn Iterator<Item = Vec<String>> + 'a> {
        Box::new(markdown_rows(document))
    }

    /// Parse an already fetched document.
    fn parse_document(&self, document: &str) -> Vec<Job> {
        self.extract_rows(document)
            .filter_map(|cells| self.parse_row(&cells))
            .collect()
    }

    /// Fetch the raw document.
    async fn fetch_document(&self, client: &Client) -> SourceResult<String> {
        let url = self.document_url();
        debug!("Fetching listing document for '{}': {}", self.source_name(), url);

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::from_request(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::from_request(url, e))
    }

    /// Fetch and parse; a failed fetch yields no jobs for this cycle.
    async fn parse_jobs(&self, client: &Client) -> Vec<Job> {
        match self.fetch_document(client).await {
            Ok(document) => {
                let jobs = self.parse_document(&document);
                info!("[{}] Found {} jobs", self.source_name(), jobs.len());
                jobs
            }
            Err(e) => {
                warn!("[{}] Failed to fetch listing document: {}", self.source_name(), e);
                Vec::new()
            }
        }
    }
}

/// Shared checks for a freshly mapped row.
pub(crate) fn accept(job: Job) -> Option<Job> {
    if job.is_storable() {
        Some(job)
    } else {
        None
    }
}
