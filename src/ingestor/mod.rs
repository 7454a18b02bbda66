use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::SourcesConfig;
use crate::models::{Job, SourceEntry};
use crate::sources::{JobSource, SourceHandlerFactory};

pub mod pipeline;
pub mod scheduler;
pub mod state_manager;

pub use pipeline::JobPipeline;
pub use scheduler::{create_trigger_channel, SchedulerService, ScrapeTriggerSender};
pub use state_manager::{ScrapeState, ScrapeStateManager};

/// Runs every configured source parser and gathers their jobs.
pub struct IngestorService {
    client: Client,
    sources: Vec<Arc<dyn JobSource>>,
}

impl IngestorService {
    pub fn new(client: Client, sources: Vec<Arc<dyn JobSource>>) -> Self {
        Self { client, sources }
    }

    /// Build parsers for the configured origins; unknown origins are skipped.
    pub fn from_entries(client: Client, entries: &[SourceEntry]) -> Self {
        let sources = SourceHandlerFactory::create_all(entries);
        info!(
            "Configured {} of {} origins",
            sources.len(),
            entries.len()
        );
        Self::new(client, sources)
    }

    /// Shared client used for every document fetch.
    pub fn build_client(config: &SourcesConfig) -> reqwest::Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Fetch and parse every origin concurrently. Each origin degrades to no
    /// jobs on its own failure; results are concatenated in source order.
    pub async fn collect_jobs(&self) -> Vec<Job> {
        let fetches = self
            .sources
            .iter()
            .map(|source| source.parse_jobs(&self.client));

        let jobs: Vec<Job> = join_all(fetches).await.into_iter().flatten().collect();
        info!(
            "Collected {} jobs from {} sources",
            jobs.len(),
            self.sources.len()
        );
        jobs
    }
}
