//! One scrape cycle: collect, classify, store, announce.
//!
//! Collection fully joins before anything is stored, and each stage runs to
//! completion before the next starts. The pipeline is not re-entrant; the
//! scheduler guarantees one cycle at a time.

use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info};

use super::{IngestorService, ScrapeStateManager};
use crate::announcer::Announcer;
use crate::classifier::ZeroShotClassifier;
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{CycleSummary, Job, ProcessingTrigger};

pub struct JobPipeline {
    ingestor: IngestorService,
    classifier: Option<ZeroShotClassifier>,
    database: Database,
    announcer: Announcer,
    state_manager: ScrapeStateManager,
}

impl JobPipeline {
    pub fn new(
        ingestor: IngestorService,
        classifier: Option<ZeroShotClassifier>,
        database: Database,
        announcer: Announcer,
        state_manager: ScrapeStateManager,
    ) -> Self {
        Self {
            ingestor,
            classifier,
            database,
            announcer,
            state_manager,
        }
    }

    pub fn state_manager(&self) -> &ScrapeStateManager {
        &self.state_manager
    }

    /// Run one full cycle. Storage and chat-authentication failures abort
    /// the cycle and are returned; everything else degrades in place.
    pub async fn run_cycle(&self, trigger: ProcessingTrigger) -> AppResult<CycleSummary> {
        info!("Starting scrape cycle ({})", trigger);
        self.state_manager.start_cycle(trigger).await;

        match self.execute(trigger).await {
            Ok(summary) => {
                info!(
                    "Scrape cycle ({}) finished: found={} new={} classified={} stored={} announced={}",
                    trigger,
                    summary.found,
                    summary.new_candidates,
                    summary.classified,
                    summary.stored,
                    summary.announced
                );
                self.state_manager.complete_cycle(summary.clone()).await;
                Ok(summary)
            }
            Err(e) => {
                self.state_manager.fail_cycle(e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn execute(&self, trigger: ProcessingTrigger) -> AppResult<CycleSummary> {
        let started_at = Utc::now();

        let candidates = self.ingestor.collect_jobs().await;
        let found = candidates.len();

        let mut new_jobs = self.filter_new(candidates).await?;
        let new_candidates = new_jobs.len();

        let classified = match &self.classifier {
            Some(classifier) if !new_jobs.is_empty() => classifier.classify_all(&mut new_jobs).await,
            _ => 0,
        };

        let stored = self.database.store_jobs(&new_jobs).await?;

        let checked_at = Utc::now();
        self.database.record_last_checked(checked_at).await?;
        self.state_manager.mark_checked(checked_at).await;

        let announced = self.announcer.announce_pending(&self.database).await?;

        Ok(CycleSummary {
            trigger,
            found,
            new_candidates,
            classified,
            stored,
            announced,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Drop unstorable candidates, duplicates within this scrape (first one
    /// wins) and jobs already stored, so only unseen jobs reach the
    /// classifier.
    async fn filter_new(&self, candidates: Vec<Job>) -> AppResult<Vec<Job>> {
        let mut seen = HashSet::new();
        let unique: Vec<Job> = candidates
            .into_iter()
            .filter(|job| job.is_storable() && seen.insert(job.unique_id()))
            .collect();

        let ids: Vec<String> = unique.iter().map(Job::unique_id).collect();
        let known = self.database.known_unique_ids(&ids).await?;
        debug!(
            "{} unique candidates, {} already stored",
            unique.len(),
            known.len()
        );

        Ok(unique
            .into_iter()
            .filter(|job| !known.contains(&job.unique_id()))
            .collect())
    }
}
