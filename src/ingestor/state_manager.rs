use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{CycleSummary, ProcessingTrigger};

/// Snapshot of the scrape loop, served by the status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeState {
    pub running: bool,
    pub current_trigger: Option<ProcessingTrigger>,
    pub current_started_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_summary: Option<CycleSummary>,
    pub last_error: Option<String>,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
}

#[derive(Clone, Default)]
pub struct ScrapeStateManager {
    state: Arc<RwLock<ScrapeState>>,
}

impl ScrapeStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the last-checked time persisted by a previous run.
    pub async fn restore_last_checked(&self, last_checked_at: Option<DateTime<Utc>>) {
        let mut state = self.state.write().await;
        if state.last_checked_at.is_none() {
            state.last_checked_at = last_checked_at;
        }
    }

    pub async fn start_cycle(&self, trigger: ProcessingTrigger) {
        let mut state = self.state.write().await;
        state.running = true;
        state.current_trigger = Some(trigger);
        state.current_started_at = Some(Utc::now());
    }

    pub async fn mark_checked(&self, at: DateTime<Utc>) {
        self.state.write().await.last_checked_at = Some(at);
    }

    pub async fn complete_cycle(&self, summary: CycleSummary) {
        let mut state = self.state.write().await;
        state.running = false;
        state.current_trigger = None;
        state.current_started_at = None;
        state.last_summary = Some(summary);
        state.last_error = None;
        state.cycles_completed += 1;
    }

    pub async fn fail_cycle(&self, error: String) {
        let mut state = self.state.write().await;
        state.running = false;
        state.current_trigger = None;
        state.current_started_at = None;
        state.last_error = Some(error);
        state.cycles_failed += 1;
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.running
    }

    pub async fn snapshot(&self) -> ScrapeState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(trigger: ProcessingTrigger) -> CycleSummary {
        let now = Utc::now();
        CycleSummary {
            trigger,
            found: 3,
            new_candidates: 2,
            classified: 1,
            stored: 2,
            announced: 2,
            started_at: now,
            finished_at: now,
        }
    }

    #[tokio::test]
    async fn test_cycle_lifecycle() {
        let manager = ScrapeStateManager::new();
        manager.start_cycle(ProcessingTrigger::Manual).await;
        assert!(manager.is_running().await);
        assert_eq!(
            manager.snapshot().await.current_trigger,
            Some(ProcessingTrigger::Manual)
        );

        manager.fail_cycle("database unavailable".to_string()).await;
        manager.start_cycle(ProcessingTrigger::Scheduler).await;
        manager.complete_cycle(summary(ProcessingTrigger::Scheduler)).await;

        let state = manager.snapshot().await;
        assert!(!state.running);
        assert_eq!(state.cycles_completed, 1);
        assert_eq!(state.cycles_failed, 1);
        assert!(state.last_error.is_none());
        assert_eq!(state.last_summary.map(|s| s.stored), Some(2));
    }

    #[tokio::test]
    async fn test_restore_does_not_override_fresh_value() {
        let manager = ScrapeStateManager::new();
        let fresh = Utc::now();
        manager.mark_checked(fresh).await;
        manager
            .restore_last_checked(Some(fresh - chrono::Duration::hours(2)))
            .await;
        assert_eq!(manager.snapshot().await.last_checked_at, Some(fresh));
    }
}
