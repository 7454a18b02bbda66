use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::JobPipeline;
use crate::models::{CycleSummary, ProcessingTrigger};

pub type ScrapeTriggerSender = mpsc::Sender<ProcessingTrigger>;
pub type ScrapeTriggerReceiver = mpsc::Receiver<ProcessingTrigger>;

pub fn create_trigger_channel() -> (ScrapeTriggerSender, ScrapeTriggerReceiver) {
    mpsc::channel(16)
}

/// Drives the pipeline on a fixed interval and on manual request.
///
/// Cycles run inline in the select loop, so a new cycle never starts while
/// one is in flight. Manual triggers received during a cycle collapse into a
/// single follow-up cycle.
pub struct SchedulerService {
    pipeline: Arc<JobPipeline>,
    interval: Duration,
    run_on_startup: bool,
    trigger_rx: Option<ScrapeTriggerReceiver>,
}

impl SchedulerService {
    pub fn new(
        pipeline: Arc<JobPipeline>,
        interval: Duration,
        run_on_startup: bool,
        trigger_rx: Option<ScrapeTriggerReceiver>,
    ) -> Self {
        Self {
            pipeline,
            interval,
            run_on_startup,
            trigger_rx,
        }
    }

    pub async fn start(mut self) -> Result<()> {
        info!(
            "Starting scheduler service (interval {:?}, run on startup: {})",
            self.interval, self.run_on_startup
        );

        if self.run_on_startup {
            self.run(ProcessingTrigger::Startup).await;
        }

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run(ProcessingTrigger::Scheduler).await;
                }
                trigger = Self::receive_trigger(&mut self.trigger_rx), if self.trigger_rx.is_some() => {
                    match trigger {
                        Some(trigger) => {
                            let coalesced = self.drain_pending_triggers();
                            if coalesced > 0 {
                                debug!("Coalesced {} queued manual triggers", coalesced);
                            }
                            self.run(trigger).await;
                        }
                        None => {
                            warn!("Manual trigger channel closed, continuing on schedule only");
                            self.trigger_rx = None;
                        }
                    }
                }
            }
        }
    }

    async fn receive_trigger(rx: &mut Option<ScrapeTriggerReceiver>) -> Option<ProcessingTrigger> {
        match rx {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Discard triggers queued while the last cycle ran.
    fn drain_pending_triggers(&mut self) -> usize {
        let Some(rx) = self.trigger_rx.as_mut() else {
            return 0;
        };
        let mut drained = 0;
        while rx.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }

    async fn run(&self, trigger: ProcessingTrigger) -> Option<CycleSummary> {
        match self.pipeline.run_cycle(trigger).await {
            Ok(summary) => Some(summary),
            Err(e) if e.is_chat_auth_failure() => {
                error!(
                    "Scrape cycle ({}) aborted, chat credentials rejected: {}. Check DISCORD_WEBHOOK_URL",
                    trigger, e
                );
                None
            }
            Err(e) => {
                error!("Scrape cycle ({}) failed, retrying next tick: {}", trigger, e);
                None
            }
        }
    }
}
