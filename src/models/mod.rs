use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A single job listing scraped from a listing document.
///
/// Two jobs are the same opening when company, title and location match;
/// the posted date and apply link are republished over time and do not
/// take part in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub company: String,
    pub title: String,
    pub location: String,
    pub apply_link: String,
    pub date_posted: String, // free text, format chosen by the source document
    pub source: String,
    pub category: Option<String>,
}

impl Job {
    pub fn new(
        company: impl Into<String>,
        title: impl Into<String>,
        location: impl Into<String>,
        apply_link: impl Into<String>,
        date_posted: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            title: title.into(),
            location: location.into(),
            apply_link: apply_link.into(),
            date_posted: date_posted.into(),
            source: source.into(),
            category: None,
        }
    }

    /// Composite dedup key: `company|title|location`.
    pub fn unique_id(&self) -> String {
        format!("{}|{}|{}", self.company, self.title, self.location)
    }

    /// A job can only be stored when it names both a company and a title.
    pub fn is_storable(&self) -> bool {
        !self.company.trim().is_empty() && !self.title.trim().is_empty()
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.company == other.company
            && self.title == other.title
            && self.location == other.location
    }
}

impl Eq for Job {}

impl Hash for Job {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unique_id().hash(state);
    }
}

/// A job as persisted by the dedup store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredJob {
    pub id: i64,
    pub unique_id: String,
    pub company: String,
    pub title: String,
    pub location: String,
    pub apply_link: String,
    pub date_posted: String,
    pub source: String,
    pub category: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub announced: bool,
    pub announced_at: Option<DateTime<Utc>>,
}

/// Row counts used by the status endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobCounts {
    pub total: i64,
    pub unannounced: i64,
}

/// One configured origin: a display name and the raw document URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    pub url: String,
}

/// What started a scrape cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingTrigger {
    Startup,
    Scheduler,
    Manual,
}

impl std::fmt::Display for ProcessingTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingTrigger::Startup => write!(f, "startup"),
            ProcessingTrigger::Scheduler => write!(f, "scheduler"),
            ProcessingTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// Per-cycle counts reported to the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub trigger: ProcessingTrigger,
    pub found: usize,
    pub new_candidates: usize,
    pub classified: usize,
    pub stored: u64,
    pub announced: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
