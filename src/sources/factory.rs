//! Source parser factory
//!
//! Picks the parser variant for an origin once, at configuration time, by
//! looking at its document URL. Origins no variant recognizes get no parser.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::SourceEntry;

use super::jobright::JobrightSource;
use super::simplify::SimplifySource;
use super::traits::JobSource;

/// Known origin variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Jobright,
    Simplify,
}

impl SourceKind {
    /// Case-insensitive match of the URL against known origin keywords.
    pub fn detect(url: &str) -> Option<Self> {
        let lowered = url.to_lowercase();
        if lowered.contains("jobright") {
            Some(SourceKind::Jobright)
        } else if lowered.contains("simplify") {
            Some(SourceKind::Simplify)
        } else {
            None
        }
    }
}

pub struct SourceHandlerFactory;

impl SourceHandlerFactory {
    /// Create the parser for one origin, or `None` when the origin is unknown.
    pub fn create(entry: &SourceEntry) -> Option<Arc<dyn JobSource>> {
        match SourceKind::detect(&entry.url) {
            Some(SourceKind::Jobright) => {
                debug!("Using jobright parser for '{}'", entry.name);
                Some(Arc::new(JobrightSource::new(&entry.url)))
            }
            Some(SourceKind::Simplify) => {
                debug!("Using simplify parser for '{}'", entry.name);
                Some(Arc::new(SimplifySource::new(&entry.url)))
            }
            None => {
                warn!(
                    "No parser recognizes origin '{}' ({}), skipping",
                    entry.name, entry.url
                );
                None
            }
        }
    }

    /// Create parsers for every recognized origin, keeping configuration order.
    pub fn create_all(entries: &[SourceEntry]) -> Vec<Arc<dyn JobSource>> {
        entries.iter().filter_map(Self::create).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, url: &str) -> SourceEntry {
        SourceEntry {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(
            SourceKind::detect("https://raw.githubusercontent.com/JobRight-AI/2026-Software-Engineer-New-Grad/master/README.md"),
            Some(SourceKind::Jobright)
        );
        assert_eq!(
            SourceKind::detect("https://raw.githubusercontent.com/SimplifyJobs/Summer2026-Internships/dev/README.md"),
            Some(SourceKind::Simplify)
        );
        assert_eq!(SourceKind::detect("https://example.com/jobs.md"), None);
    }

    #[test]
    fn test_create_all_skips_unknown_origins() {
        let parsers = SourceHandlerFactory::create_all(&[
            entry("jobright-swe", "https://raw.githubusercontent.com/jobright-ai/x/master/README.md"),
            entry("mystery", "https://example.com/README.md"),
            entry("simplify-interns", "https://raw.githubusercontent.com/SimplifyJobs/y/dev/README.md"),
        ]);

        let names: Vec<_> = parsers.iter().map(|p| p.source_name().to_string()).collect();
        assert_eq!(names, vec!["jobright", "simplify"]);
    }
}
