//! Jobright listing documents
//!
//! Markdown pipe tables with five columns:
//! `| Company | Job Title | Location | Work Model | Date Posted |`.
//! Company and title are usually bold markdown links; the apply link is the
//! one wrapped around the title.

use crate::models::Job;

use super::fields::{extract_text, extract_url_with, LinkSyntax};
use super::traits::{accept, JobSource};

pub const SOURCE_NAME: &str = "jobright";

const COMPANY: usize = 0;
const TITLE: usize = 1;
const LOCATION: usize = 2;
const DATE_POSTED: usize = 4;

pub struct JobrightSource {
    url: String,
}

impl JobrightSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl JobSource for JobrightSource {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    fn document_url(&self) -> &str {
        &self.url
    }

    fn min_cells(&self) -> usize {
        5
    }

    fn parse_row(&self, cells: &[String]) -> Option<Job> {
        if cells.len() < self.min_cells() {
            return None;
        }

        accept(Job::new(
            extract_text(&cells[COMPANY]),
            extract_text(&cells[TITLE]),
            extract_text(&cells[LOCATION]),
            extract_url_with(&cells[TITLE], LinkSyntax::Markdown),
            cells[DATE_POSTED].trim(),
            SOURCE_NAME,
        ))
    }
}
