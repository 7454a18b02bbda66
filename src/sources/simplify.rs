//! SimplifyJobs listing documents
//!
//! Current documents use HTML tables with the columns
//! `Company | Role | Location | Application | Age`; older revisions used
//! markdown pipe tables in the same order, so both are read. The application
//! cell holds the apply link as an `<a href>` (or a markdown link in the
//! older layout). Several roles at one company are listed as continuation
//! rows whose company cell is `↳`.
//!
//! Column positions follow the layout of the published documents; re-check
//! them whenever the upstream table changes shape.

use crate::models::Job;

use super::fields::{extract_text, extract_url_with, LinkSyntax};
use super::table::{has_html_table, html_rows, markdown_rows};
use super::traits::{accept, JobSource};

pub const SOURCE_NAME: &str = "simplify";

const CONTINUATION_MARKER: &str = "↳";

const COMPANY: usize = 0;
const TITLE: usize = 1;
const LOCATION: usize = 2;
const APPLICATION: usize = 3;
const DATE_POSTED: usize = 4;

pub struct SimplifySource {
    url: String,
}

impl SimplifySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn is_continuation(cells: &[String]) -> bool {
        cells
            .get(COMPANY)
            .map(|cell| extract_text(cell) == CONTINUATION_MARKER)
            .unwrap_or(false)
    }
}

impl JobSource for SimplifySource {
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
            extract_url_with(&cells[APPLICATION], LinkSyntax::Html),
            extract_text(&cells[DATE_POSTED]),
            SOURCE_NAME,
        ))
    }

    fn extract_rows<'a>(&self, document: &'a str) -> Box<dyn Iterator<Item = Vec<String>> + 'a> {
        if has_html_table(document) {
            Box::new(html_rows(document))
        } else {
            Box::new(markdown_rows(document))
        }
    }

    fn parse_document(&self, document: &str) -> Vec<Job> {
        let mut jobs = Vec::new();
        let mut last_company: Option<String> = None;

        for cells in self.extract_rows(document) {
            if Self::is_continuation(&cells) {
                // A continuation row before any company row has nothing to inherit.
                let Some(company) = last_company.clone() else {
                    continue;
                };
                let mut cells = cells;
                cells[COMPANY] = company;
                if let Some(job) = self.parse_row(&cells) {
                    jobs.push(job);
                }
                continue;
            }

            // Continuations belong to the nearest parent row, parsed or not.
            if let Some(cell) = cells.get(COMPANY) {
                let company = extract_text(cell);
                last_company = (!company.is_empty()).then_some(company);
            }

            if let Some(job) = self.parse_row(&cells) {
                jobs.push(job);
            }
        }

        jobs
    }
}
