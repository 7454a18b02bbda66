mod common;

use axum::{http::StatusCode, routing::get, Router};
use reqwest::Client;
use std::time::Duration;

use common::spawn_server;
use thetabot::ingestor::IngestorService;
use thetabot::models::SourceEntry;
use thetabot::sources::{JobSource, JobrightSource, SimplifySource};

const JOBRIGHT_README: &str = "\
# 2026 Software Engineer New Grad

| Company | Job Title | Location | Work Model | Date Posted |
| ----- | --------- | --------- | ---- | ------- |
| **[Acme](https://acme.example)** | **[SWE Intern](https://jobright.ai/jobs/info/1)** | Remote | 🇺🇸 | Jan 01 |
| **[Globex](https://globex.example)** | **[Backend Engineer](https://jobright.ai/jobs/info/2)** | New York, NY | On Site | Jan 02 |
| broken | row |
";

const SIMPLIFY_README: &str = r#"
<table>
<thead><tr><th>Company</th><th>Role</th><th>Location</th><th>Application</th><th>Age</th></tr></thead>
<tbody>
<tr><td><strong><a href="https://simplify.jobs/c/Initech">Initech</a></strong></td><td>Firmware Intern</td><td>Austin, TX</td><td><a href="https://initech.example/apply">Apply</a></td><td>2d</td></tr>
</tbody>
</table>
"#;

fn document_host() -> Router {
    Router::new()
        .route("/jobright/README.md", get(|| async { JOBRIGHT_README }))
        .route("/simplify/README.md", get(|| async { SIMPLIFY_README }))
        .route(
            "/jobright-down/README.md",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
}

#[tokio::test]
async fn test_jobright_fetch_and_parse() {
    let base = spawn_server(document_host()).await;
    let source = JobrightSource::new(format!("{}/jobright/README.md", base));

    let jobs = source.parse_jobs(&Client::new()).await;
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].unique_id(), "Acme|SWE Intern|Remote");
    assert_eq!(jobs[0].apply_link, "https://jobright.ai/jobs/info/1");
    assert_eq!(jobs[1].location, "New York, NY");
    assert_eq!(jobs[1].date_posted, "Jan 02");
}

#[tokio::test]
async fn test_non_success_status_yields_no_jobs() {
    let base = spawn_server(document_host()).await;
    let source = JobrightSource::new(format!("{}/jobright-down/README.md", base));

    assert!(source.fetch_document(&Client::new()).await.is_err());
    assert!(source.parse_jobs(&Client::new()).await.is_empty());
}

#[tokio::test]
async fn test_unreachable_host_yields_no_jobs() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let source = SimplifySource::new(format!("http://{}/simplify/README.md", addr));
    assert!(source.parse_jobs(&client).await.is_empty());
}

#[tokio::test]
async fn test_one_failing_origin_does_not_stop_the_others() {
    let base = spawn_server(document_host()).await;
    let entries = vec![
        SourceEntry {
            name: "down".to_string(),
            url: format!("{}/jobright-down/README.md", base),
        },
        SourceEntry {
            name: "unknown".to_string(),
            url: format!("{}/other/README.md", base),
        },
        SourceEntry {
            name: "jobright".to_string(),
            url: format!("{}/jobright/README.md", base),
        },
        SourceEntry {
            name: "simplify".to_string(),
            url: format!("{}/simplify/README.md", base),
        },
    ];

    let ingestor = IngestorService::from_entries(Client::new(), &entries);
    assert_eq!(ingestor.source_count(), 3);

    let jobs = ingestor.collect_jobs().await;
    assert_eq!(jobs.len(), 3);
    assert!(jobs.iter().any(|job| job.source == "simplify"
        && job.company == "Initech"
        && job.apply_link == "https://initech.example/apply"));
}
