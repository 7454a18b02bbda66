mod common;

use common::job;
use thetabot::database::Database;
use thetabot::models::Job;

#[tokio::test]
async fn test_store_jobs_is_idempotent() {
    let database = Database::in_memory().await.unwrap();
    let jobs = vec![
        job("Acme", "SWE Intern", "Remote", "Jan 1"),
        job("Globex", "Data Intern", "NYC", "Jan 2"),
    ];

    assert_eq!(database.store_jobs(&jobs).await.unwrap(), 2);
    assert_eq!(database.store_jobs(&jobs).await.unwrap(), 0);

    let counts = database.job_counts().await.unwrap();
    assert_eq!(counts.total, 2);
    assert_eq!(counts.unannounced, 2);
}

#[tokio::test]
async fn test_first_write_wins() {
    let database = Database::in_memory().await.unwrap();

    let mut first = job("Acme", "SWE Intern", "Remote", "Jan 1");
    first.apply_link = "https://first".to_string();
    let mut second = job("Acme", "SWE Intern", "Remote", "Jan 5");
    second.apply_link = "https://second".to_string();
    second.category = Some("Computer Science".to_string());

    assert_eq!(database.store_jobs(&[first]).await.unwrap(), 1);
    assert_eq!(database.store_jobs(&[second]).await.unwrap(), 0);

    let stored = database
        .get_job_by_unique_id("Acme|SWE Intern|Remote")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.date_posted, "Jan 1");
    assert_eq!(stored.apply_link, "https://first");
    assert_eq!(stored.category, None);
}

#[tokio::test]
async fn test_duplicates_within_one_batch_insert_once() {
    let database = Database::in_memory().await.unwrap();
    let jobs = vec![
        job("Acme", "SWE Intern", "Remote", "Jan 1"),
        job("Acme", "SWE Intern", "Remote", "Jan 2"),
    ];
    assert_eq!(database.store_jobs(&jobs).await.unwrap(), 1);
}

#[tokio::test]
async fn test_jobs_without_company_or_title_are_never_stored() {
    let database = Database::in_memory().await.unwrap();
    let jobs = vec![
        Job::new("", "SWE", "NYC", "", "", "simplify"),
        Job::new("Acme", "   ", "NYC", "", "", "simplify"),
        job("Acme", "SWE", "NYC", "Jan 1"),
    ];
    assert_eq!(database.store_jobs(&jobs).await.unwrap(), 1);
    assert_eq!(database.job_counts().await.unwrap().total, 1);
}

#[tokio::test]
async fn test_get_unannounced_orders_by_discovery_and_respects_limit() {
    let database = Database::in_memory().await.unwrap();
    database
        .store_jobs(&[job("Zeta", "First", "A", ""), job("Alpha", "Second", "B", "")])
        .await
        .unwrap();
    database
        .store_jobs(&[job("Beta", "Third", "C", "")])
        .await
        .unwrap();

    let all = database.get_unannounced(10).await.unwrap();
    let titles: Vec<_> = all.iter().map(|row| row.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second", "Third"]);
    assert!(all.windows(2).all(|w| w[0].first_seen_at <= w[1].first_seen_at));

    let limited = database.get_unannounced(2).await.unwrap();
    assert_eq!(limited.len(), 2);
    assert!(database.get_unannounced(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mark_announced_is_monotonic() {
    let database = Database::in_memory().await.unwrap();
    database
        .store_jobs(&[
            job("Acme", "SWE", "NYC", ""),
            job("Globex", "SRE", "SF", ""),
        ])
        .await
        .unwrap();

    assert_eq!(database.mark_announced(&[]).await.unwrap(), 0);

    let pending = database.get_unannounced(10).await.unwrap();
    let first_id = pending[0].id;
    assert_eq!(database.mark_announced(&[first_id]).await.unwrap(), 1);

    let announced = database
        .get_job_by_unique_id("Acme|SWE|NYC")
        .await
        .unwrap()
        .unwrap();
    assert!(announced.announced);
    let stamped_at = announced.announced_at.unwrap();

    // Marking again neither counts nor re-stamps the row.
    assert_eq!(database.mark_announced(&[first_id]).await.unwrap(), 0);
    let again = database
        .get_job_by_unique_id("Acme|SWE|NYC")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.announced_at, Some(stamped_at));

    let remaining = database.get_unannounced(10).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining.iter().all(|row| row.id != first_id));

    // Re-scraping an announced job does not make it unannounced again.
    database
        .store_jobs(&[job("Acme", "SWE", "NYC", "Feb 1")])
        .await
        .unwrap();
    assert_eq!(database.get_unannounced(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_known_unique_ids() {
    let database = Database::in_memory().await.unwrap();
    database
        .store_jobs(&[job("Acme", "SWE", "NYC", "")])
        .await
        .unwrap();

    let known = database
        .known_unique_ids(&["Acme|SWE|NYC".to_string(), "Globex|SRE|SF".to_string()])
        .await
        .unwrap();
    assert_eq!(known.len(), 1);
    assert!(known.contains("Acme|SWE|NYC"));
    assert!(database.known_unique_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_announced_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = thetabot::config::DatabaseConfig {
        url: format!("sqlite://{}/jobs.db", dir.path().display()),
        max_connections: Some(2),
    };

    {
        let database = Database::new(&config).await.unwrap();
        database.migrate().await.unwrap();
        database
            .store_jobs(&[job("Acme", "SWE", "NYC", "")])
            .await
            .unwrap();
        let pending = database.get_unannounced(10).await.unwrap();
        database.mark_announced(&[pending[0].id]).await.unwrap();
        database.pool().close().await;
    }

    let reopened = Database::new(&config).await.unwrap();
    reopened.migrate().await.unwrap();
    assert!(reopened.get_unannounced(10).await.unwrap().is_empty());
    assert_eq!(reopened.job_counts().await.unwrap().total, 1);
}
