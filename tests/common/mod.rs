#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use std::sync::{Arc, Mutex};

use thetabot::announcer::{ChatMessage, ChatSink};
use thetabot::config::AnnouncerConfig;
use thetabot::errors::ChatResult;
use thetabot::models::Job;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Announcer settings without pacing, for fast tests.
pub fn unpaced(batch_size: i64) -> AnnouncerConfig {
    AnnouncerConfig {
        batch_size,
        pacing_ms: 0,
    }
}

pub fn job(company: &str, title: &str, location: &str, date_posted: &str) -> Job {
    Job::new(
        company,
        title,
        location,
        format!("https://{}.example/apply", company.to_lowercase()),
        date_posted,
        "jobright",
    )
}

/// Chat sink that keeps every message it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<ChatMessage>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn titles(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|message| message.title.clone())
            .collect()
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn emit(&self, message: &ChatMessage) -> ChatResult<()> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}
