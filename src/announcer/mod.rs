//! Announcing stored jobs to the chat surface
//!
//! The announcer drains unannounced rows oldest-first, emits one message per
//! row and marks each row announced right after its own emit succeeds, so a
//! crash mid-batch never marks a row that was not posted.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::{AnnouncerConfig, ChatConfig, DEFAULT_FOOTER};
use crate::database::Database;
use crate::errors::{AppResult, ChatError, ChatResult};
use crate::models::StoredJob;

// Discord embed limits
const MAX_TITLE_CHARS: usize = 256;
const MAX_FIELD_CHARS: usize = 1024;
const EMBED_COLOR: u32 = 0x58_8B_FF;

/// A formatted announcement, independent of the chat backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub title: String,
    pub url: Option<String>,
    pub description: String,
    pub fields: Vec<ChatField>,
    pub footer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl ChatField {
    fn inline(name: &str, value: &str) -> Self {
        let value = if value.trim().is_empty() { "N/A" } else { value };
        Self {
            name: name.to_string(),
            value: truncate(value, MAX_FIELD_CHARS),
            inline: true,
        }
    }
}

/// Where announcements go.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn emit(&self, message: &ChatMessage) -> ChatResult<()>;
}

/// Build the announcement for one stored job. The footer reads
/// `<footer> • <source>`.
pub fn format_job(job: &StoredJob, footer: &str) -> ChatMessage {
    let url = Some(job.apply_link.trim())
        .filter(|link| is_http_url(link))
        .map(str::to_string);

    let mut fields = vec![
        ChatField::inline("Location", &job.location),
        ChatField::inline("Posted", &job.date_posted),
    ];
    if let Some(category) = job.category.as_deref() {
        fields.push(ChatField::inline("Category", category));
    }

    let description = match &url {
        Some(link) => format!("New opening at **{}**. [Apply here]({})", job.company, link),
        None => format!("New opening at **{}**.", job.company),
    };

    ChatMessage {
        title: truncate(&format!("{} @ {}", job.title, job.company), MAX_TITLE_CHARS),
        url,
        description,
        fields,
        footer: format!("{} • {}", footer, job.source),
    }
}

fn is_http_url(link: &str) -> bool {
    url::Url::parse(link)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars - 1).collect();
    truncated.push('…');
    truncated
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    username: &'a str,
    embeds: [Embed<'a>; 1],
}

#[derive(Serialize)]
struct Embed<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    description: &'a str,
    color: u32,
    fields: Vec<EmbedField<'a>>,
    footer: EmbedFooter<'a>,
}

#[derive(Serialize)]
struct EmbedField<'a> {
    name: &'a str,
    value: &'a str,
    inline: bool,
}

#[derive(Serialize)]
struct EmbedFooter<'a> {
    text: &'a str,
}

/// Posts announcements as Discord webhook embeds.
pub struct DiscordWebhook {
    client: Client,
    webhook_url: String,
    username: String,
}

impl DiscordWebhook {
    pub fn new(client: Client, webhook_url: impl Into<String>, config: &ChatConfig) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
            username: config.username.clone(),
        }
    }

    async fn post(&self, message: &ChatMessage) -> ChatResult<()> {
        let payload = WebhookPayload {
            username: &self.username,
            embeds: [Embed {
                title: &message.title,
                url: message.url.as_deref(),
                description: &message.description,
                color: EMBED_COLOR,
                fields: message
                    .fields
                    .iter()
                    .map(|field| EmbedField {
                        name: &field.name,
                        value: &field.value,
                        inline: field.inline,
                    })
                    .collect(),
                footer: EmbedFooter {
                    text: &message.footer,
                },
            }],
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                // Discord answers 404 for a deleted webhook
                Err(ChatError::Unauthorized {
                    status: status.as_u16(),
                })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let header_secs = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.trim().parse::<f64>().ok());
                let body_secs = response
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|body| body.get("retry_after").and_then(|v| v.as_f64()));
                let retry_after_secs = body_secs.or(header_secs).unwrap_or(1.0);
                Err(ChatError::RateLimited {
                    retry_after_ms: (retry_after_secs.max(0.0) * 1000.0) as u64,
                })
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(ChatError::Http {
                    status: status.as_u16(),
                    message: message.chars().take(200).collect(),
                })
            }
        }
    }
}

#[async_trait]
impl ChatSink for DiscordWebhook {
    async fn emit(&self, message: &ChatMessage) -> ChatResult<()> {
        match self.post(message).await {
            Err(ChatError::RateLimited { retry_after_ms }) => {
                warn!("Chat webhook rate limited, retrying in {} ms", retry_after_ms);
                sleep(Duration::from_millis(retry_after_ms)).await;
                self.post(message).await
            }
            other => other,
        }
    }
}

/// Writes announcements to the log instead of posting them.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl ChatSink for LogSink {
    async fn emit(&self, message: &ChatMessage) -> ChatResult<()> {
        let fields = message
            .fields
            .iter()
            .map(|field| format!("{}: {}", field.name, field.value))
            .collect::<Vec<_>>()
            .join(" | ");
        info!(
            "[dry-run] {} <{}> {} ({})",
            message.title,
            message.url.as_deref().unwrap_or("no link"),
            fields,
            message.footer
        );
        Ok(())
    }
}

pub struct Announcer {
    sink: Arc<dyn ChatSink>,
    batch_size: i64,
    pacing: Duration,
    footer: String,
    mark_posted: bool,
}

impl Announcer {
    pub fn new(sink: Arc<dyn ChatSink>, config: &AnnouncerConfig) -> Self {
        Self {
            sink,
            batch_size: config.batch_size,
            pacing: Duration::from_millis(config.pacing_ms),
            footer: DEFAULT_FOOTER.to_string(),
            mark_posted: true,
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    /// Log announcements without posting them. Rows stay unannounced so a
    /// later real run still posts them.
    pub fn dry_run(config: &AnnouncerConfig) -> Self {
        Self {
            mark_posted: false,
            ..Self::new(Arc::new(LogSink), config)
        }
    }

    /// Announce up to one batch of unannounced jobs; returns how many were
    /// posted. A rejected credential aborts with an error; any other failed
    /// emit ends the batch early and leaves the rest for the next cycle.
    pub async fn announce_pending(&self, database: &Database) -> AppResult<usize> {
        let pending = database.get_unannounced(self.batch_size).await?;
        if pending.is_empty() {
            debug!("No unannounced jobs");
            return Ok(0);
        }

        let mut announced = 0;
        for (index, job) in pending.iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                sleep(self.pacing).await;
            }

            match self.sink.emit(&format_job(job, &self.footer)).await {
                Ok(()) => {
                    if self.mark_posted {
                        database.mark_announced(&[job.id]).await?;
                    }
                    announced += 1;
                }
                Err(e @ ChatError::Unauthorized { .. }) => {
                    error!("Chat surface rejected our credentials: {}", e);
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(
                        "Failed to announce '{}', leaving {} jobs for the next cycle: {}",
                        job.unique_id,
                        pending.len() - index,
                        e
                    );
                    break;
                }
            }
        }

        info!("Announced {} of {} pending jobs", announced, pending.len());
        Ok(announced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stored(apply_link: &str, category: Option<&str>) -> StoredJob {
        StoredJob {
            id: 1,
            unique_id: "Acme|SWE Intern|Remote".to_string(),
            company: "Acme".to_string(),
            title: "SWE Intern".to_string(),
            location: "Remote".to_string(),
            apply_link: apply_link.to_string(),
            date_posted: "Jan 01".to_string(),
            source: "jobright".to_string(),
            category: category.map(str::to_string),
            first_seen_at: Utc::now(),
            announced: false,
            announced_at: None,
        }
    }

    #[test]
    fn test_format_job_with_category() {
        let message = format_job(
            &stored("https://acme.example/apply", Some("Computer Science")),
            "Theta Bot",
        );

        assert_eq!(message.title, "SWE Intern @ Acme");
        assert_eq!(message.url.as_deref(), Some("https://acme.example/apply"));
        assert!(message.description.contains("https://acme.example/apply"));
        assert_eq!(message.footer, "Theta Bot • jobright");

        let names: Vec<_> = message.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Location", "Posted", "Category"]);
        assert_eq!(message.fields[2].value, "Computer Science");
    }

    #[test]
    fn test_format_job_without_link_or_category() {
        let mut job = stored("u2", None);
        job.location = String::new();
        let message = format_job(&job, "Jobs Feed");

        assert_eq!(message.url, None);
        assert_eq!(message.footer, "Jobs Feed • jobright");
        assert_eq!(message.fields.len(), 2);
        assert_eq!(message.fields[0].value, "N/A");
        assert!(!message.description.contains("Apply"));
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let mut job = stored("", None);
        job.title = "x".repeat(400);
        let message = format_job(&job, DEFAULT_FOOTER);
        assert_eq!(message.title.chars().count(), MAX_TITLE_CHARS);
        assert!(message.title.ends_with('…'));
    }

    #[tokio::test]
    async fn test_log_sink_accepts_everything() {
        let message = format_job(&stored("https://x", None), DEFAULT_FOOTER);
        assert!(LogSink.emit(&message).await.is_ok());
    }
}
