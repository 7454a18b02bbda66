//! Zero-shot job categorization
//!
//! Titles are sent to a hosted zero-shot text classification endpoint
//! (Hugging Face inference API by default) together with a small set of
//! candidate labels. Categorization is advisory: every failure ends in
//! "no category" and the job is stored regardless.

use std::time::Duration;

use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ClassifierConfig;
use crate::errors::{ClassifierError, ClassifierResult};
use crate::models::Job;
use crate::utils::BackoffPolicy;

#[derive(Debug, Serialize)]
struct ClassificationRequest<'a> {
    inputs: &'a str,
    parameters: ClassificationParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ClassificationParameters<'a> {
    candidate_labels: &'a [String],
}

/// Both response shapes the inference API is known to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ClassificationResponse {
    /// `{"sequence": ..., "labels": [...], "scores": [...]}`
    Ranked { labels: Vec<String>, scores: Vec<f64> },
    /// `[{"label": ..., "score": ...}, ...]`
    Scored(Vec<LabelScore>),
}

#[derive(Debug, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl ClassificationResponse {
    /// Highest scoring label, regardless of threshold.
    pub fn top(self) -> Option<(String, f64)> {
        let pairs: Vec<(String, f64)> = match self {
            ClassificationResponse::Ranked { labels, scores } => {
                labels.into_iter().zip(scores).collect()
            }
            ClassificationResponse::Scored(items) => {
                items.into_iter().map(|item| (item.label, item.score)).collect()
            }
        };
        pairs.into_iter().max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Top label when its score reaches `threshold`.
pub fn select_label(response: ClassificationResponse, threshold: f64) -> Option<String> {
    let (label, score) = response.top()?;
    if score >= threshold {
        Some(label)
    } else {
        debug!(
            "Top label '{}' scored {:.3}, below threshold {:.3}",
            label, score, threshold
        );
        None
    }
}

pub struct ZeroShotClassifier {
    client: Client,
    api_url: String,
    token: String,
    labels: Vec<String>,
    threshold: f64,
    model_loading_delay: Duration,
    request_delay: Duration,
    backoff: BackoffPolicy,
}

impl ZeroShotClassifier {
    /// Build the classifier when it is enabled and a token is configured.
    ///
    /// Returning `None` turns categorization off for the lifetime of the
    /// process; the pipeline checks this once.
    pub fn from_config(config: &ClassifierConfig) -> Option<Self> {
        if !config.enabled {
            info!("Classifier disabled in configuration");
            return None;
        }

        let Some(token) = config.token.clone().filter(|t| !t.trim().is_empty()) else {
            info!("HUGGINGFACE_TOKEN not set, jobs will be stored without a category");
            return None;
        };

        let client = match Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build classifier HTTP client, classifier disabled: {}", e);
                return None;
            }
        };

        info!(
            "Classifier enabled with {} candidate labels (threshold {})",
            config.labels.len(),
            config.confidence_threshold
        );

        Some(Self {
            client,
            api_url: config.api_url.clone(),
            token,
            labels: config.labels.clone(),
            threshold: config.confidence_threshold,
            model_loading_delay: Duration::from_secs(config.model_loading_retry_secs),
            request_delay: Duration::from_millis(config.request_delay_ms),
            backoff: BackoffPolicy::from(&config.rate_limit),
        })
    }

    /// Category for one title, or `None` on low confidence or any failure.
    pub async fn classify(&self, title: &str) -> Option<String> {
        match self.request_with_retry(title).await {
            Ok(response) => select_label(response, self.threshold),
            Err(e) => {
                warn!("Classification failed for '{}': {}", title, e);
                None
            }
        }
    }

    /// Categorize every job that has no category yet; returns how many
    /// received one. Calls are paced by the configured request delay.
    pub async fn classify_all(&self, jobs: &mut [Job]) -> usize {
        let mut classified = 0;
        let mut calls = 0usize;

        for job in jobs.iter_mut().filter(|job| job.category.is_none()) {
            if calls > 0 && !self.request_delay.is_zero() {
                sleep(self.request_delay).await;
            }
            calls += 1;

            if let Some(category) = self.classify(&job.title).await {
                debug!("Classified '{}' as {}", job.title, category);
                job.category = Some(category);
                classified += 1;
            }
        }

        info!("Classified {} of {} jobs", classified, calls);
        classified
    }

    /// A 503 is retried once and does not count towards the rate-limit
    /// budget; 429s get up to `max_attempts` calls of their own.
    async fn request_with_retry(&self, title: &str) -> ClassifierResult<ClassificationResponse> {
        let mut model_loading_retried = false;
        let mut rate_limited = 0u32;

        loop {
            match self.request(title).await {
                Ok(response) => return Ok(response),
                Err(ClassifierError::ModelLoading) if !model_loading_retried => {
                    model_loading_retried = true;
                    info!(
                        "Classifier model is loading, retrying in {:?}",
                        self.model_loading_delay
                    );
                    sleep(self.model_loading_delay).await;
                }
                Err(ClassifierError::RateLimited { retry_after })
                    if self.backoff.should_retry(rate_limited + 1) =>
                {
                    rate_limited += 1;
                    let delay = retry_after
                        .map(Duration::from_secs)
                        .unwrap_or_else(|| self.backoff.delay_for(rate_limited - 1))
                        .min(self.backoff.max_delay);
                    warn!(
                        "Classifier rate limited (attempt {}/{}), backing off {:?}",
                        rate_limited, self.backoff.max_attempts, delay
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request(&self, title: &str) -> ClassifierResult<ClassificationResponse> {
        let body = ClassificationRequest {
            inputs: title,
            parameters: ClassificationParameters {
                candidate_labels: &self.labels,
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::SERVICE_UNAVAILABLE => Err(ClassifierError::ModelLoading),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.trim().parse::<u64>().ok());
                Err(ClassifierError::RateLimited { retry_after })
            }
            s if s.is_success() => {
                let text = response.text().await?;
                serde_json::from_str(&text).map_err(|e| ClassifierError::Decode {
                    message: e.to_string(),
                })
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(ClassifierError::Http {
                    status: status.as_u16(),
                    message: message.chars().take(200).collect(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ClassificationResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_ranked_response_shape() {
        let response = parse(
            r#"{"sequence":"Firmware Intern","labels":["Electrical Engineering","Computer Science"],"scores":[0.81,0.19]}"#,
        );
        assert_eq!(
            select_label(response, 0.5),
            Some("Electrical Engineering".to_string())
        );
    }

    #[test]
    fn test_scored_list_response_shape() {
        let response = parse(
            r#"[{"label":"Civil Engineering","score":0.12},{"label":"Computer Science","score":0.74}]"#,
        );
        assert_eq!(select_label(response, 0.5), Some("Computer Science".to_string()));
    }

    #[test]
    fn test_low_confidence_is_absent() {
        let response = parse(r#"{"labels":["Computer Science"],"scores":[0.4]}"#);
        assert_eq!(select_label(response, 0.5), None);
    }

    #[test]
    fn test_score_equal_to_threshold_is_accepted() {
        let response = parse(r#"{"labels":["Computer Science"],"scores":[0.5]}"#);
        assert_eq!(select_label(response, 0.5), Some("Computer Science".to_string()));
    }

    #[test]
    fn test_empty_response_is_absent() {
        assert_eq!(select_label(parse("[]"), 0.0), None);
    }

    #[test]
    fn test_request_body_shape() {
        let labels = vec!["Computer Science".to_string()];
        let body = ClassificationRequest {
            inputs: "SWE Intern",
            parameters: ClassificationParameters {
                candidate_labels: &labels,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "inputs": "SWE Intern",
                "parameters": { "candidate_labels": ["Computer Science"] }
            })
        );
    }

    #[test]
    fn test_missing_token_disables_classifier() {
        let config = ClassifierConfig::default();
        assert!(ZeroShotClassifier::from_config(&config).is_none());

        let config = ClassifierConfig {
            token: Some("hf_test".to_string()),
            enabled: false,
            ..ClassifierConfig::default()
        };
        assert!(ZeroShotClassifier::from_config(&config).is_none());

        let config = ClassifierConfig {
            token: Some("hf_test".to_string()),
            ..ClassifierConfig::default()
        };
        assert!(ZeroShotClassifier::from_config(&config).is_some());
    }
}
