//! Optional readability scoring of predictions

use crate::error::{truncate_body, ScorerError};
use crate::generator::http_client;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

static WEIGHTED_AVERAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*weighted\s+average\s*:\s*([-+]?\d+(?:\.\d+)?)").expect("valid regex")
});

static AVERAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*average\s*:\s*([-+]?\d+(?:\.\d+)?)").expect("valid regex"));

/// Readability of one code snippet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityScore {
    /// Plain average over the scorer's criteria
    pub average: f64,
    /// Weighted average over the scorer's criteria
    pub weighted_average: f64,
}

/// External readability scorer
#[async_trait::async_trait]
pub trait ReadabilityScorer: Send + Sync {
    /// Score `code`
    async fn score(&self, code: &str) -> Result<ReadabilityScore, ScorerError>;
}

/// Score `code`, falling back to zero when the scorer fails
pub async fn score_or_zero(scorer: &dyn ReadabilityScorer, code: &str) -> ReadabilityScore {
    match scorer.score(code).await {
        Ok(score) => score,
        Err(e) => {
            tracing::warn!(error = %e, "readability scoring failed, using zero score");
            ReadabilityScore::default()
        }
    }
}

fn capture(re: &Regex, output: &str) -> Option<f64> {
    re.captures(output)?.get(1)?.as_str().parse().ok()
}

/// Pull both averages out of the scorer's text report
///
/// # Errors
/// - `ScorerError::UnparseableOutput` if neither average is present
pub fn parse_grade_output(output: &str) -> Result<ReadabilityScore, ScorerError> {
    let average = capture(&AVERAGE, output);
    let weighted = capture(&WEIGHTED_AVERAGE, output);
    match (average, weighted) {
        (Some(average), Some(weighted_average)) => Ok(ReadabilityScore {
            average,
            weighted_average,
        }),
        (Some(value), None) | (None, Some(value)) => Ok(ReadabilityScore {
            average: value,
            weighted_average: value,
        }),
        (None, None) => Err(ScorerError::UnparseableOutput(truncate_body(output))),
    }
}

#[derive(Serialize)]
struct GradeRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GradeResponse {
    output: String,
}

/// HTTP client for a code-reader grading service
#[derive(Debug, Clone)]
pub struct CodeReaderClient {
    http: reqwest::Client,
    url: String,
}

impl CodeReaderClient {
    /// Create client for the service at `base_url`
    ///
    /// # Errors
    /// - `ScorerError::Transport` if the HTTP client cannot be created
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ScorerError> {
        let http = http_client(timeout).map_err(|e| ScorerError::Transport(e.to_string()))?;
        Ok(Self::from_http(http, base_url))
    }

    fn from_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            url: format!("{}/grade", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait::async_trait]
impl ReadabilityScorer for CodeReaderClient {
    async fn score(&self, code: &str) -> Result<ReadabilityScore, ScorerError> {
        let response = self
            .http
            .post(&self.url)
            .json(&GradeRequest { text: code })
            .send()
            .await
            .map_err(|e| ScorerError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScorerError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ScorerError::Upstream {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        let graded: GradeResponse =
            serde_json::from_str(&body).map_err(|e| ScorerError::Transport(e.to_string()))?;
        parse_grade_output(&graded.output)
    }
}
