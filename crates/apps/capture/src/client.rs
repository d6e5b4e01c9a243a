use color_eyre::Result;
use color_eyre::eyre::eyre;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Client-side view of the server's batch acknowledgment.
#[derive(Debug, Deserialize)]
pub struct SubmitAck {
    pub status: String,
    pub message: String,
    pub queue_position: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryMetrics {
    pub total_entries: usize,
    pub average_attentiveness: f64,
    pub average_eye_contact: f64,
    pub average_posture: f64,
    pub total_focus_duration: i64,
}

#[derive(Debug, Deserialize)]
pub struct SessionSummary {
    pub metrics: SummaryMetrics,
    pub analysis: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SummaryReply {
    Report(SessionSummary),
    NoData { message: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StatusReply {
    Entry {
        timestamp: String,
        attentiveness_rating: f64,
        eye_contact_score: f64,
        posture_score: f64,
        focus_duration: i64,
        comment: String,
    },
    NoData {
        message: String,
    },
}

/// Thin HTTP client for the monitoring server, scoped to one session.
pub struct MonitorClient {
    http: Client,
    base_url: String,
    job_id: String,
}

impl MonitorClient {
    #[must_use]
    pub fn new(base_url: &str, job_id: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            job_id: job_id.to_string(),
        }
    }

    /// Submits a batch of snapshot paths for analysis.
    pub async fn analyze_images(&self, image_paths: &[String]) -> Result<SubmitAck> {
        let response = self
            .http
            .post(format!("{}/analyze_student_images", self.base_url))
            .json(&json!({ "job_id": self.job_id, "image_paths": image_paths }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Fetches the latest recorded entry for the session.
    pub async fn job_status(&self) -> Result<StatusReply> {
        let response = self
            .http
            .post(format!("{}/job_status", self.base_url))
            .json(&json!({ "job_id": self.job_id }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Fetches the aggregated session report.
    pub async fn session_summary(&self) -> Result<SummaryReply> {
        let response = self
            .http
            .post(format!("{}/analyze_job", self.base_url))
            .json(&json!({ "job_id": self.job_id }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(eyre!("server returned {status}: {body}"));
        }
        Ok(response.json().await?)
    }
}
