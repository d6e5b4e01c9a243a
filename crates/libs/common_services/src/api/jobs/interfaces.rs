use crate::analysis::aggregate::{RawSessionData, SessionMetrics};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateJobRequest {
    pub job_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeImagesRequest {
    pub job_id: String,
    pub image_paths: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
}

/// Shared request body for the per-job read endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JobRequest {
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    Processing,
    Queued,
}

/// Immediate acknowledgment for a submitted batch. `queue_position` is only
/// present when the batch had to queue behind earlier work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub status: SubmitStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SessionReport {
    pub metrics: SessionMetrics,
    /// Narrative synthesis from the external service.
    pub analysis: String,
    pub raw_data: RawSessionData,
}

/// A job report, or a plain message when the job exists but has no entries.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum JobReportResponse {
    Report(Box<SessionReport>),
    NoData(MessageResponse),
}

/// The latest entry's metric fields, timestamp formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LatestStatus {
    pub timestamp: String,
    pub attentiveness_rating: f64,
    pub eye_contact_score: f64,
    pub posture_score: f64,
    pub focus_duration: i64,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum JobStatusResponse {
    Status(LatestStatus),
    NoData(MessageResponse),
}
