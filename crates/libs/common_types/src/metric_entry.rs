use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The structured result of analyzing one image batch, appended to a job's
/// session log. Field order matches the session log columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricEntry {
    pub timestamp: DateTime<Utc>,
    /// Overall attentiveness on a 1-10 scale.
    pub attentiveness_rating: f64,
    /// The full analysis text the vision service returned for this batch.
    pub comment: String,
    /// Screen eye contact on a 1-10 scale.
    pub eye_contact_score: f64,
    /// Sitting posture on a 1-10 scale.
    pub posture_score: f64,
    /// Seconds of focus attributed to this batch's observation window.
    pub focus_duration: i64,
}
