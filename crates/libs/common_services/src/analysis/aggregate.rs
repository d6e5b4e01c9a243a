use chrono::{DateTime, Utc};
use common_types::MetricEntry;
use serde::Serialize;
use std::fmt::Write as _;
use utoipa::ToSchema;

/// Summary statistics over a job's metric entries.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SessionMetrics {
    pub total_entries: usize,
    pub average_attentiveness: f64,
    pub average_eye_contact: f64,
    pub average_posture: f64,
    pub total_focus_duration: i64,
    pub latest_comment: String,
}

/// Per-entry arrays, in processing order, for clients that chart the session.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RawSessionData {
    pub total_snapshots: usize,
    pub timestamps: Vec<DateTime<Utc>>,
    pub attentiveness_scores: Vec<f64>,
    pub eye_contact_scores: Vec<f64>,
    pub posture_scores: Vec<f64>,
    pub focus_durations: Vec<i64>,
}

/// Arithmetic means and totals over the entries; `None` when there are none.
#[must_use]
pub fn session_metrics(entries: &[MetricEntry]) -> Option<SessionMetrics> {
    let latest = entries.last()?;
    let count = entries.len() as f64;

    Some(SessionMetrics {
        total_entries: entries.len(),
        average_attentiveness: entries.iter().map(|e| e.attentiveness_rating).sum::<f64>() / count,
        average_eye_contact: entries.iter().map(|e| e.eye_contact_score).sum::<f64>() / count,
        average_posture: entries.iter().map(|e| e.posture_score).sum::<f64>() / count,
        total_focus_duration: entries.iter().map(|e| e.focus_duration).sum(),
        latest_comment: latest.comment.clone(),
    })
}

#[must_use]
pub fn raw_session_data(entries: &[MetricEntry]) -> RawSessionData {
    RawSessionData {
        total_snapshots: entries.len(),
        timestamps: entries.iter().map(|e| e.timestamp).collect(),
        attentiveness_scores: entries.iter().map(|e| e.attentiveness_rating).collect(),
        eye_contact_scores: entries.iter().map(|e| e.eye_contact_score).collect(),
        posture_scores: entries.iter().map(|e| e.posture_score).collect(),
        focus_durations: entries.iter().map(|e| e.focus_duration).collect(),
    }
}

/// Synthesis prompt for the narrative service: session statistics plus every
/// per-batch analysis, with the sections the report should contain.
#[must_use]
pub fn summary_prompt(metrics: &SessionMetrics, entries: &[MetricEntry]) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Analyze the following session metrics and provide a comprehensive summary:\n"
    );
    let _ = writeln!(prompt, "Session Statistics:");
    let _ = writeln!(prompt, "- Total Snapshots: {}", metrics.total_entries);
    let _ = writeln!(
        prompt,
        "- Average Attentiveness: {:.2}/10",
        metrics.average_attentiveness
    );
    let _ = writeln!(
        prompt,
        "- Average Eye Contact: {:.2}/10",
        metrics.average_eye_contact
    );
    let _ = writeln!(
        prompt,
        "- Average Posture: {:.2}/10",
        metrics.average_posture
    );
    let _ = writeln!(
        prompt,
        "- Total Focus Duration: {} seconds\n",
        metrics.total_focus_duration
    );
    let _ = writeln!(prompt, "Individual Analyses:");
    for entry in entries {
        let _ = writeln!(prompt, "{}", entry.comment);
    }
    prompt.push_str(
        "\nPlease provide a structured analysis with the following sections:\n\
         1. OVERALL_SUMMARY: A brief overview of the student's performance\n\
         2. NEGATIVE_OBSERVATIONS: List key negative behaviors and patterns\n\
         3. AREAS_FOR_IMPROVEMENT: List specific areas needing attention\n\
         4. RECOMMENDATIONS: Practical suggestions for improvement\n\
         5. ENGAGEMENT_PATTERN: Analysis of attention patterns over time\n",
    );
    prompt
}
