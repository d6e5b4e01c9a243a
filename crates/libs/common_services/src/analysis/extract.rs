use tracing::warn;

/// Observation window one batch is assumed to cover; the focus percentage the
/// service reports is converted to seconds against this window.
const BATCH_WINDOW_SECONDS: f64 = 60.0;

/// Metric fields scanned out of the analysis prose. Fields whose marker line
/// is absent or unparsable keep their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMetrics {
    pub attentiveness_rating: f64,
    pub eye_contact_score: f64,
    pub posture_score: f64,
    pub focus_duration: i64,
}

impl Default for ExtractedMetrics {
    fn default() -> Self {
        Self {
            attentiveness_rating: 5.0,
            eye_contact_score: 5.0,
            posture_score: 5.0,
            focus_duration: 30,
        }
    }
}

/// Best-effort scan of the analysis reply for labeled metric lines.
///
/// The reply is unreliable prose, not a contract: markers are matched as
/// case-sensitive substrings, the value is whatever follows the last colon on
/// the line, and a field that fails to parse is logged and left at its
/// default without disturbing the remaining fields.
#[must_use]
pub fn extract_metrics(analysis: &str) -> ExtractedMetrics {
    let mut metrics = ExtractedMetrics::default();

    for line in analysis.lines() {
        let line = line.trim();

        if line.contains("ATTENTIVENESS_RATING") {
            if let Some(value) = parse_score(line) {
                metrics.attentiveness_rating = value;
            }
        } else if line.contains("EYE_CONTACT_SCORE") {
            if let Some(value) = parse_score(line) {
                metrics.eye_contact_score = value;
            }
        } else if line.contains("POSTURE_SCORE") {
            if let Some(value) = parse_score(line) {
                metrics.posture_score = value;
            }
        } else if line.contains("FOCUS_DURATION") {
            if let Some(pct) = parse_percentage(line) {
                metrics.focus_duration = (pct / 100.0 * BATCH_WINDOW_SECONDS).round() as i64;
            }
        }
    }

    metrics
}

/// Text after the last colon on the line, e.g. "METRIC: POSTURE_SCORE: 7" -> "7".
fn value_after_last_colon(line: &str) -> &str {
    line.rsplit(':').next().unwrap_or(line).trim()
}

fn parse_score(line: &str) -> Option<f64> {
    let value = value_after_last_colon(line);
    match value.parse::<f64>() {
        Ok(score) => Some(score),
        Err(error) => {
            warn!(line, %error, "could not parse metric line, keeping default");
            None
        }
    }
}

fn parse_percentage(line: &str) -> Option<f64> {
    let value = value_after_last_colon(line).replace('%', "");
    match value.trim().parse::<f64>() {
        Ok(pct) => Some(pct),
        Err(error) => {
            warn!(line, %error, "could not parse focus percentage, keeping default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_reply_parses_every_field() {
        let reply = "\
METRIC: ATTENTIVENESS_RATING: 7
METRIC: EYE_CONTACT_SCORE: 8.5
METRIC: POSTURE_SCORE: 4
METRIC: FOCUS_DURATION: 75%
Student mostly engaged, occasionally checks phone.";

        let metrics = extract_metrics(reply);
        assert_eq!(metrics.attentiveness_rating, 7.0);
        assert_eq!(metrics.eye_contact_score, 8.5);
        assert_eq!(metrics.posture_score, 4.0);
        assert_eq!(metrics.focus_duration, 45);
    }

    #[test]
    fn missing_markers_keep_defaults() {
        let metrics = extract_metrics("The student appears to be asleep.");
        assert_eq!(metrics, ExtractedMetrics::default());
    }

    #[test]
    fn malformed_value_only_affects_its_own_field() {
        let reply = "\
ATTENTIVENESS_RATING: not-a-number
EYE_CONTACT_SCORE: 9";

        let metrics = extract_metrics(reply);
        assert_eq!(metrics.attentiveness_rating, 5.0);
        assert_eq!(metrics.eye_contact_score, 9.0);
    }

    #[test]
    fn value_is_taken_after_the_last_colon() {
        let metrics = extract_metrics("1. ATTENTIVENESS_RATING (1-10): overall: 6");
        assert_eq!(metrics.attentiveness_rating, 6.0);
    }

    #[test]
    fn focus_percentage_rounds_to_nearest_second() {
        // 33% of a 60 second window is 19.8 seconds.
        let metrics = extract_metrics("FOCUS_DURATION: 33");
        assert_eq!(metrics.focus_duration, 20);
    }

    #[test]
    fn markers_are_case_sensitive() {
        let metrics = extract_metrics("attentiveness_rating: 2");
        assert_eq!(metrics.attentiveness_rating, 5.0);
    }

    #[test]
    fn prompt_echo_without_value_keeps_default() {
        // The service sometimes echoes the instruction text back.
        let reply = "2. EYE_CONTACT_SCORE (1-10): Rate how well the student maintains eye contact";
        let metrics = extract_metrics(reply);
        assert_eq!(metrics.eye_contact_score, 5.0);
    }
}
