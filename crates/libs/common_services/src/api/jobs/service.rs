use crate::analysis::VisionBackend;
use crate::analysis::aggregate::{raw_session_data, session_metrics, summary_prompt};
use crate::api::jobs::error::JobsError;
use crate::api::jobs::interfaces::{
    JobReportResponse, JobStatusResponse, LatestStatus, MessageResponse, SessionReport,
    SubmitResponse, SubmitStatus,
};
use crate::queue::{Admission, JobRegistry};
use crate::session_store::SessionStore;
use common_types::ImageBatch;
use tracing::info;

/// Explicit job creation. Fails when the job already has a session log.
pub async fn create_job(store: &SessionStore, job_id: &str) -> Result<MessageResponse, JobsError> {
    if job_id.is_empty() {
        return Err(JobsError::EmptyJobId);
    }
    store.create(job_id).await?;
    Ok(MessageResponse {
        message: format!("Job {job_id} created successfully"),
    })
}

/// Admits a batch for the job, creating the job on first sight, and returns
/// the caller's queue feedback without waiting for processing.
pub async fn submit_batch(
    store: &SessionStore,
    registry: &JobRegistry,
    job_id: &str,
    batch: ImageBatch,
) -> Result<SubmitResponse, JobsError> {
    if job_id.is_empty() {
        return Err(JobsError::EmptyJobId);
    }
    if store.ensure_created(job_id).await? {
        info!(job_id, "created new job on first analysis request");
    }

    let response = match registry.submit(job_id, batch) {
        Admission::Started => SubmitResponse {
            status: SubmitStatus::Processing,
            message: format!("Processing started for job {job_id}"),
            queue_position: None,
        },
        Admission::Queued { position } => SubmitResponse {
            status: SubmitStatus::Queued,
            message: format!("Job {job_id} is queued for processing"),
            queue_position: Some(position),
        },
    };
    Ok(response)
}

/// Builds the session-level report: summary statistics plus a narrative
/// synthesized by the external service. Read-only; safe to call repeatedly.
pub async fn job_report(
    store: &SessionStore,
    backend: &dyn VisionBackend,
    job_id: &str,
) -> Result<JobReportResponse, JobsError> {
    let entries = store.read_all(job_id).await?;
    let Some(metrics) = session_metrics(&entries) else {
        return Ok(JobReportResponse::NoData(MessageResponse {
            message: "No data recorded for this job".to_string(),
        }));
    };

    let prompt = summary_prompt(&metrics, &entries);
    let analysis = backend.analyze(&prompt, &[]).await?;

    Ok(JobReportResponse::Report(Box::new(SessionReport {
        metrics,
        analysis,
        raw_data: raw_session_data(&entries),
    })))
}

/// The most recent metric entry for the job, formatted for display.
pub async fn job_status(
    store: &SessionStore,
    job_id: &str,
) -> Result<JobStatusResponse, JobsError> {
    let entries = store.read_all(job_id).await?;
    let Some(latest) = entries.last() else {
        return Ok(JobStatusResponse::NoData(MessageResponse {
            message: "No data recorded for this job".to_string(),
        }));
    };

    Ok(JobStatusResponse::Status(LatestStatus {
        timestamp: latest.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        attentiveness_rating: latest.attentiveness_rating,
        eye_contact_score: latest.eye_contact_score,
        posture_score: latest.posture_score,
        focus_duration: latest.focus_duration,
        comment: latest.comment.clone(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisPipeline;
    use async_trait::async_trait;
    use color_eyre::Result;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct StubVision {
        batch_reply: String,
        /// When set, batch analysis blocks until the test adds permits,
        /// keeping the job busy while further submissions arrive.
        gate: Option<Arc<tokio::sync::Semaphore>>,
    }

    #[async_trait]
    impl VisionBackend for StubVision {
        async fn analyze(&self, _prompt: &str, images: &[Vec<u8>]) -> Result<String> {
            if images.is_empty() {
                // Narrative synthesis for the session report.
                return Ok("OVERALL_SUMMARY: solid session".to_string());
            }
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            Ok(self.batch_reply.clone())
        }
    }

    struct Harness {
        _dir: TempDir,
        store: SessionStore,
        registry: JobRegistry,
        vision: Arc<StubVision>,
    }

    fn harness(batch_reply: &str) -> Harness {
        harness_with_gate(batch_reply, None)
    }

    fn harness_with_gate(
        batch_reply: &str,
        gate: Option<Arc<tokio::sync::Semaphore>>,
    ) -> Harness {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("logs"));
        let vision = Arc::new(StubVision {
            batch_reply: batch_reply.to_string(),
            gate,
        });
        let pipeline = AnalysisPipeline::new(store.clone(), vision.clone());
        let registry = JobRegistry::new(Arc::new(pipeline));
        Harness {
            _dir: dir,
            store,
            registry,
            vision,
        }
    }

    fn snapshot(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, b"fake jpeg bytes").unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn create_job_then_duplicate_is_rejected() {
        let h = harness("");

        let response = create_job(&h.store, "s1").await.unwrap();
        assert_eq!(response.message, "Job s1 created successfully");

        let err = create_job(&h.store, "s1").await.unwrap_err();
        assert!(matches!(err, JobsError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn empty_job_id_is_rejected() {
        let h = harness("");
        assert!(matches!(
            create_job(&h.store, "").await.unwrap_err(),
            JobsError::EmptyJobId
        ));
        assert!(matches!(
            submit_batch(&h.store, &h.registry, "", ImageBatch::default())
                .await
                .unwrap_err(),
            JobsError::EmptyJobId
        ));
    }

    #[tokio::test]
    async fn two_quick_batches_process_then_queue_and_both_land() {
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let h = harness_with_gate(
            "METRIC: ATTENTIVENESS_RATING: 7\nWatching intently.",
            Some(gate.clone()),
        );
        create_job(&h.store, "s1").await.unwrap();

        let a = ImageBatch::new(
            vec![snapshot(&h._dir, "a1.jpg"), snapshot(&h._dir, "a2.jpg")],
            vec![],
        );
        let b = ImageBatch::new(vec![snapshot(&h._dir, "b1.jpg")], vec![]);

        // The gate holds batch A in-flight, so B must observe a busy job.
        let first = submit_batch(&h.store, &h.registry, "s1", a).await.unwrap();
        let second = submit_batch(&h.store, &h.registry, "s1", b).await.unwrap();

        assert_eq!(first.status, SubmitStatus::Processing);
        assert_eq!(first.queue_position, None);
        assert_eq!(second.status, SubmitStatus::Queued);
        assert_eq!(second.queue_position, Some(1));

        gate.add_permits(2);
        h.registry.wait_until_idle("s1").await;

        let report = job_report(&h.store, h.vision.as_ref(), "s1")
            .await
            .unwrap();
        let JobReportResponse::Report(report) = report else {
            panic!("expected a full report");
        };
        assert_eq!(report.metrics.total_entries, 2);
        assert_eq!(report.metrics.average_attentiveness, 7.0);
        assert_eq!(report.analysis, "OVERALL_SUMMARY: solid session");
    }

    #[tokio::test]
    async fn submit_creates_unknown_job_implicitly() {
        let h = harness("METRIC: ATTENTIVENESS_RATING: 6");

        let batch = ImageBatch::new(vec![snapshot(&h._dir, "f.jpg")], vec![]);
        let response = submit_batch(&h.store, &h.registry, "fresh", batch)
            .await
            .unwrap();
        assert_eq!(response.status, SubmitStatus::Processing);
        assert!(h.store.exists("fresh").await.unwrap());

        h.registry.wait_until_idle("fresh").await;
    }

    #[tokio::test]
    async fn unloadable_batch_leaves_job_empty_and_report_says_no_data() {
        let h = harness("irrelevant");

        let batch = ImageBatch::new(vec!["/missing/frame.jpg".to_string()], vec![]);
        submit_batch(&h.store, &h.registry, "s1", batch)
            .await
            .unwrap();
        h.registry.wait_until_idle("s1").await;

        let report = job_report(&h.store, h.vision.as_ref(), "s1")
            .await
            .unwrap();
        assert!(matches!(report, JobReportResponse::NoData(_)));

        let status = job_status(&h.store, "s1").await.unwrap();
        assert!(matches!(status, JobStatusResponse::NoData(_)));
    }

    #[tokio::test]
    async fn report_on_unknown_job_is_not_found() {
        let h = harness("");
        let err = job_report(&h.store, h.vision.as_ref(), "ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, JobsError::NotFound(id) if id == "ghost"));

        let err = job_status(&h.store, "ghost").await.unwrap_err();
        assert!(matches!(err, JobsError::NotFound(_)));
    }

    #[tokio::test]
    async fn report_is_idempotent_without_new_batches() {
        let h = harness("METRIC: POSTURE_SCORE: 8\nUpright.");

        let batch = ImageBatch::new(vec![snapshot(&h._dir, "f.jpg")], vec![]);
        submit_batch(&h.store, &h.registry, "s1", batch)
            .await
            .unwrap();
        h.registry.wait_until_idle("s1").await;

        let first = job_report(&h.store, h.vision.as_ref(), "s1")
            .await
            .unwrap();
        let second = job_report(&h.store, h.vision.as_ref(), "s1")
            .await
            .unwrap();
        let (JobReportResponse::Report(first), JobReportResponse::Report(second)) =
            (first, second)
        else {
            panic!("expected full reports");
        };
        assert_eq!(first.metrics, second.metrics);
        assert_eq!(first.raw_data, second.raw_data);
    }

    #[tokio::test]
    async fn status_returns_latest_entry_fields_unmodified() {
        let h = harness(
            "METRIC: ATTENTIVENESS_RATING: 3\nMETRIC: EYE_CONTACT_SCORE: 2\n\
             METRIC: POSTURE_SCORE: 4\nMETRIC: FOCUS_DURATION: 10%\nBarely present.",
        );

        let batch = ImageBatch::new(vec![snapshot(&h._dir, "f.jpg")], vec![]);
        submit_batch(&h.store, &h.registry, "s1", batch)
            .await
            .unwrap();
        h.registry.wait_until_idle("s1").await;

        let status = job_status(&h.store, "s1").await.unwrap();
        let JobStatusResponse::Status(status) = status else {
            panic!("expected a status entry");
        };
        assert_eq!(status.attentiveness_rating, 3.0);
        assert_eq!(status.eye_contact_score, 2.0);
        assert_eq!(status.posture_score, 4.0);
        assert_eq!(status.focus_duration, 6);
        assert!(status.comment.contains("Barely present."));

        let entries = h.store.read_all("s1").await.unwrap();
        let expected = entries[0].timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        assert_eq!(status.timestamp, expected);
    }
}
