use crate::analysis::extract::extract_metrics;
use crate::analysis::prompts::ATTENTION_PROMPT;
use crate::queue::BatchProcessor;
use crate::session_store::SessionStore;
use async_trait::async_trait;
use chrono::Utc;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use common_types::{ImageBatch, MetricEntry};
use std::sync::Arc;
use tracing::{debug, warn};
use vision_model::VisionClient;

/// Converts an instruction prompt plus images into free-form analysis text.
///
/// The seam between the pipeline/aggregator and the external service, so tests
/// can substitute a deterministic reply.
#[async_trait]
pub trait VisionBackend: Send + Sync + 'static {
    async fn analyze(&self, prompt: &str, images: &[Vec<u8>]) -> Result<String>;
}

#[async_trait]
impl VisionBackend for VisionClient {
    async fn analyze(&self, prompt: &str, images: &[Vec<u8>]) -> Result<String> {
        let reply = self.chat(prompt).images(images).call().await?;
        Ok(reply)
    }
}

/// The extraction pipeline one job runner executes per batch: load the batch's
/// images, send them for analysis, scan the reply for metrics, append the
/// entry to the job's session log.
pub struct AnalysisPipeline {
    store: SessionStore,
    backend: Arc<dyn VisionBackend>,
    http: reqwest::Client,
}

impl AnalysisPipeline {
    #[must_use]
    pub fn new(store: SessionStore, backend: Arc<dyn VisionBackend>) -> Self {
        Self {
            store,
            backend,
            http: reqwest::Client::new(),
        }
    }

    /// Loads every resolvable image in the batch. An unreachable URL or
    /// unreadable path only drops that image, never the batch.
    async fn load_images(&self, batch: &ImageBatch) -> Vec<Vec<u8>> {
        let mut images = Vec::new();

        for url in &batch.image_urls {
            match self.fetch_url(url).await {
                Ok(bytes) => images.push(bytes),
                Err(error) => warn!(%url, %error, "skipping unreachable image URL"),
            }
        }
        for path in &batch.image_paths {
            match tokio::fs::read(path).await {
                Ok(bytes) => images.push(bytes),
                Err(error) => warn!(%path, %error, "skipping unreadable image file"),
            }
        }

        images
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl BatchProcessor for AnalysisPipeline {
    async fn process(&self, job_id: &str, batch: ImageBatch) -> Result<()> {
        let images = self.load_images(&batch).await;
        if images.is_empty() {
            debug!(job_id, "batch yielded no loadable images, nothing recorded");
            return Ok(());
        }

        let analysis = self
            .backend
            .analyze(ATTENTION_PROMPT, &images)
            .await
            .wrap_err("vision analysis request failed")?;

        let metrics = extract_metrics(&analysis);
        let entry = MetricEntry {
            timestamp: Utc::now(),
            attentiveness_rating: metrics.attentiveness_rating,
            comment: analysis,
            eye_contact_score: metrics.eye_contact_score,
            posture_score: metrics.posture_score,
            focus_duration: metrics.focus_duration,
        };
        self.store.append(job_id, &entry).await?;
        Ok(())
    }
}
