use crate::api_state::ApiContext;
use axum::Json;
use axum::extract::State;
use common_services::api::jobs::error::JobsError;
use common_services::api::jobs::interfaces::{
    AnalyzeImagesRequest, CreateJobRequest, JobReportResponse, JobRequest, JobStatusResponse,
    LatestStatus, MessageResponse, SessionReport, SubmitResponse,
};
use common_services::api::jobs::service::{create_job, job_report, job_status, submit_batch};
use common_types::ImageBatch;
use tracing::instrument;

/// Explicitly create a monitoring job.
///
/// # Errors
///
/// Returns a `JobsError` if the job already exists or the session log cannot
/// be created.
#[utoipa::path(
    post,
    path = "/create_job",
    tag = "Jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 200, description = "Job created.", body = MessageResponse),
        (status = 400, description = "Job ID already exists or is empty."),
        (status = 500, description = "The session log could not be created."),
    )
)]
#[instrument(skip(context), err(Debug))]
pub async fn create_job_handler(
    State(context): State<ApiContext>,
    Json(request): Json<CreateJobRequest>,
) -> Result<Json<MessageResponse>, JobsError> {
    let response = create_job(&context.store, &request.job_id).await?;
    Ok(Json(response))
}

/// Submit a snapshot batch for analysis.
///
/// The batch is admitted immediately: it either starts processing or joins the
/// job's queue, and the response tells the caller which. Unknown jobs are
/// created on first submission.
///
/// # Errors
///
/// Returns a `JobsError` if the job id is empty or storage fails.
#[utoipa::path(
    post,
    path = "/analyze_student_images",
    tag = "Jobs",
    request_body = AnalyzeImagesRequest,
    responses(
        (status = 200, description = "Batch admitted; processing or queued.", body = SubmitResponse),
        (status = 400, description = "Job ID is empty."),
        (status = 500, description = "The session log could not be created."),
    )
)]
#[instrument(skip(context, request), fields(job_id = %request.job_id), err(Debug))]
pub async fn analyze_student_images_handler(
    State(context): State<ApiContext>,
    Json(request): Json<AnalyzeImagesRequest>,
) -> Result<Json<SubmitResponse>, JobsError> {
    let batch = ImageBatch::new(
        request.image_paths.unwrap_or_default(),
        request.image_urls.unwrap_or_default(),
    );
    let response = submit_batch(&context.store, &context.registry, &request.job_id, batch).await?;
    Ok(Json(response))
}

/// Aggregate a job's entries into a session report with a narrative summary.
///
/// # Errors
///
/// Returns a `JobsError` if the job is unknown or the narrative service call
/// fails.
#[utoipa::path(
    post,
    path = "/analyze_job",
    tag = "Jobs",
    request_body = JobRequest,
    responses(
        (status = 200, description = "Session report, or a message when the job has no entries.", body = SessionReport),
        (status = 404, description = "Job not found."),
        (status = 500, description = "Aggregation or the narrative service failed."),
    )
)]
#[instrument(skip(context), err(Debug))]
pub async fn analyze_job_handler(
    State(context): State<ApiContext>,
    Json(request): Json<JobRequest>,
) -> Result<Json<JobReportResponse>, JobsError> {
    let response = job_report(&context.store, context.vision.as_ref(), &request.job_id).await?;
    Ok(Json(response))
}

/// The latest metric entry recorded for a job.
///
/// # Errors
///
/// Returns a `JobsError` if the job is unknown or its log cannot be read.
#[utoipa::path(
    post,
    path = "/job_status",
    tag = "Jobs",
    request_body = JobRequest,
    responses(
        (status = 200, description = "Latest entry, or a message when the job has no entries.", body = LatestStatus),
        (status = 404, description = "Job not found."),
        (status = 500, description = "The session log could not be read."),
    )
)]
#[instrument(skip(context), err(Debug))]
pub async fn job_status_handler(
    State(context): State<ApiContext>,
    Json(request): Json<JobRequest>,
) -> Result<Json<JobStatusResponse>, JobsError> {
    let response = job_status(&context.store, &request.job_id).await?;
    Ok(Json(response))
}
