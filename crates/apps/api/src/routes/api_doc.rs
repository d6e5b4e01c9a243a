use crate::routes::{jobs, root};
use common_services::analysis::aggregate::{RawSessionData, SessionMetrics};
use common_services::api::jobs::interfaces::{
    AnalyzeImagesRequest, CreateJobRequest, JobRequest, LatestStatus, MessageResponse,
    SessionReport, SubmitResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        root::handlers::root,
        root::handlers::health_check,
        // Job handlers
        jobs::handlers::create_job_handler,
        jobs::handlers::analyze_student_images_handler,
        jobs::handlers::analyze_job_handler,
        jobs::handlers::job_status_handler,
    ),
    components(
        schemas(
            CreateJobRequest,
            AnalyzeImagesRequest,
            JobRequest,
            MessageResponse,
            SubmitResponse,
            SessionReport,
            SessionMetrics,
            RawSessionData,
            LatestStatus,
        ),
    ),
    tags(
        (name = "Jobs", description = "Monitoring session endpoints: batch submission, status and reports"),
        (name = "System", description = "Health check"),
    )
)]
pub struct ApiDoc;
