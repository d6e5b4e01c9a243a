use crate::api_state::ApiContext;
use crate::jobs::handlers::{
    analyze_job_handler, analyze_student_images_handler, create_job_handler, job_status_handler,
};
use axum::{Router, routing::post};

pub fn jobs_public_router() -> Router<ApiContext> {
    Router::new()
        .route("/create_job", post(create_job_handler))
        .route("/analyze_student_images", post(analyze_student_images_handler))
        .route("/analyze_job", post(analyze_job_handler))
        .route("/job_status", post(job_status_handler))
}
