use crate::api_state::ApiContext;
use axum::extract::State;
use axum::http::StatusCode;
use tokio::fs;
use tracing::error;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Root message")
    )
)]
pub async fn root() -> &'static str {
    "Student attention monitor"
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, description = "API is healthy and ready to accept traffic", body = String),
        (status = 503, description = "API is not healthy, likely because the session log directory is unavailable.")
    )
)]
pub async fn health_check(State(context): State<ApiContext>) -> Result<&'static str, StatusCode> {
    match fs::metadata(&context.settings.storage.log_dir).await {
        Ok(meta) if meta.is_dir() => Ok("OK"),
        _ => {
            error!("Health check failed: session log directory is unavailable");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
