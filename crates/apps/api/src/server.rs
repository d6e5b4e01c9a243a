use crate::api_state::ApiContext;
use crate::create_router;
use app_state::{AnalysisSettings, AppSettings};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use common_services::analysis::{AnalysisPipeline, VisionBackend};
use common_services::queue::JobRegistry;
use common_services::session_store::SessionStore;
use http::HeaderValue;
use http::header;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use vision_model::VisionClient;

pub async fn serve(settings: AppSettings) -> Result<()> {
    info!("🚀 Initializing server...");
    let store = SessionStore::new(settings.storage.log_dir.clone());
    let vision: Arc<dyn VisionBackend> = Arc::new(build_vision_client(&settings.analysis));
    let pipeline = AnalysisPipeline::new(store.clone(), Arc::clone(&vision));
    let registry = Arc::new(JobRegistry::new(Arc::new(pipeline)));

    let api_state = ApiContext {
        settings: settings.clone(),
        store,
        registry: Arc::clone(&registry),
        vision,
    };

    // --- CORS Configuration ---
    let allowed_origins: Vec<HeaderValue> = settings
        .api
        .allowed_origins
        .iter()
        .filter_map(|s| match s.parse() {
            Ok(hv) => Some(hv),
            Err(e) => {
                error!("Invalid CORS origin configured: {} - Error: {}", s, e);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods(cors::Any)
        .allow_origin(allowed_origins)
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::USER_AGENT,
        ]);

    let app = create_router(api_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", settings.api.host, settings.api.port)
        .parse()
        .map_err(|e| eyre!("Invalid address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🐸 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Admitted batches always run to completion; drain them before exit.
    info!("Draining job backlogs before exit...");
    registry.wait_all_idle().await;

    Ok(())
}

fn build_vision_client(analysis: &AnalysisSettings) -> VisionClient {
    VisionClient::with_base_url(&analysis.base_url)
        .model(analysis.model.clone())
        .maybe_api_key(analysis.api_key.clone())
        .maybe_temperature(analysis.temperature)
        .build()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
