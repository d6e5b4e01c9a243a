use app_state::AppSettings;
use axum::extract::FromRef;
use common_services::analysis::VisionBackend;
use common_services::queue::JobRegistry;
use common_services::session_store::SessionStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiContext {
    pub settings: AppSettings,
    pub store: SessionStore,
    pub registry: Arc<JobRegistry>,
    pub vision: Arc<dyn VisionBackend>,
}

// These impls let handlers and extractors pull out just the part of the state
// they need.
impl FromRef<ApiContext> for AppSettings {
    fn from_ref(state: &ApiContext) -> Self {
        state.settings.clone()
    }
}

impl FromRef<ApiContext> for SessionStore {
    fn from_ref(state: &ApiContext) -> Self {
        state.store.clone()
    }
}

impl FromRef<ApiContext> for Arc<JobRegistry> {
    fn from_ref(state: &ApiContext) -> Self {
        Arc::clone(&state.registry)
    }
}
