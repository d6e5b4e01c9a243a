use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub api: ApiSettings,
    pub analysis: AnalysisSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer.
    pub allowed_origins: Vec<String>,
}

/// Connection details for the external vision-language service.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisSettings {
    /// Base URL of an OpenAI-compatible chat completions endpoint.
    pub base_url: String,
    pub model: String,
    /// Bearer token for the service; omitted for unauthenticated local servers.
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// Directory holding one session log per job.
    pub log_dir: PathBuf,
}
