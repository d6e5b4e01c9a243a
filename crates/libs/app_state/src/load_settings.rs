use crate::AppSettings;
use color_eyre::eyre::Result;
use std::fs;
use std::path::{Path, absolute};

/// Loads settings from `config/settings.yaml`, with `.env` and
/// `APP__`-prefixed environment variables layered on top
/// (e.g. `APP__ANALYSIS__API_KEY`).
pub fn load_app_settings() -> Result<AppSettings> {
    // dotenv first so env overrides pick up values from .env too.
    dotenv::from_path(".env").ok();
    let config_path = Path::new("config/settings.yaml").canonicalize()?;

    let builder = config::Config::builder()
        .add_source(config::File::from(config_path))
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

    let mut settings = builder.build()?.try_deserialize::<AppSettings>()?;
    settings.storage.log_dir = absolute(&settings.storage.log_dir)?;
    fs::create_dir_all(&settings.storage.log_dir)?;

    Ok(settings)
}
