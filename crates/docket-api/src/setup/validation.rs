//! Configuration validation
//!
//! Checks that only matter to the server process. Field-level checks live in
//! `Config::validate` and already ran when the config was loaded.

use anyhow::Result;
use docket_core::Config;

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production. \
            Set specific allowed origins via CORS_ORIGINS."
        ));
    }

    if config.db_max_connections() == 0 {
        return Err(anyhow::anyhow!("Database max connections cannot be 0"));
    }

    if config.db_timeout_seconds() == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }

    if config.extraction().gemini_api_key.is_none() {
        return Err(anyhow::anyhow!(
            "GEMINI_API_KEY must be set; uploaded files cannot be extracted without it"
        ));
    }

    let task_queue = config.task_queue();
    if task_queue.timeout_seconds <= 0 {
        return Err(anyhow::anyhow!("TASK_TIMEOUT_SECS must be greater than 0"));
    }

    if config.extraction_timeout().as_secs() >= task_queue.timeout_seconds as u64 {
        tracing::warn!(
            extraction_timeout_secs = config.extraction_timeout().as_secs(),
            task_timeout_secs = task_queue.timeout_seconds,
            "Extraction request timeout is not shorter than the task timeout"
        );
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
