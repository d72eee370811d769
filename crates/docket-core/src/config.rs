//! Configuration module
//!
//! Everything is read from the environment (optionally seeded from a `.env`
//! file) once at startup. Missing optional values fall back to the defaults
//! declared at the top of [`AppConfig::from_env`].

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// HTTP server and database pool settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    /// `compact` (default) or `json`
    pub log_format: String,
}

/// Extraction service (Gemini) settings and enqueue throttling.
#[derive(Clone, Debug)]
pub struct ExtractionConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base_url: String,
    pub request_timeout_secs: u64,
    /// Lower bound of the random delay before a new extraction job becomes
    /// eligible. Spreads bulk uploads out so the extraction service is not
    /// hit by a burst of concurrent calls.
    pub delay_min_secs: u64,
    /// Upper bound (inclusive) of the random enqueue delay.
    pub delay_max_secs: u64,
}

/// Background task queue settings
#[derive(Clone, Debug)]
pub struct TaskQueueSettings {
    pub max_workers: usize,
    pub poll_interval_ms: u64,
    pub max_retries: i32,
    pub timeout_seconds: i32,
    /// 0 disables the stale task reaper
    pub stale_task_reap_interval_secs: u64,
    pub stale_task_grace_period_secs: i64,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub max_upload_size_bytes: usize,
    pub extraction: ExtractionConfig,
    pub task_queue: TaskQueueSettings,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

impl Config {
    fn inner(&self) -> &AppConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = AppConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_bytes
    }

    pub fn extraction(&self) -> &ExtractionConfig {
        &self.inner().extraction
    }

    pub fn task_queue(&self) -> &TaskQueueSettings {
        &self.inner().task_queue
    }

    /// Inclusive range of the random enqueue delay, in seconds
    pub fn extraction_delay_range(&self) -> (u64, u64) {
        let e = &self.inner().extraction;
        (e.delay_min_secs, e.delay_max_secs)
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().extraction.request_timeout_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const SERVER_PORT: u16 = 3000;
        const MAX_UPLOAD_SIZE_MB: usize = 20;
        const GEMINI_MODEL: &str = "gemini-1.5-flash";
        const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
        const EXTRACTION_TIMEOUT_SECS: u64 = 120;
        const EXTRACTION_DELAY_MIN_SECS: u64 = 10;
        const EXTRACTION_DELAY_MAX_SECS: u64 = 20;
        const TASK_MAX_WORKERS: usize = 4;
        const TASK_POLL_INTERVAL_MS: u64 = 1000;
        const TASK_MAX_RETRIES: i32 = 3;
        const TASK_TIMEOUT_SECS: i32 = 300;
        const STALE_TASK_REAP_INTERVAL_SECS: u64 = 60;
        const STALE_TASK_GRACE_PERIOD_SECS: i64 = 120;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "compact".to_string())
                .to_lowercase(),
        };

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<StorageBackend>()?;

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let extraction = ExtractionConfig {
            gemini_api_key: env::var("GEMINI_API_KEY")
                .or_else(|_| env::var("GOOGLE_API_KEY"))
                .ok(),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| GEMINI_MODEL.to_string()),
            gemini_api_base_url: env::var("GEMINI_API_BASE_URL")
                .unwrap_or_else(|_| GEMINI_API_BASE_URL.to_string()),
            request_timeout_secs: env::var("EXTRACTION_TIMEOUT_SECS")
                .unwrap_or_else(|_| EXTRACTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(EXTRACTION_TIMEOUT_SECS),
            delay_min_secs: env::var("EXTRACTION_DELAY_MIN_SECS")
                .unwrap_or_else(|_| EXTRACTION_DELAY_MIN_SECS.to_string())
                .parse()
                .unwrap_or(EXTRACTION_DELAY_MIN_SECS),
            delay_max_secs: env::var("EXTRACTION_DELAY_MAX_SECS")
                .unwrap_or_else(|_| EXTRACTION_DELAY_MAX_SECS.to_string())
                .parse()
                .unwrap_or(EXTRACTION_DELAY_MAX_SECS),
        };

        let task_queue = TaskQueueSettings {
            max_workers: env::var("TASK_MAX_WORKERS")
                .unwrap_or_else(|_| TASK_MAX_WORKERS.to_string())
                .parse()
                .unwrap_or(TASK_MAX_WORKERS),
            poll_interval_ms: env::var("TASK_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| TASK_POLL_INTERVAL_MS.to_string())
                .parse()
                .unwrap_or(TASK_POLL_INTERVAL_MS),
            max_retries: env::var("TASK_MAX_RETRIES")
                .unwrap_or_else(|_| TASK_MAX_RETRIES.to_string())
                .parse()
                .unwrap_or(TASK_MAX_RETRIES),
            timeout_seconds: env::var("TASK_TIMEOUT_SECS")
                .unwrap_or_else(|_| TASK_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(TASK_TIMEOUT_SECS),
            stale_task_reap_interval_secs: env::var("STALE_TASK_REAP_INTERVAL_SECS")
                .unwrap_or_else(|_| STALE_TASK_REAP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(STALE_TASK_REAP_INTERVAL_SECS),
            stale_task_grace_period_secs: env::var("STALE_TASK_GRACE_PERIOD_SECS")
                .unwrap_or_else(|_| STALE_TASK_GRACE_PERIOD_SECS.to_string())
                .parse()
                .unwrap_or(STALE_TASK_GRACE_PERIOD_SECS),
        };

        let config = AppConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: Some(
                env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./storage".to_string()),
            ),
            local_storage_base_url: Some(
                env::var("LOCAL_STORAGE_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3000/files".to_string()),
            ),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            extraction,
            task_queue,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.extraction.delay_min_secs > self.extraction.delay_max_secs {
            return Err(anyhow::anyhow!(
                "EXTRACTION_DELAY_MIN_SECS ({}) must not exceed EXTRACTION_DELAY_MAX_SECS ({})",
                self.extraction.delay_min_secs,
                self.extraction.delay_max_secs
            ));
        }

        if self.task_queue.max_workers == 0 {
            return Err(anyhow::anyhow!("TASK_MAX_WORKERS must be at least 1"));
        }

        if self.task_queue.max_retries < 0 {
            return Err(anyhow::anyhow!("TASK_MAX_RETRIES must not be negative"));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
