//! Configuration module for the KTP OCR service

use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};
use std::path::PathBuf;

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub upload: UploadSettings,
    pub ocr: OcrSettings,
    pub cdn: CdnSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Upload validation and temp storage
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    pub temp_dir: PathBuf,
    /// Maximum upload size in bytes
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
}

/// OCR engines configuration
///
/// Google Cloud Vision is enabled when either an API key is set or the
/// service-account credentials file exists. The PaddleOCR fallback is
/// enabled when its serving endpoint is set.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrSettings {
    pub google_credentials_path: Option<PathBuf>,
    pub google_api_key: Option<String>,
    pub vision_endpoint: String,
    pub paddle_endpoint: Option<String>,
    /// Minimum trimmed text length for an OCR result to count as meaningful
    pub min_text_len: usize,
    pub rate_limit_per_minute: u32,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

/// CDN configuration for uploading extracted signatures
#[derive(Debug, Clone, Deserialize)]
pub struct CdnSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Flat legacy variables (TEMP_DIR, MAX_FILE_SIZE, CDN_BASE_URL, ...)
    /// 2. Environment variables (prefixed with KTP_)
    /// 3. config/local.toml (gitignored)
    /// 4. config/default.toml
    /// 5. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = Self::with_defaults(Config::builder())?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(Self::prefixed_env());

        let builder = Self::with_legacy_env(builder, |key| std::env::var(key).ok())?;

        builder.build()?.try_deserialize()
    }

    /// KTP_SERVER__PORT, KTP_OCR__PADDLE_ENDPOINT, etc.
    fn prefixed_env() -> Environment {
        Environment::with_prefix("KTP")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let defaults = Settings::default();

        builder
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("upload.temp_dir", defaults.upload.temp_dir.to_string_lossy().into_owned())?
            .set_default("upload.max_file_size", defaults.upload.max_file_size)?
            .set_default("upload.allowed_extensions", defaults.upload.allowed_extensions)?
            .set_default("ocr.vision_endpoint", defaults.ocr.vision_endpoint)?
            .set_default("ocr.min_text_len", defaults.ocr.min_text_len as u64)?
            .set_default("ocr.rate_limit_per_minute", u64::from(defaults.ocr.rate_limit_per_minute))?
            .set_default("ocr.max_retries", u64::from(defaults.ocr.max_retries))?
            .set_default("ocr.timeout_secs", defaults.ocr.timeout_secs)?
            .set_default("cdn.base_url", defaults.cdn.base_url)?
            .set_default("cdn.api_key", defaults.cdn.api_key)?
            .set_default("cdn.timeout_secs", defaults.cdn.timeout_secs)
    }

    /// Apply the flat variable names used by the deployment `.env` files
    fn with_legacy_env<F>(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        lookup: F,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let extensions = non_empty("ALLOWED_EXTENSIONS").map(|v| parse_extensions(&v));
        let max_file_size = non_empty("MAX_FILE_SIZE").and_then(|v| v.trim().parse::<u64>().ok());
        let port = non_empty("PORT").and_then(|v| v.trim().parse::<u64>().ok());
        let workers = non_empty("WORKERS").and_then(|v| v.trim().parse::<u64>().ok());

        builder
            .set_override_option("server.host", non_empty("HOST"))?
            .set_override_option("server.port", port)?
            .set_override_option("server.workers", workers)?
            .set_override_option("upload.temp_dir", non_empty("TEMP_DIR"))?
            .set_override_option("upload.max_file_size", max_file_size)?
            .set_override_option("upload.allowed_extensions", extensions)?
            .set_override_option("ocr.google_credentials_path", non_empty("GOOGLE_CLOUD_CREDENTIALS_PATH"))?
            .set_override_option("ocr.google_api_key", non_empty("GOOGLE_VISION_API_KEY"))?
            .set_override_option("ocr.paddle_endpoint", non_empty("PADDLE_OCR_URL"))?
            .set_override_option("cdn.base_url", non_empty("CDN_BASE_URL"))?
            .set_override_option("cdn.api_key", non_empty("CDN_API_KEY"))
    }
}

impl UploadSettings {
    /// Human readable size limit, e.g. "10MB"
    pub fn max_size_label(&self) -> String {
        let mb = self.max_file_size as f64 / (1024.0 * 1024.0);
        if mb.fract() == 0.0 {
            format!("{}MB", mb as u64)
        } else {
            format!("{:.1}MB", mb)
        }
    }
}

impl OcrSettings {
    pub fn google_api_key(&self) -> Option<&str> {
        self.google_api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn paddle_endpoint(&self) -> Option<&str> {
        self.paddle_endpoint.as_deref().filter(|e| !e.is_empty())
    }
}

impl CdnSettings {
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty()
    }
}

/// Parse a comma separated extension list ("jpg, .PNG") into lowercase entries
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8000,
                workers: None,
            },
            upload: UploadSettings {
                temp_dir: PathBuf::from("temp/"),
                max_file_size: 10 * 1024 * 1024,
                allowed_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            },
            ocr: OcrSettings {
                google_credentials_path: None,
                google_api_key: None,
                vision_endpoint: "https://vision.googleapis.com".to_string(),
                paddle_endpoint: None,
                min_text_len: 10,
                rate_limit_per_minute: 600,
                max_retries: 2,
                timeout_secs: 30,
            },
            cdn: CdnSettings {
                base_url: String::new(),
                api_key: String::new(),
                timeout_secs: 30,
            },
        }
    }
}
