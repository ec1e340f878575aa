use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
    pub ocr: OcrConfig,
    pub storage: StorageConfig,
    pub enrichment: Option<EnrichmentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
    /// Requests per key per minute. `None` disables the limiter.
    pub rate_limit_per_minute: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_file_size: u64,
    pub max_image_dimension: u32,
    pub min_image_dimension: u32,
    pub max_aspect_ratio: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub languages: String,
    pub timeout_secs: u64,
    pub max_image_dimension: u32,
    pub min_image_dimension: u32,
    /// Detected lines below this confidence (0-1) are discarded before
    /// field extraction and excluded from the stored raw text.
    pub confidence_threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: String,
    pub bucket: String,
    pub region: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub cdn_domain: Option<String>,
    pub local_root: String,
}

/// Enrichment configuration for company research models
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Days before cached company data is considered stale.
    pub freshness_days: i64,
    /// External calls allowed per minute (best-effort, in-memory).
    pub rate_limit_per_minute: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_image_dimension: 8000,
            min_image_dimension: 100,
            max_aspect_ratio: 4.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("ROLO_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("ROLO_PORT", 3000),
                api_keys: env::var("ROLO_API_KEYS")
                    .map(|keys| keys.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default(),
                rate_limit_per_minute: parse_env_opt("RATE_LIMIT_PER_MINUTE"),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:rolo.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
            },
            upload: UploadConfig {
                max_file_size: parse_env_or("UPLOAD_MAX_FILE_SIZE", 10 * 1024 * 1024),
                max_image_dimension: parse_env_or("UPLOAD_MAX_DIMENSION", 8000),
                min_image_dimension: parse_env_or("UPLOAD_MIN_DIMENSION", 100),
                max_aspect_ratio: parse_env_or("UPLOAD_MAX_ASPECT_RATIO", 4.0),
            },
            ocr: OcrConfig {
                model: env::var("OCR_MODEL").unwrap_or_else(|_| "local/tesseract".to_string()),
                api_key: env::var("OCR_API_KEY").ok(),
                base_url: env::var("OCR_BASE_URL").ok(),
                languages: env::var("OCR_LANGUAGES").unwrap_or_else(|_| "eng".to_string()),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 60),
                max_image_dimension: parse_env_or("OCR_MAX_DIMENSION", 4096),
                min_image_dimension: parse_env_or("OCR_MIN_DIMENSION", 50),
                confidence_threshold: parse_env_or("OCR_CONFIDENCE_THRESHOLD", 0.7),
            },
            storage: StorageConfig {
                backend: env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string()),
                bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| "cards".to_string()),
                region: env::var("STORAGE_REGION").ok(),
                base_url: env::var("STORAGE_BASE_URL").ok(),
                api_key: env::var("STORAGE_API_KEY").ok(),
                cdn_domain: env::var("STORAGE_CDN_DOMAIN").ok(),
                local_root: env::var("STORAGE_LOCAL_ROOT")
                    .unwrap_or_else(|_| "data/uploads".to_string()),
            },
            enrichment: env::var("ENRICHMENT_MODEL").ok().map(|model| EnrichmentConfig {
                model,
                api_key: env::var("ENRICHMENT_API_KEY").ok(),
                base_url: env::var("ENRICHMENT_BASE_URL").ok(),
                timeout_secs: parse_env_or("ENRICHMENT_TIMEOUT", 30),
                max_retries: parse_env_or("ENRICHMENT_MAX_RETRIES", 3),
                freshness_days: parse_env_or("ENRICHMENT_FRESHNESS_DAYS", 30),
                rate_limit_per_minute: parse_env_or("ENRICHMENT_RATE_LIMIT", 10),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known OCR providers that use hosted vision APIs
const KNOWN_OCR_PROVIDERS: &[&str] = &["mistral", "openai", "local"];

/// Known enrichment providers that use OpenAI-compatible APIs
pub const KNOWN_ENRICHMENT_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse a model name into (provider, model) tuple.
pub fn parse_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_OCR_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to local provider
    ("local", model)
}

/// Parse an enrichment model name into (provider, model) tuple.
pub fn parse_enrichment_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_ENRICHMENT_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("local", model)
}
