//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::content::Language;

/// Default upload size limit (10 MB).
const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Redis connection URL.
    pub redis_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Path to uploads directory (default: ./uploads).
    pub uploads_dir: PathBuf,

    /// Base URL for serving uploaded files (default: /files).
    pub files_url: String,

    /// Path to Tera templates (default: ./templates).
    pub templates_dir: PathBuf,

    /// Path to static assets (default: ./static).
    pub static_dir: PathBuf,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "lax").
    pub cookie_same_site: String,

    /// Whether session cookies carry the Secure flag (default: true).
    pub cookie_secure: bool,

    /// Language served when nothing else matches (default: en).
    pub default_language: Language,

    /// Site name shown in page titles.
    pub site_name: String,

    /// Maximum accepted upload size in bytes (default: 10 MB).
    pub max_upload_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));

        let files_url = env::var("FILES_URL").unwrap_or_else(|_| "/files".to_string());

        let templates_dir = env::var("TEMPLATES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./templates"));

        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./static"));

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or_else(|_| "lax".to_string())
            .to_lowercase();

        let cookie_secure = parse_bool(&env::var("COOKIE_SECURE").unwrap_or_default(), true)
            .context("COOKIE_SECURE must be true or false")?;

        let default_language = match env::var("DEFAULT_LANGUAGE") {
            Ok(code) => match Language::parse(&code) {
                Some(lang) => lang,
                None => bail!("DEFAULT_LANGUAGE must be one of: en, vi"),
            },
            Err(_) => Language::default(),
        };

        let site_name = env::var("SITE_NAME").unwrap_or_else(|_| "Lexsite Law".to_string());

        let max_upload_size = match env::var("MAX_UPLOAD_SIZE") {
            Ok(v) => v.parse().context("MAX_UPLOAD_SIZE must be a byte count")?,
            Err(_) => DEFAULT_MAX_UPLOAD_SIZE,
        };

        Ok(Self {
            port,
            database_url,
            redis_url,
            database_max_connections,
            uploads_dir,
            files_url,
            templates_dir,
            static_dir,
            cors_allowed_origins,
            cookie_same_site,
            cookie_secure,
            default_language,
            site_name,
            max_upload_size,
        })
    }
}

/// Parse a boolean flag, using `default` for empty values.
fn parse_bool(value: &str, default: bool) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("invalid boolean: {other}"),
    }
}
