//! Application state shared across all handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::content::{DocumentStore, Language};
use crate::db;
use crate::file::{FileService, LocalFileStorage};
use crate::middleware::language::{
    AcceptLanguageNegotiator, LanguageNegotiator, UrlPrefixNegotiator,
};
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Redis client, used for health checks.
    redis: RedisClient,

    /// Document store for every content type.
    store: DocumentStore,

    /// Theme engine for template rendering.
    theme: Arc<ThemeEngine>,

    /// File service for image uploads.
    files: Arc<FileService>,

    /// Language negotiator chain (sorted by priority descending).
    language_negotiators: Vec<Arc<dyn LanguageNegotiator>>,

    default_language: Language,

    /// Site name shown in page titles.
    site_name: String,

    /// Directory served under `/static`.
    static_dir: PathBuf,
}

impl AppState {
    /// Create new application state with database connections.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;

        let redis = RedisClient::open(config.redis_url.as_str())
            .context("failed to create Redis client")?;

        let mut conn = redis
            .get_multiplexed_async_connection()
            .await
            .context("failed to connect to Redis")?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .context("Redis PING failed")?;

        Self::from_parts(config, db, redis)
    }

    /// Assemble state from existing connections.
    ///
    /// Neither connection is used here, so tests can pass a lazily
    /// connected pool.
    pub fn from_parts(config: &Config, db: PgPool, redis: RedisClient) -> Result<Self> {
        let theme = ThemeEngine::new(&config.templates_dir).context("failed to load templates")?;

        let storage = LocalFileStorage::new(&config.uploads_dir, config.files_url.clone());
        let files = FileService::new(Arc::new(storage), config.max_upload_size);

        let default_language = config.default_language;
        let mut language_negotiators: Vec<Arc<dyn LanguageNegotiator>> = vec![
            Arc::new(UrlPrefixNegotiator::new(default_language)),
            Arc::new(AcceptLanguageNegotiator::new()),
        ];
        language_negotiators.sort_by_key(|n| std::cmp::Reverse(n.priority()));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                store: DocumentStore::new(db.clone()),
                db,
                redis,
                theme: Arc::new(theme),
                files: Arc::new(files),
                language_negotiators,
                default_language,
                site_name: config.site_name.clone(),
                static_dir: config.static_dir.clone(),
            }),
        })
    }

    /// Get the database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Get the Redis client.
    pub fn redis(&self) -> &RedisClient {
        &self.inner.redis
    }

    /// Get the document store.
    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    /// Get the theme engine.
    pub fn theme(&self) -> &Arc<ThemeEngine> {
        &self.inner.theme
    }

    /// Get the file service.
    pub fn files(&self) -> &Arc<FileService> {
        &self.inner.files
    }

    pub fn language_negotiators(&self) -> &[Arc<dyn LanguageNegotiator>] {
        &self.inner.language_negotiators
    }

    pub fn default_language(&self) -> Language {
        self.inner.default_language
    }

    pub fn site_name(&self) -> &str {
        &self.inner.site_name
    }

    pub fn static_dir(&self) -> &Path {
        &self.inner.static_dir
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }

    /// Check if Redis is healthy.
    pub async fn redis_healthy(&self) -> bool {
        let Ok(mut conn) = self.inner.redis.get_multiplexed_async_connection().await else {
            return false;
        };

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}
