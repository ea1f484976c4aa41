use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::PageSize;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;

const DEFAULT_WRITE_RETRY_ATTEMPTS: u32 = 3;

/// Everything the HTTP layer needs, wired for one storage backend.
pub struct Server {
    pub relationship_service: Arc<dyn RelationshipService>,
    pub feed_service: Arc<dyn FeedService>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let (backend, pool) = match settings.storage.backend.as_str() {
            "memory" => {
                warn!("memory storage backend: data lives only as long as the process");
                (memory_backend(&MemoryStore::new()), None)
            }
            "mysql" => {
                let dsn = settings
                    .storage
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("storage.mysql_dsn is required for mysql"))?;
                let pool = MySqlPoolOptions::new()
                    .max_connections(settings.storage.max_connections)
                    .connect(dsn)
                    .await?;
                (mysql_backend(&pool), Some(pool))
            }
            other => return Err(anyhow!("Unknown storage backend: {}", other)),
        };

        let token_verifier: Arc<dyn TokenVerifier> = match settings.auth.backend.as_str() {
            "fake" => {
                warn!("fake token verifier: any `fake-access-token:` bearer is trusted");
                Arc::new(FakeTokenVerifier::new())
            }
            "jwt" => {
                let key = std::env::var("JWT_SIGNING_KEY")
                    .map_err(|_| anyhow!("JWT_SIGNING_KEY must be set for the jwt backend"))?
                    .into_bytes();
                Arc::new(JwtHs256Verifier::new(&JwtConfig {
                    issuer: settings.auth.issuer.clone(),
                    audience: settings.auth.audience.clone(),
                    signing_key: key,
                }))
            }
            other => return Err(anyhow!("Unknown auth backend: {}", other)),
        };

        let server = Self::from_backend(
            &backend,
            token_verifier,
            settings.graph.write_retry_attempts,
            PageSize(settings.feed.page_size),
        );

        info!("server started");

        Ok(Self { pool, ..server })
    }

    pub fn from_backend(
        backend: &StorageBackend,
        token_verifier: Arc<dyn TokenVerifier>,
        write_retry_attempts: u32,
        page_size: PageSize,
    ) -> Self {
        let relationship_service: Arc<dyn RelationshipService> =
            Arc::new(RealRelationshipService::new(backend, write_retry_attempts));
        let feed_service: Arc<dyn FeedService> = Arc::new(RealFeedService::new(backend, page_size));

        Self {
            relationship_service,
            feed_service,
            token_verifier,
            pool: None,
        }
    }

    /// Memory storage, fake tokens and default tuning. For tests and demos.
    pub fn in_memory(store: &MemoryStore) -> Self {
        Self::from_backend(
            &memory_backend(store),
            Arc::new(FakeTokenVerifier::new()),
            DEFAULT_WRITE_RETRY_ATTEMPTS,
            PageSize::FEED_DEFAULT,
        )
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("mysql pool closed");
        }
    }
}
