pub mod config;
pub mod database;
pub mod redis_client;
pub mod models;
pub mod catalog;
pub mod controllers;
pub mod middleware;
pub mod cache;
pub mod services;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use cache::{DraftCache, MemoryDraftCache, RedisDraftCache};
use catalog::VenueCatalog;
use config::{Config, DraftBackend, StoreConfig};
use store::{BookingStore, MemoryBookingStore, PgBookingStore, RemoteBookingStore};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<VenueCatalog>,
    pub store: Arc<dyn BookingStore>,
    pub drafts: Arc<dyn DraftCache>,
    pub config: Config,
}

impl AppState {
    /// Поднимает каталог, хранилище бронирований и кеш черновиков по конфигу.
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let catalog = VenueCatalog::load(config.catalog.path.as_deref())?;
        tracing::info!("Venue catalog loaded: {} venue(s)", catalog.venues().len());

        let store: Arc<dyn BookingStore> = match &config.store {
            StoreConfig::Postgres(db_config) => {
                let db = database::Database::connect(db_config).await?;
                db.run_migrations().await?;
                Arc::new(PgBookingStore::new(db))
            }
            StoreConfig::Remote(remote) => {
                tracing::info!("Using remote booking API at {}", remote.base_url);
                Arc::new(RemoteBookingStore::from_config(remote)?)
            }
            StoreConfig::Memory => {
                tracing::warn!("Using in-memory booking store, data is lost on restart");
                Arc::new(MemoryBookingStore::new())
            }
        };

        let drafts: Arc<dyn DraftCache> = match &config.drafts.backend {
            DraftBackend::Redis { url } => {
                let redis = redis_client::RedisClient::connect(url).await?;
                Arc::new(RedisDraftCache::new(redis, config.drafts.ttl_seconds))
            }
            DraftBackend::Memory => Arc::new(MemoryDraftCache::new(config.drafts.ttl_seconds)),
        };

        Ok(Self::with_parts(catalog, store, drafts, config))
    }

    pub fn with_parts(
        catalog: VenueCatalog,
        store: Arc<dyn BookingStore>,
        drafts: Arc<dyn DraftCache>,
        config: Config,
    ) -> Arc<Self> {
        Arc::new(Self { catalog: Arc::new(catalog), store, drafts, config })
    }
}

/// Полный роутер приложения.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Seat Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
