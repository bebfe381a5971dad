//! Кеш черновиков бронирования.
//!
//! Черновик живёт между запросами одного пользователя, пока он проходит
//! экраны выбора мест. Истекает по TTL, удаляется при отказе от брони.

pub mod drafts;

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::flow::BookingDraft;

pub use drafts::RedisDraftCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Draft serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub trait DraftCache: Send + Sync {
    fn load(&self, id: Uuid) -> BoxFuture<'_, Result<Option<BookingDraft>, CacheError>>;

    /// Сохраняет черновик и продлевает его TTL.
    fn save<'a>(&'a self, draft: &'a BookingDraft) -> BoxFuture<'a, Result<(), CacheError>>;

    /// Возвращает `true`, если черновик существовал.
    fn discard(&self, id: Uuid) -> BoxFuture<'_, Result<bool, CacheError>>;
}

/// Черновики в памяти процесса.
pub struct MemoryDraftCache {
    ttl: Duration,
    drafts: RwLock<HashMap<Uuid, (Instant, BookingDraft)>>,
}

impl MemoryDraftCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self { ttl: Duration::from_secs(ttl_seconds), drafts: RwLock::new(HashMap::new()) }
    }
}

impl DraftCache for MemoryDraftCache {
    fn load(&self, id: Uuid) -> BoxFuture<'_, Result<Option<BookingDraft>, CacheError>> {
        async move {
            let mut drafts = self.drafts.write().await;
            let expired = matches!(drafts.get(&id), Some((saved_at, _)) if saved_at.elapsed() > self.ttl);
            if expired {
                drafts.remove(&id);
                return Ok(None);
            }
            Ok(drafts.get(&id).map(|(_, draft)| draft.clone()))
        }
        .boxed()
    }

    fn save<'a>(&'a self, draft: &'a BookingDraft) -> BoxFuture<'a, Result<(), CacheError>> {
        async move {
            let mut drafts = self.drafts.write().await;
            // заодно выбрасываем просроченные
            drafts.retain(|_, (saved_at, _)| saved_at.elapsed() <= self.ttl);
            drafts.insert(draft.id, (Instant::now(), draft.clone()));
            Ok(())
        }
        .boxed()
    }

    fn discard(&self, id: Uuid) -> BoxFuture<'_, Result<bool, CacheError>> {
        async move { Ok(self.drafts.write().await.remove(&id).is_some()) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VenueCatalog;
    use crate::services::flow::BookingDetails;
    use crate::services::selection::BookingMode;
    use chrono::NaiveDate;

    fn draft() -> BookingDraft {
        let details = BookingDetails {
            date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            venue: "Main Office".to_string(),
            building: "A".to_string(),
            floor: "2".to_string(),
            mode: BookingMode::Solo,
        };
        BookingDraft::start(details, &VenueCatalog::builtin()).unwrap()
    }

    #[tokio::test]
    async fn save_load_discard() {
        let cache = MemoryDraftCache::new(60);
        let draft = draft();

        cache.save(&draft).await.unwrap();
        assert_eq!(cache.load(draft.id).await.unwrap(), Some(draft.clone()));

        assert!(cache.discard(draft.id).await.unwrap());
        assert!(!cache.discard(draft.id).await.unwrap());
        assert_eq!(cache.load(draft.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_drafts_are_gone() {
        let cache = MemoryDraftCache::new(0);
        let draft = draft();
        cache.save(&draft).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.load(draft.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_purges_abandoned_drafts() {
        let cache = MemoryDraftCache::new(0);
        for _ in 0..50 {
            cache.save(&draft()).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(5)).await;

        let latest = draft();
        cache.save(&latest).await.unwrap();

        let drafts = cache.drafts.read().await;
        assert_eq!(drafts.len(), 1);
        assert!(drafts.contains_key(&latest.id));
    }
}
