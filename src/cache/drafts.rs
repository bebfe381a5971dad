use futures::future::{BoxFuture, FutureExt};
use redis::AsyncCommands;
use tracing::debug;
use uuid::Uuid;

use super::{CacheError, DraftCache};
use crate::redis_client::RedisClient;
use crate::services::flow::BookingDraft;

/// Черновики в Redis: JSON под ключом `draft:{id}` с TTL.
#[derive(Clone)]
pub struct RedisDraftCache {
    redis: RedisClient,
    ttl_seconds: u64,
}

impl RedisDraftCache {
    pub fn new(redis: RedisClient, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }
}

fn draft_key(id: Uuid) -> String {
    format!("draft:{}", id)
}

impl DraftCache for RedisDraftCache {
    fn load(&self, id: Uuid) -> BoxFuture<'_, Result<Option<BookingDraft>, CacheError>> {
        async move {
            let mut conn = self.redis.conn.clone();
            let data: Option<String> = conn.get(draft_key(id)).await?;
            match data {
                Some(json) => Ok(Some(serde_json::from_str(&json)?)),
                None => Ok(None),
            }
        }
        .boxed()
    }

    fn save<'a>(&'a self, draft: &'a BookingDraft) -> BoxFuture<'a, Result<(), CacheError>> {
        async move {
            let data = serde_json::to_string(draft)?;
            let mut conn = self.redis.conn.clone();
            let _: () = conn.set_ex(draft_key(draft.id), data, self.ttl_seconds).await?;
            debug!("Saved draft {} at step {:?}", draft.id, draft.step);
            Ok(())
        }
        .boxed()
    }

    fn discard(&self, id: Uuid) -> BoxFuture<'_, Result<bool, CacheError>> {
        async move {
            let mut conn = self.redis.conn.clone();
            let removed: u64 = conn.del(draft_key(id)).await?;
            Ok(removed > 0)
        }
        .boxed()
    }
}
