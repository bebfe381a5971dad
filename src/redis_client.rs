use redis::{aio::ConnectionManager, Client, RedisResult};
use tracing::info;

/// Соединение с Redis для кеша черновиков.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

impl RedisClient {
    // ConnectionManager сам переподключается при обрыве
    pub async fn connect(redis_url: &str) -> RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        let redis = RedisClient { conn };
        redis.ping().await?;
        info!("Draft cache connected to Redis");
        Ok(redis)
    }

    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
