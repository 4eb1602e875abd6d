use deadpool_redis::{Config, Connection, Pool, Runtime};
use tracing::info;

use shared_config::AppConfig;

use crate::StoreError;

pub type RedisPool = Pool;

/// Build a connection pool from `REDIS_URL` and make sure the server answers.
pub async fn create_redis_pool(config: &AppConfig) -> Result<RedisPool, StoreError> {
    let redis_url = config
        .redis_url
        .clone()
        .unwrap_or_else(|| "redis://localhost:6379".to_string());

    let pool = Config::from_url(redis_url)
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| StoreError::PoolError(format!("Pool creation error: {}", e)))?;

    let mut conn = connection(&pool).await?;
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    info!("Redis store initialized successfully");

    Ok(pool)
}

pub async fn connection(pool: &RedisPool) -> Result<Connection, StoreError> {
    Ok(pool.get().await?)
}
