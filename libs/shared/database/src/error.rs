use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis connection error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Connection pool error: {0}")]
    PoolError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Corrupt record {key}: {reason}")]
    CorruptRecord { key: String, reason: String },
}

impl From<deadpool_redis::PoolError> for StoreError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        StoreError::PoolError(e.to_string())
    }
}
