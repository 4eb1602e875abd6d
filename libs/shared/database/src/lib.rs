pub mod error;
pub mod pool;

pub use error::StoreError;
pub use pool::{connection, create_redis_pool, RedisPool};
