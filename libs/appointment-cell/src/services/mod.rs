pub mod store;
pub mod redis_store;

pub use store::*;
pub use redis_store::*;
