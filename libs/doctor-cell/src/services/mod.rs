pub mod registry;
pub mod redis_registry;
pub mod seed;

pub use registry::*;
pub use redis_registry::*;
pub use seed::*;
