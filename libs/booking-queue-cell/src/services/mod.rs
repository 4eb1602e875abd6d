pub mod engine;
pub mod estimates;
pub mod notifications;

pub use engine::*;
pub use notifications::*;
