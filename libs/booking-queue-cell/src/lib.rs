pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod socket;

pub use error::*;
pub use handlers::QueueState;
pub use models::*;
pub use router::create_queue_router;
pub use services::*;
