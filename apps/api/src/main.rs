use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::{AppointmentStore, InMemoryAppointmentStore, RedisAppointmentStore};
use booking_queue_cell::{NotificationHub, QueueEngine, QueueState};
use doctor_cell::{
    load_seed_file, seed_registry, DoctorRegistry, InMemoryDoctorRegistry, RedisDoctorRegistry,
};
use shared_config::AppConfig;
use shared_database::create_redis_pool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic queue API server");

    let config = AppConfig::from_env();

    let (doctors, appointments) = build_stores(&config).await?;

    match &config.doctor_seed_path {
        Some(path) => {
            let seed = load_seed_file(path).await?;
            seed_registry(doctors.as_ref(), seed).await?;
        }
        None => warn!("DOCTOR_SEED_PATH not set, no doctors were seeded"),
    }

    let hub = NotificationHub::new(config.channel_capacity, config.global_channel_capacity);
    let engine = QueueEngine::new(doctors, appointments, Arc::new(hub.clone()));
    let state = QueueState::new(engine, hub);

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn build_stores(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn DoctorRegistry>, Arc<dyn AppointmentStore>)> {
    if !config.is_redis_configured() {
        return Ok((
            Arc::new(InMemoryDoctorRegistry::new()),
            Arc::new(InMemoryAppointmentStore::new()),
        ));
    }

    let pool = create_redis_pool(config)
        .await
        .context("Failed to connect to Redis")?;
    info!("Using Redis-backed doctor registry and appointment store");

    Ok((
        Arc::new(RedisDoctorRegistry::new(pool.clone())),
        Arc::new(RedisAppointmentStore::new(pool)),
    ))
}
