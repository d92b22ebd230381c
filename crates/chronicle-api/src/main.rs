//! Chronicle API server entry point.

use std::error::Error;

use chronicle_api::config::Config;
use chronicle_api::state::AppState;
use chronicle_core::bus::BroadcastEventBus;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Logs every committed event that reaches the bus.
fn spawn_event_logger(bus: &BroadcastEventBus) {
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    aggregate_id = %event.aggregate_id,
                    version = event.version,
                    "event committed"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event logger fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting Chronicle API server");

    let config = Config::from_env()?;
    let addr = config.socket_addr()?;

    let bus = BroadcastEventBus::default();
    spawn_event_logger(&bus);
    let app_state = AppState::connect(&config, bus).await?;

    let app = chronicle_api::app(app_state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
