//! My Little ToyBox: list, look up and buy second-hand toys.
//!
//! The domain lives in [`model`], [`queries`] and [`commands`]; persistence
//! sits behind [`store::DocumentStore`]; [`server`] maps it all onto HTTP.

pub mod commands;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod queries;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod store;

pub use commands::{CommandOutcome, RandomToyIds, ToyCommandProcessor, ToyIdGenerator};
pub use config::{CliArgs, ServerConfig, StoreKind};
pub use error::{ToyBoxError, ToyBoxResult, ValidationError};
pub use logging::{LoggingConfig, init_logging};
pub use model::{ToyPurchaseRequest, ToyRecord, UserRecord};
pub use queries::ToyQueryProcessor;
pub use state::AppState;

use anyhow::Result;
use tokio::net::TcpListener;

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let state = AppState::from_config(&config)?;

    tracing::info!(
        store = %config.store,
        bind = %config.http_bind_address,
        "starting toybox server",
    );

    let router = server::router(state);
    let listener = TcpListener::bind(config.http_bind_address).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(bind = %actual_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
