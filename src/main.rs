//! Courtside binary entrypoint wiring the REST API, the SSE stream and the storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use courtside_back::{
    build_router,
    config::AppConfig,
    dao::{
        booking_store::{BookingStore, memory::MemoryBookingStore},
        storage::StorageError,
    },
    services::{expiry_sweeper, storage_supervisor},
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    spawn_storage_supervisor(app_state.clone());
    tokio::spawn(expiry_sweeper::run(app_state.clone()));
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the supervisor for the backend selected by `STORAGE_BACKEND` (`mongo` or `memory`).
fn spawn_storage_supervisor(state: SharedState) {
    let backend = env::var(STORAGE_BACKEND_ENV).unwrap_or_else(|_| "mongo".into());
    match backend.as_str() {
        "memory" => spawn_memory(state),
        other => {
            if other != "mongo" {
                warn!(backend = other, "unknown storage backend; using MongoDB");
            }
            spawn_mongo(state);
        }
    }
}

fn spawn_memory(state: SharedState) {
    warn!("using the in-memory storage backend; data is lost on restart");
    let store: Arc<dyn BookingStore> = Arc::new(MemoryBookingStore::new());
    tokio::spawn(storage_supervisor::run(state, move || {
        let store = store.clone();
        async move { Ok::<_, StorageError>(store) }
    }));
}

#[cfg(feature = "mongo-store")]
fn spawn_mongo(state: SharedState) {
    use courtside_back::dao::booking_store::mongodb::{MongoBookingStore, MongoConfig};

    tokio::spawn(storage_supervisor::run(state, || async {
        let config = MongoConfig::from_env().await?;
        let store = MongoBookingStore::connect(config).await?;
        Ok::<Arc<dyn BookingStore>, StorageError>(Arc::new(store))
    }));
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_mongo(state: SharedState) {
    warn!("built without MongoDB support; falling back to the in-memory backend");
    spawn_memory(state);
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
