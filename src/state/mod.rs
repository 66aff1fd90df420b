pub mod auth;
pub mod clock;
pub mod lifecycle;
pub mod slots;
mod sse;

use std::{sync::Arc, time::SystemTime};

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::booking_store::BookingStore, error::ServiceError};

pub use self::sse::SseHub;
use self::{
    auth::TokenRegistry,
    clock::{Clock, SystemClock},
};

pub type SharedState = Arc<AppState>;

/// Central application state storing the storage handle, event hub and configuration.
pub struct AppState {
    booking_store: RwLock<Option<Arc<dyn BookingStore>>>,
    events: SseHub,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    clock: Arc<dyn Clock>,
    tokens: TokenRegistry,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`AppState::new`] with an explicit time source.
    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let tokens = TokenRegistry::from_entries(config.api_tokens().iter().cloned());
        Arc::new(Self {
            booking_store: RwLock::new(None),
            events: SseHub::new(config.sse_capacity()),
            degraded: degraded_tx,
            config,
            clock,
            tokens,
        })
    }

    /// Obtain a handle to the current booking store, if one is installed.
    pub async fn booking_store(&self) -> Option<Arc<dyn BookingStore>> {
        let guard = self.booking_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a booking store implementation and leave degraded mode.
    pub async fn set_booking_store(&self, store: Arc<dyn BookingStore>) {
        {
            let mut guard = self.booking_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current booking store and enter degraded mode.
    pub async fn clear_booking_store(&self) {
        {
            let mut guard = self.booking_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Return the booking store or fail with [`ServiceError::Degraded`].
    pub async fn require_booking_store(&self) -> Result<Arc<dyn BookingStore>, ServiceError> {
        if self.is_degraded().await {
            return Err(ServiceError::Degraded);
        }
        self.booking_store().await.ok_or(ServiceError::Degraded)
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub feeding the SSE stream.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current instant according to the configured clock.
    pub fn now(&self) -> SystemTime {
        self.clock.now()
    }

    /// Bearer tokens accepted by the API.
    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }
}
