use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal::ctrl_c;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Turns Ctrl-C into a one-shot notification the main loop can race against.
#[derive(Clone)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    fn new() -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub async fn wait_for_shutdown(&self) {
        self.notify.notified().await;
    }

    fn trigger(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            info!("Shutdown signal received, initiating graceful shutdown...");
            self.notify.notify_waiters();
        }
    }
}

pub async fn install() -> Result<ShutdownHandle, std::io::Error> {
    let handle = ShutdownHandle::new();

    let listener = handle.clone();
    tokio::spawn(async move {
        match ctrl_c().await {
            Ok(()) => listener.trigger(),
            Err(e) => warn!("Error setting up signal handler: {e}"),
        }
    });

    Ok(handle)
}
