//! Background publish loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::publish::PublishCoordinator;

/// Runs publish sweeps on a fixed interval until stopped.
pub struct PublishLoop {
    coordinator: Arc<PublishCoordinator>,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PublishLoop {
    pub fn new(coordinator: Arc<PublishCoordinator>, poll_interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            coordinator,
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Spawn the loop task.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Publish loop already running");
            return;
        }

        let running = Arc::clone(&self.running);
        let coordinator = Arc::clone(&self.coordinator);
        let poll_interval = self.poll_interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let task = tokio::spawn(async move {
            info!("Publish loop started (every {:?})", poll_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Publish loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(poll_interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        if let Err(e) = coordinator.sweep(Utc::now()).await {
                            error!("Publish sweep failed: {}", e);
                        }
                    }
                }
            }
            info!("Publish loop stopped");
        });

        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(task);
        }
    }

    /// Signal the loop and wait for an in-flight sweep to finish.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Publish loop not running");
            return;
        }

        info!("Stopping publish loop");
        let _ = self.shutdown_tx.send(());

        let task = self.task.lock().ok().and_then(|mut slot| slot.take());
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Publish loop task ended abnormally: {}", e);
            }
        }
    }
}
