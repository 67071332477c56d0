use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One-shot "facility service is initialized" signal.
///
/// Flips from not-ready to ready at most once. Work scheduled through
/// [`Readiness::execute_when_initialized`] runs once after the flip, or
/// immediately if it already happened.
#[derive(Clone)]
pub struct Readiness {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

impl Readiness {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Mark the facility as initialized. Later calls are no-ops.
    pub fn mark_initialized(&self) {
        let changed = self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });

        if changed {
            tracing::info!("Facility service initialized");
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the facility is initialized.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only ends once ready.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Spawn `task` to run once, after initialization.
    pub fn execute_when_initialized<F, Fut>(&self, task: F) -> JoinHandle<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let readiness = self.clone();
        tokio::spawn(async move {
            readiness.wait().await;
            task().await;
        })
    }
}
