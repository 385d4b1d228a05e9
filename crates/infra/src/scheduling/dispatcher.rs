//! Fire dispatcher: drains the wake channel into the dose resolver.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use medalarm_core::DoseResolver;
//! # use medalarm_domain::FirePayload;
//! # use medalarm_infra::scheduling::{DispatcherResult, FireDispatcher};
//! # async fn example(
//! #     resolver: Arc<DoseResolver>,
//! #     receiver: tokio::sync::mpsc::UnboundedReceiver<FirePayload>,
//! # ) -> DispatcherResult<()> {
//! let mut dispatcher = FireDispatcher::new(resolver, receiver);
//! dispatcher.start()?;
//! // ... application runs ...
//! dispatcher.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use medalarm_core::DoseResolver;
use medalarm_domain::FirePayload;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{DispatcherError, DispatcherResult};

/// Configuration for the fire dispatcher.
#[derive(Debug, Clone)]
pub struct FireDispatcherConfig {
    /// Timeout for awaiting the dispatch task after cancellation.
    pub join_timeout: Duration,
}

impl Default for FireDispatcherConfig {
    fn default() -> Self {
        Self { join_timeout: Duration::from_secs(5) }
    }
}

/// Fire dispatcher with explicit lifecycle management.
///
/// The receiver sits behind an async mutex so the dispatcher can be stopped
/// and started again without losing queued payloads.
pub struct FireDispatcher {
    config: FireDispatcherConfig,
    resolver: Arc<DoseResolver>,
    receiver: Arc<Mutex<UnboundedReceiver<FirePayload>>>,
    dispatch_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    dispatched: Arc<AtomicU64>,
}

impl FireDispatcher {
    pub fn new(resolver: Arc<DoseResolver>, receiver: UnboundedReceiver<FirePayload>) -> Self {
        Self::with_config(FireDispatcherConfig::default(), resolver, receiver)
    }

    pub fn with_config(
        config: FireDispatcherConfig,
        resolver: Arc<DoseResolver>,
        receiver: UnboundedReceiver<FirePayload>,
    ) -> Self {
        Self {
            config,
            resolver,
            receiver: Arc::new(Mutex::new(receiver)),
            dispatch_handle: None,
            cancellation: CancellationToken::new(),
            dispatched: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawn the dispatch task. Must be called inside a tokio runtime.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> DispatcherResult<()> {
        if self.is_running() {
            return Err(DispatcherError::AlreadyRunning);
        }

        let receiver = Arc::clone(&self.receiver)
            .try_lock_owned()
            .map_err(|err| DispatcherError::ReceiverUnavailable(err.to_string()))?;

        self.cancellation = CancellationToken::new();
        let cancel = self.cancellation.clone();
        let resolver = Arc::clone(&self.resolver);
        let dispatched = Arc::clone(&self.dispatched);

        self.dispatch_handle = Some(tokio::spawn(async move {
            Self::dispatch_loop(receiver, resolver, cancel, dispatched).await;
        }));

        info!("Fire dispatcher started");
        Ok(())
    }

    /// Cancel the dispatch task and wait for it to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> DispatcherResult<()> {
        if !self.is_running() {
            return Err(DispatcherError::NotRunning);
        }

        self.cancellation.cancel();

        if let Some(handle) = self.dispatch_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| DispatcherError::Timeout { duration: join_timeout })??;
        }

        info!(dispatched = self.dispatched(), "Fire dispatcher stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true while the dispatch task is alive.
    pub fn is_running(&self) -> bool {
        self.dispatch_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Payloads handed to the resolver since construction.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    async fn dispatch_loop(
        mut receiver: OwnedMutexGuard<UnboundedReceiver<FirePayload>>,
        resolver: Arc<DoseResolver>,
        cancel: CancellationToken,
        dispatched: Arc<AtomicU64>,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("Fire dispatcher cancelled");
                    break;
                }
                next = receiver.recv() => match next {
                    Some(payload) => {
                        let key = payload.timer_key();
                        resolver.on_fire(payload).await;
                        dispatched.fetch_add(1, Ordering::Relaxed);
                        debug!(%key, "wake-up dispatched");
                    }
                    None => {
                        info!("Wake channel closed; fire dispatcher exiting");
                        break;
                    }
                },
            }
        }
    }
}

impl Drop for FireDispatcher {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("FireDispatcher dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}
