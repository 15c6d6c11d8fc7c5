//! Owner of at most one running scan.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use dupagent_core::{ScanError, ScanOptions};

use crate::progress::{ScanEvent, ScanOutcome};
use crate::task::start_scan;

/// Starts, restarts and cancels background scans.
///
/// Starting a new scan first cancels the running one and waits for its
/// worker to stop, so two scans never run at once.
#[derive(Debug, Default)]
pub struct ScanController {
    running: Option<Running>,
}

#[derive(Debug)]
struct Running {
    cancel: CancellationToken,
    join: JoinHandle<ScanOutcome>,
}

impl ScanController {
    /// A controller with no scan running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a scan worker is still alive.
    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.join.is_finished())
    }

    /// Start a scan, replacing any running one.
    ///
    /// Configuration errors leave the running scan untouched.
    pub async fn start(
        &mut self,
        roots: Vec<PathBuf>,
        options: ScanOptions,
    ) -> Result<mpsc::UnboundedReceiver<ScanEvent>, ScanError> {
        if roots.is_empty() {
            return Err(ScanError::NoDirectories);
        }
        if let Some(previous) = self.cancel().await? {
            debug!(cancelled = previous.is_cancelled(), "previous scan stopped");
        }

        let (events, cancel, join) = start_scan(roots, options)?.into_parts();
        self.running = Some(Running { cancel, join });
        Ok(events)
    }

    /// Cancel the running scan and wait for it to stop.
    ///
    /// Returns how it ended, or `None` if nothing was running.
    pub async fn cancel(&mut self) -> Result<Option<ScanOutcome>, ScanError> {
        match self.running.take() {
            Some(running) => {
                running.cancel.cancel();
                join(running.join).await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Wait for the running scan to finish on its own.
    pub async fn wait(&mut self) -> Result<Option<ScanOutcome>, ScanError> {
        match self.running.take() {
            Some(running) => join(running.join).await.map(Some),
            None => Ok(None),
        }
    }
}

async fn join(handle: JoinHandle<ScanOutcome>) -> Result<ScanOutcome, ScanError> {
    handle.await.map_err(|e| ScanError::Other {
        message: e.to_string(),
    })
}
