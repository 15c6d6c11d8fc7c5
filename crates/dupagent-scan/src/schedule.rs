//! Periodic rescans.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::debug;

use dupagent_core::{ScanError, ScanOptions};

use crate::controller::ScanController;
use crate::progress::ScanEvent;

/// Shortest period a schedule accepts.
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Fires a scan of fixed directories and options at a fixed period.
///
/// The first tick comes one period after creation. Ticks missed while the
/// caller was busy are not replayed.
#[derive(Debug)]
pub struct ScanSchedule {
    roots: Vec<PathBuf>,
    options: ScanOptions,
    interval: Interval,
}

impl ScanSchedule {
    /// Schedule a scan every `period`, clamped to at least [`MIN_PERIOD`].
    ///
    /// Fails when `roots` is empty. Must be called from within a Tokio
    /// runtime.
    pub fn every(
        roots: Vec<PathBuf>,
        options: ScanOptions,
        period: Duration,
    ) -> Result<Self, ScanError> {
        Self::with_min_period(roots, options, period, MIN_PERIOD)
    }

    fn with_min_period(
        roots: Vec<PathBuf>,
        options: ScanOptions,
        period: Duration,
        min: Duration,
    ) -> Result<Self, ScanError> {
        if roots.is_empty() {
            return Err(ScanError::NoDirectories);
        }
        let period = period.max(min);
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ok(Self {
            roots,
            options,
            interval,
        })
    }

    /// Time between scans.
    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    /// Directories each scheduled scan covers.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Wait for the next tick and return what to scan.
    pub async fn tick(&mut self) -> (Vec<PathBuf>, ScanOptions) {
        self.interval.tick().await;
        debug!(roots = self.roots.len(), "scheduled scan due");
        (self.roots.clone(), self.options.clone())
    }

    /// Wait for the next tick, then (re)start the scan on `controller`.
    pub async fn trigger(
        &mut self,
        controller: &mut ScanController,
    ) -> Result<mpsc::UnboundedReceiver<ScanEvent>, ScanError> {
        let (roots, options) = self.tick().await;
        controller.start(roots, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_empty_roots_rejected() {
        let err = ScanSchedule::every(Vec::new(), ScanOptions::default(), MIN_PERIOD).unwrap_err();
        assert!(matches!(err, ScanError::NoDirectories));
    }

    #[tokio::test]
    async fn test_period_is_clamped() {
        let schedule =
            ScanSchedule::every(vec![PathBuf::from("/data")], ScanOptions::default(), Duration::ZERO)
                .unwrap();
        assert_eq!(schedule.period(), MIN_PERIOD);
    }

    #[tokio::test]
    async fn test_each_tick_runs_a_scan() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "same").unwrap();
        fs::write(temp.path().join("b"), "same").unwrap();

        let period = Duration::from_millis(20);
        let mut schedule = ScanSchedule::with_min_period(
            vec![temp.path().to_path_buf()],
            ScanOptions::default(),
            period,
            period,
        )
        .unwrap();
        let mut controller = ScanController::new();

        for _ in 0..2 {
            let mut events = schedule.trigger(&mut controller).await.unwrap();

            let mut groups = None;
            while let Some(event) = events.recv().await {
                if let ScanEvent::Completed(done) = event {
                    groups = Some(done);
                }
            }
            assert_eq!(groups.unwrap().len(), 1);
        }
    }
}
