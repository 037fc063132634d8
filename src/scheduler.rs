//! Background scheduler
//!
//! The index hands its snapshot job to a `Scheduler` and never manages
//! threads itself. `PeriodicScheduler` is the bundled implementation: one
//! named OS thread per job, driven by crossbeam timer channels.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::{IndexError, Result};

/// A repeatable unit of background work
pub trait Job: Send + Sync {
    /// Job name for logging
    fn name(&self) -> &str;

    /// Run once. Must be safe to call repeatedly.
    fn run(&self);
}

/// Runs jobs after an initial delay, then on a fixed period
pub trait Scheduler {
    fn schedule(
        &self,
        name: &str,
        job: Arc<dyn Job>,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<()>;
}

/// Thread-per-job scheduler with cooperative shutdown
///
/// Dropping the shutdown sender disconnects every job's receiver, which
/// wakes the `select!` in each loop.
pub struct PeriodicScheduler {
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PeriodicScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = channel::bounded(0);
        Self {
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Number of jobs scheduled so far
    pub fn job_count(&self) -> usize {
        self.handles.lock().len()
    }

    /// Stop every job and wait for its thread to exit
    ///
    /// A job that is mid-run finishes that run first.
    pub fn shutdown(&self) {
        drop(self.shutdown_tx.lock().take());

        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Scheduled job thread panicked");
            }
        }
    }

    fn run_loop(
        job: Arc<dyn Job>,
        initial_delay: Duration,
        period: Duration,
        shutdown: Receiver<()>,
    ) {
        let start = channel::after(initial_delay);
        channel::select! {
            recv(start) -> _ => {},
            recv(shutdown) -> _ => return,
        }

        let ticker = channel::tick(period);
        let mut run_id = 0u64;
        loop {
            run_id += 1;
            tracing::trace!(job = job.name(), run_id, "Running scheduled job");
            job.run();

            channel::select! {
                recv(ticker) -> _ => {},
                recv(shutdown) -> _ => break,
            }
        }

        tracing::debug!(job = job.name(), runs = run_id, "Scheduled job stopped");
    }
}

impl Default for PeriodicScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for PeriodicScheduler {
    fn schedule(
        &self,
        name: &str,
        job: Arc<dyn Job>,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<()> {
        if period.is_zero() {
            return Err(IndexError::Scheduler(format!(
                "job '{}' has a zero period",
                name
            )));
        }
        if self.shutdown_tx.lock().is_none() {
            return Err(IndexError::Scheduler(format!(
                "cannot schedule '{}' after shutdown",
                name
            )));
        }

        let shutdown = self.shutdown_rx.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || Self::run_loop(job, initial_delay, period, shutdown))?;

        self.handles.lock().push(handle);
        tracing::debug!(
            job = name,
            initial_delay_ms = initial_delay.as_millis() as u64,
            period_ms = period.as_millis() as u64,
            "Scheduled job"
        );
        Ok(())
    }
}

impl Drop for PeriodicScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
