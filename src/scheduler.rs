// src/scheduler.rs
//! Recurring trigger + single-flight guard.
//!
//! The ticker never waits on a run. Each tick asks the `RunSlot` for a
//! permit; if a run is still in flight the trigger is dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::orchestrator::Orchestrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// At most one permit exists at a time.
#[derive(Debug, Clone, Default)]
pub struct RunSlot {
    running: Arc<AtomicBool>,
}

impl RunSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while another run holds the slot.
    pub fn try_acquire(&self) -> Option<RunPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                running: Arc::clone(&self.running),
            })
    }

    pub fn state(&self) -> RunState {
        if self.running.load(Ordering::Acquire) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }
}

/// Returns the slot to `Idle` when dropped, including on panic unwind.
#[derive(Debug)]
pub struct RunPermit {
    running: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Work the scheduler triggers.
#[async_trait]
pub trait ScheduledRun: Send + Sync + 'static {
    async fn run(&self) -> anyhow::Result<()>;
    fn name(&self) -> &'static str;
}

#[async_trait]
impl ScheduledRun for tokio::sync::Mutex<Orchestrator> {
    async fn run(&self) -> anyhow::Result<()> {
        // Uncontended: the run slot already guarantees a single caller.
        let mut orchestrator = self.lock().await;
        orchestrator.run_all().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "relay-run"
    }
}

/// Bounds for the tick period; tokio rejects a zero period and `Instant`
/// arithmetic overflows on huge ones.
const MIN_INTERVAL: Duration = Duration::from_secs(1);
const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub struct Scheduler<J: ScheduledRun> {
    job: Arc<J>,
    interval: Duration,
    slot: RunSlot,
}

impl<J: ScheduledRun> Scheduler<J> {
    pub fn new(job: Arc<J>, interval: Duration) -> Self {
        Self {
            job,
            interval: interval.clamp(MIN_INTERVAL, MAX_INTERVAL),
            slot: RunSlot::new(),
        }
    }

    pub fn slot(&self) -> RunSlot {
        self.slot.clone()
    }

    /// Run once in the caller's task. Returns `false` if a run was already in
    /// flight and this trigger was dropped.
    pub async fn run_now(&self) -> bool {
        match self.slot.try_acquire() {
            Some(_permit) => {
                execute(self.job.as_ref()).await;
                true
            }
            None => {
                dropped(self.job.name());
                false
            }
        }
    }

    /// Run once immediately, then every `interval` for the rest of the process.
    pub async fn start(self) -> JoinHandle<()> {
        self.run_now().await;

        let Self {
            job,
            interval,
            slot,
        } = self;
        tracing::info!(job = job.name(), every_secs = interval.as_secs(), "scheduler started");

        tokio::spawn(async move {
            let mut timer = time::interval_at(Instant::now() + interval, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                timer.tick().await;
                let Some(permit) = slot.try_acquire() else {
                    dropped(job.name());
                    continue;
                };
                let job = Arc::clone(&job);
                tokio::spawn(async move {
                    let _permit = permit;
                    execute(job.as_ref()).await;
                });
            }
        })
    }
}

async fn execute<J: ScheduledRun + ?Sized>(job: &J) {
    let started = Instant::now();
    match job.run().await {
        Ok(()) => tracing::debug!(job = job.name(), elapsed_ms = started.elapsed().as_millis() as u64, "run completed"),
        Err(e) => tracing::error!(job = job.name(), error = %e, "run failed"),
    }
}

fn dropped(name: &'static str) {
    tracing::debug!(job = name, "run still in flight, trigger dropped");
    counter!("relay_runs_dropped_total").increment(1);
}
