//! Wires the generic tick-based scheduler (C7) to a single daily GC job
//! against the memory store.

use std::sync::Arc;

use chrono::Utc;
use mnemora_core::config::MnemoraConfig;
use mnemora_scheduler::{Schedule, SchedulerEngine};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use crate::app::AppState;

const GC_JOB_NAME: &str = "daily_memory_gc";

/// Opens its own connection (the scheduler owns its DB session independent
/// of the HTTP request path, per §5), registers the daily GC job if it
/// isn't already present from a prior run, then spawns the engine's poll
/// loop and a consumer that drains fired jobs into `MemoryStore::gc_sweep`.
///
/// Returns the shutdown sender — the caller must hold onto it for the
/// process lifetime (dropping it closes the watch channel and would spin
/// the engine's select loop) and can `send(true)` it for graceful shutdown.
pub fn spawn(state: Arc<AppState>, config: &MnemoraConfig) -> anyhow::Result<watch::Sender<bool>> {
    let conn = rusqlite::Connection::open(&config.database.path)?;
    let (fired_tx, mut fired_rx) = mpsc::channel(16);
    let engine = SchedulerEngine::new(conn, Some(fired_tx))?;

    let already_registered = engine
        .list_jobs()?
        .iter()
        .any(|job| job.name == GC_JOB_NAME);

    if !already_registered {
        // §9 treats the spec's "03:00 local time" as UTC: nothing in this
        // stack resolves the operator's local timezone, and the scheduler's
        // `Schedule::Daily` is UTC-only by construction.
        let hour = config.scheduler.gc_hour.clamp(0, 23) as u8;
        engine.add_job(GC_JOB_NAME, Schedule::Daily { hour, minute: 0 }, "gc_sweep")?;
        info!(hour, "registered daily memory GC job");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(engine.run(shutdown_rx));

    tokio::spawn(async move {
        while let Some(job) = fired_rx.recv().await {
            if job.name != GC_JOB_NAME {
                continue;
            }
            match state.memory.gc_sweep(Utc::now()) {
                Ok(n) if n > 0 => info!(deleted = n, "daily GC soft-deleted stale memories"),
                Ok(_) => {}
                Err(e) => error!(err = %e, "daily GC sweep failed"),
            }
        }
    });

    Ok(shutdown_tx)
}
