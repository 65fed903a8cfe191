//! Host CPU and memory usage, sampled fresh on every request.

use anyhow::Context as AnyhowContext;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Mutex;
use sysinfo::System;

use crate::error::Result;

/// The sampler lives for the whole process: CPU usage is computed from the
/// delta since the previous refresh, so the very first sample reads 0.
static SYSTEM: Lazy<Mutex<System>> = Lazy::new(|| Mutex::new(System::new()));

/// One point-in-time reading of host load.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

/// Take a fresh snapshot. The refresh reads procfs, so it runs on the
/// blocking pool.
pub async fn sample() -> Result<MetricsSnapshot> {
    tokio::task::spawn_blocking(sample_blocking)
        .await
        .context("metrics sampling task failed")
}

fn sample_blocking() -> MetricsSnapshot {
    let mut system = SYSTEM.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    system.refresh_cpu_usage();
    system.refresh_memory();

    let cpu_percent = system.global_cpu_usage().clamp(0.0, 100.0);
    let total = system.total_memory();
    let memory_percent = if total == 0 {
        0.0
    } else {
        (system.used_memory() as f32 / total as f32 * 100.0).clamp(0.0, 100.0)
    };

    MetricsSnapshot {
        cpu_percent,
        memory_percent,
    }
}
