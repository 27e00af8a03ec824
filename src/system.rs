//! Host statistics sampling.
//!
//! [`SystemSampler`] owns the `sysinfo` handle and serves two callers:
//! the metric distributions (side-effect-only [`SystemSampler::sample`])
//! and the health/status routes (snapshot reads that render into the
//! response body).
//!
//! The two failure policies differ on purpose. Feeding the distributions
//! must never fail a request, so recoverable read problems are logged and
//! swallowed. Snapshot reads return [`SystemError`] because the route
//! cannot answer without them.

use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::{Disks, Pid, ProcessesToUpdate, System, Users};
use thiserror::Error;
use tracing::warn;

use crate::metrics::ServiceMetrics;

/// Snapshot read failures. Mapped to the 500 path by the routes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SystemError {
    #[error("no disks enumerable on this host")]
    NoDisks,
    #[error("host reports zero total memory")]
    NoMemory,
}

/// Percentages reported by `GET /health`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthSnapshot {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_usage: f64,
}

/// Totals reported by `GET /api/status`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusSnapshot {
    pub cpu_count: usize,
    pub memory_total: u64,
    pub memory_available: u64,
    pub disk_total: u64,
    pub disk_available: u64,
}

/// Reads host resource usage and feeds the metric distributions.
pub struct SystemSampler {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl SystemSampler {
    /// Create a sampler with a fully refreshed system handle.
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_all();

        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            warn!("current process pid unavailable, process metrics will not be sampled");
        }

        Self {
            system: Mutex::new(system),
            pid,
        }
    }

    /// Sample resident memory, process CPU and host users into the registry.
    ///
    /// Side-effect only. Recoverable read failures are logged and
    /// swallowed; callers never see them.
    pub fn sample(&self, metrics: &ServiceMetrics) {
        {
            let mut system = self.system.lock();
            system.refresh_memory();
            system.refresh_cpu_usage();

            match self.pid {
                Some(pid) => {
                    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                    match system.process(pid) {
                        Some(process) => {
                            metrics.observe_memory(process.memory() as f64);
                            metrics.observe_cpu(f64::from(process.cpu_usage()));
                        }
                        None => warn!(pid = pid.as_u32(), "process vanished during sampling"),
                    }
                }
                None => warn!("skipping process sampling, pid unknown"),
            }
        }

        let users = Users::new_with_refreshed_list();
        metrics.set_active_users(users.len() as i64);
    }

    /// CPU, memory and disk usage as percentages in [0, 100].
    pub fn health_snapshot(&self) -> Result<HealthSnapshot, SystemError> {
        let (cpu_percent, memory_percent) = {
            let mut system = self.system.lock();
            system.refresh_memory();
            system.refresh_cpu_usage();

            let total = system.total_memory();
            if total == 0 {
                return Err(SystemError::NoMemory);
            }

            (
                f64::from(system.global_cpu_usage()),
                system.used_memory() as f64 / total as f64 * 100.0,
            )
        };

        let disks = Disks::new_with_refreshed_list();
        let (disk_total, disk_available) = disk_totals(&disks)?;
        let disk_usage = (disk_total - disk_available) as f64 / disk_total as f64 * 100.0;

        Ok(HealthSnapshot {
            cpu_percent: cpu_percent.clamp(0.0, 100.0),
            memory_percent: memory_percent.clamp(0.0, 100.0),
            disk_usage: disk_usage.clamp(0.0, 100.0),
        })
    }

    /// CPU count plus memory and disk totals.
    pub fn status_snapshot(&self) -> Result<StatusSnapshot, SystemError> {
        let (cpu_count, memory_total, memory_available) = {
            let mut system = self.system.lock();
            system.refresh_memory();

            let memory_total = system.total_memory();
            if memory_total == 0 {
                return Err(SystemError::NoMemory);
            }

            (system.cpus().len(), memory_total, system.available_memory())
        };

        let disks = Disks::new_with_refreshed_list();
        let (disk_total, disk_available) = disk_totals(&disks)?;

        Ok(StatusSnapshot {
            cpu_count,
            memory_total,
            memory_available,
            disk_total,
            disk_available,
        })
    }

    /// Host uptime in seconds.
    pub fn uptime(&self) -> u64 {
        System::uptime()
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

fn disk_totals(disks: &Disks) -> Result<(u64, u64), SystemError> {
    let mut total = 0u64;
    let mut available = 0u64;
    for disk in disks.list() {
        total += disk.total_space();
        available += disk.available_space();
    }
    if total == 0 {
        return Err(SystemError::NoDisks);
    }
    Ok((total, available))
}
