//! # Pool configuration.
//!
//! [`PoolConfig`] names the worker executable and pins the dispatcher's
//! policy knobs: per-slot capacity, worker ceiling, and channel sizes.
//!
//! The defaults reproduce the fixed policy of the pool: five in-flight tasks
//! per worker and a ceiling of `max(cpus − 1, 1)` worker processes.
//!
//! # Example
//! ```
//! use forkpool::PoolConfig;
//!
//! let mut cfg = PoolConfig::new("/usr/local/bin/my-worker");
//! cfg.args = vec!["--quiet".into()];
//! cfg.max_workers = 2;
//!
//! assert_eq!(cfg.slot_capacity, 5);
//! ```

use std::path::PathBuf;

/// Configuration for a process pool.
///
/// Controls the worker executable, per-slot capacity, worker ceiling, and
/// event-bus/inbox sizing.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Worker executable launched once per slot.
    pub program: PathBuf,
    /// Fixed arguments passed to every worker process.
    pub args: Vec<String>,
    /// Maximum in-flight tasks per worker before a slot is skipped by placement.
    pub slot_capacity: usize,
    /// Ceiling on simultaneously active workers (0 = derive from CPU count).
    pub max_workers: usize,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
    /// Capacity of the coordinator's submission inbox.
    pub submit_capacity: usize,
}

impl PoolConfig {
    /// Creates a configuration for the given worker executable with defaults:
    /// - `slot_capacity = 5`
    /// - `max_workers = 0` (derive `max(cpus − 1, 1)` at pool start)
    /// - `bus_capacity = 1024`
    /// - `submit_capacity = 256`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            slot_capacity: 5,
            max_workers: 0,
            bus_capacity: 1024,
            submit_capacity: 256,
        }
    }

    /// Resolves the effective worker ceiling.
    ///
    /// `max_workers = 0` derives `max(detected_cpus − 1, 1)`, leaving one
    /// core for the coordinating process. Any explicit value is clamped to a
    /// minimum of 1.
    pub fn effective_max_workers(&self) -> usize {
        match self.max_workers {
            0 => num_cpus::get().saturating_sub(1).max(1),
            n => n.max(1),
        }
    }

    /// Resolves the effective per-slot capacity (clamped to a minimum of 1).
    pub fn effective_slot_capacity(&self) -> usize {
        self.slot_capacity.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_ceiling_is_at_least_one() {
        let cfg = PoolConfig::new("worker");
        assert!(cfg.effective_max_workers() >= 1);
    }

    #[test]
    fn explicit_ceiling_is_clamped() {
        let mut cfg = PoolConfig::new("worker");
        cfg.max_workers = 3;
        assert_eq!(cfg.effective_max_workers(), 3);
        cfg.slot_capacity = 0;
        assert_eq!(cfg.effective_slot_capacity(), 1);
    }
}
