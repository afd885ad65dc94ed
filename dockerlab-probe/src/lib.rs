use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sysinfo::System;
use thiserror::Error;

const RUST_VERSION: &str = env!("CARGO_PKG_RUST_VERSION");

/// Shared handle to a probe, cheap to clone into every request.
pub type SharedProbe = Arc<dyn ProcessProbe>;

/// Read-only view of the facts a running process can report about itself.
///
/// The service never touches the clock, the memory reporter, or the random
/// source directly. Everything flows through this trait so tests can swap in a
/// [`FixedProbe`] and get deterministic payloads.
///
/// # Examples
/// ```
/// use dockerlab_probe::{ProcessProbe, SystemProbe};
///
/// let probe = SystemProbe::new();
/// let sample = probe.random_below(100);
/// assert!(sample < 100);
/// ```
pub trait ProcessProbe: Send + Sync + Debug {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Time elapsed since the probe was created.
    fn uptime(&self) -> Duration;

    /// Memory snapshot of the current process and the host it runs on.
    fn memory(&self) -> Result<MemoryUsage, ProbeError>;

    /// Toolchain and operating system identifiers.
    fn runtime(&self) -> RuntimeIdentity;

    /// Uniformly distributed integer in `[0, upper)`; `0` when `upper` is `0`.
    fn random_below(&self, upper: u32) -> u32;
}

/// Memory counters, all expressed in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss: u64,
    pub virtual_memory: u64,
    pub system_total: u64,
    pub system_used: u64,
}

/// Identifies the toolchain the binary was built for and the OS it runs on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeIdentity {
    pub version: String,
    pub platform: String,
}

impl RuntimeIdentity {
    /// Identity of the current build.
    pub fn current() -> Self {
        Self {
            version: format!("rustc {RUST_VERSION}"),
            platform: std::env::consts::OS.to_owned(),
        }
    }
}

impl Default for RuntimeIdentity {
    fn default() -> Self {
        Self::current()
    }
}

/// Errors raised while sampling process facts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("unable to resolve the current process id: {0}")]
    CurrentPid(&'static str),
    #[error("process {0} is not visible to the memory reporter")]
    ProcessNotFound(u32),
    #[error("process facts unavailable: {0}")]
    Unavailable(String),
}

/// Probe backed by the real process: `sysinfo` for memory, `rand` for samples.
#[derive(Clone, Debug)]
pub struct SystemProbe {
    started: Instant,
    runtime: RuntimeIdentity,
}

impl SystemProbe {
    /// Creates a probe whose uptime counts from now. Call once at process start.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            runtime: RuntimeIdentity::current(),
        }
    }

    /// Wraps the probe in a [`SharedProbe`].
    pub fn shared() -> SharedProbe {
        Arc::new(Self::new())
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SystemProbe {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    fn memory(&self) -> Result<MemoryUsage, ProbeError> {
        let pid = sysinfo::get_current_pid().map_err(ProbeError::CurrentPid)?;

        let mut system = System::new();
        system.refresh_memory();
        if !system.refresh_process(pid) {
            return Err(ProbeError::ProcessNotFound(pid.as_u32()));
        }

        let process = system
            .process(pid)
            .ok_or(ProbeError::ProcessNotFound(pid.as_u32()))?;

        Ok(MemoryUsage {
            rss: process.memory(),
            virtual_memory: process.virtual_memory(),
            system_total: system.total_memory(),
            system_used: system.used_memory(),
        })
    }

    fn runtime(&self) -> RuntimeIdentity {
        self.runtime.clone()
    }

    fn random_below(&self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..upper)
    }
}

/// Probe that always reports the same values.
///
/// Leaving `memory` as `None` makes [`ProcessProbe::memory`] fail, which is handy
/// for exercising error paths. `random` is clamped into range on every call.
#[derive(Clone, Debug)]
pub struct FixedProbe {
    pub now: DateTime<Utc>,
    pub uptime: Duration,
    pub memory: Option<MemoryUsage>,
    pub runtime: RuntimeIdentity,
    pub random: u32,
}

impl FixedProbe {
    /// Wraps the probe in a [`SharedProbe`].
    pub fn shared(self) -> SharedProbe {
        Arc::new(self)
    }
}

impl Default for FixedProbe {
    fn default() -> Self {
        Self {
            now: DateTime::<Utc>::UNIX_EPOCH,
            uptime: Duration::ZERO,
            memory: Some(MemoryUsage::default()),
            runtime: RuntimeIdentity::current(),
            random: 0,
        }
    }
}

impl ProcessProbe for FixedProbe {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn uptime(&self) -> Duration {
        self.uptime
    }

    fn memory(&self) -> Result<MemoryUsage, ProbeError> {
        self.memory
            .ok_or_else(|| ProbeError::Unavailable("memory reporter disabled".to_owned()))
    }

    fn runtime(&self) -> RuntimeIdentity {
        self.runtime.clone()
    }

    fn random_below(&self, upper: u32) -> u32 {
        if upper == 0 { 0 } else { self.random % upper }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_samples_stay_in_range() {
        let probe = SystemProbe::new();
        for _ in 0..10_000 {
            assert!(probe.random_below(100) < 100);
        }
        assert_eq!(probe.random_below(0), 0);
    }

    #[test]
    fn random_samples_cover_the_range() {
        let probe = SystemProbe::new();
        let mut buckets = [0u32; 10];
        for _ in 0..20_000 {
            buckets[(probe.random_below(100) / 10) as usize] += 1;
        }

        // 2000 expected per bucket; anything this far off is not uniform.
        for count in buckets {
            assert!((1_500..=2_500).contains(&count), "bucket count {count}");
        }
    }

    #[test]
    fn uptime_is_monotonic() {
        let probe = SystemProbe::new();
        let first = probe.uptime();
        let second = probe.uptime();
        assert!(second >= first);
    }

    #[test]
    fn system_probe_reports_own_memory() {
        let probe = SystemProbe::new();
        let memory = probe.memory().expect("memory snapshot");
        assert!(memory.rss > 0);
        assert!(memory.system_total >= memory.system_used);
    }

    #[test]
    fn runtime_identity_names_platform() {
        let identity = RuntimeIdentity::current();
        assert_eq!(identity.platform, std::env::consts::OS);
        assert!(identity.version.starts_with("rustc "));
    }

    #[test]
    fn fixed_probe_without_memory_fails() {
        let probe = FixedProbe {
            memory: None,
            ..FixedProbe::default()
        };
        assert!(matches!(probe.memory(), Err(ProbeError::Unavailable(_))));
    }

    #[test]
    fn fixed_probe_clamps_random() {
        let probe = FixedProbe {
            random: 142,
            ..FixedProbe::default()
        };
        assert_eq!(probe.random_below(100), 42);
        assert_eq!(probe.random_below(0), 0);
    }

    #[test]
    fn memory_serializes_camel_case() {
        let memory = MemoryUsage {
            rss: 1,
            virtual_memory: 2,
            system_total: 3,
            system_used: 4,
        };
        let value = serde_json::to_value(memory).unwrap();
        assert_eq!(value["virtualMemory"], 2);
        assert_eq!(value["systemTotal"], 3);
    }
}
