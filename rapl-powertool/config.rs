use std::path::PathBuf;

use rapl_raw::{RaplLayout, Vendor};

/// Default delay between two rate samples, in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Highest logical core id checked during discovery (exclusive)
pub const MAX_CORES: u32 = 1024;

/// Maximum number of distinct physical packages
pub const MAX_PACKAGES: usize = 16;

pub const DEFAULT_TOPOLOGY_ROOT: &str = "/sys/devices/system/cpu";

/// What the sampler reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Average power in Watts, one line every `interval_ms`, forever
    Rate { interval_ms: u64 },
    /// Energy in Joules consumed over `duration_ms`, one line
    Total { duration_ms: u64 },
}

impl Mode {
    /// Pick the mode from the command line values: a positive duration wins
    pub fn from_options(interval_ms: u64, duration_ms: Option<u64>) -> Self {
        match duration_ms {
            Some(duration_ms) if duration_ms > 0 => Mode::Total { duration_ms },
            _ => Mode::Rate { interval_ms },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PowertoolConfig {
    pub vendor: Vendor,
    pub mode: Mode,
    pub topology_root: PathBuf,
    pub device_root: PathBuf,
    pub max_cores: u32,
    pub max_packages: usize,
}

impl PowertoolConfig {
    /// Configuration targeting the real sysfs and MSR device trees
    pub fn new(vendor: Vendor, mode: Mode) -> Self {
        Self {
            vendor,
            mode,
            topology_root: PathBuf::from(DEFAULT_TOPOLOGY_ROOT),
            device_root: PathBuf::from(rapl_raw::msr::DEFAULT_DEVICE_ROOT),
            max_cores: MAX_CORES,
            max_packages: MAX_PACKAGES,
        }
    }

    pub fn layout(&self) -> RaplLayout {
        self.vendor.layout()
    }
}
