//! MSR (Model-Specific Register) read primitives
//!
//! This module provides low-level MSR access through `/dev/cpu/*/msr`. The
//! device file is addressed by register number: reading 8 bytes at file
//! offset `msr` returns the 64-bit register value. For logging and the
//! sampler-facing handle abstraction, see `rapl-powertool`.

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

/// Root of the per-core MSR device files on Linux
pub const DEFAULT_DEVICE_ROOT: &str = "/dev/cpu";

pub type Result<T> = std::result::Result<T, MsrError>;

/// Errors that can occur during MSR operations
#[derive(Debug, thiserror::Error)]
pub enum MsrError {
    /// The kernel reports no such CPU (`ENXIO`)
    #[error("No CPU {cpu}")]
    NoSuchCpu { cpu: u32 },

    /// The CPU exists but does not support MSR access (`EIO`)
    #[error("CPU {cpu} doesn't support MSRs")]
    Unsupported { cpu: u32 },

    #[error("Failed to open {} for CPU {cpu}: {source}", .path.display())]
    OpenFailed {
        cpu: u32,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to read MSR 0x{msr:X} on CPU {cpu}: {source}")]
    ReadFailed {
        cpu: u32,
        msr: u64,
        source: io::Error,
    },
}

/// Path of the MSR device file for `cpu` below `root`
pub fn device_path(root: impl AsRef<Path>, cpu: u32) -> PathBuf {
    root.as_ref().join(cpu.to_string()).join("msr")
}

/// An open, read-only MSR device for one logical CPU
#[derive(Debug)]
pub struct MsrDevice {
    file: File,
    cpu: u32,
    path: PathBuf,
}

impl MsrDevice {
    /// Open the MSR device of `cpu` in [`DEFAULT_DEVICE_ROOT`]
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The CPU does not exist ([`MsrError::NoSuchCpu`])
    /// - The CPU does not support MSRs ([`MsrError::Unsupported`])
    /// - The device cannot be opened for any other reason, e.g. the `msr`
    ///   kernel module is not loaded or the caller lacks `CAP_SYS_RAWIO`
    pub fn open(cpu: u32) -> Result<Self> {
        Self::open_in(DEFAULT_DEVICE_ROOT, cpu)
    }

    /// Open the MSR device of `cpu` below an arbitrary device root
    pub fn open_in(root: impl AsRef<Path>, cpu: u32) -> Result<Self> {
        let path = device_path(root, cpu);
        let file = File::open(&path).map_err(|e| classify_open_error(cpu, &path, e))?;
        Ok(Self { file, cpu, path })
    }

    /// Read a 64-bit value from an MSR
    ///
    /// A short read is reported as [`MsrError::ReadFailed`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// use rapl_raw::MsrDevice;
    ///
    /// let device = MsrDevice::open(0)?;
    /// let value = device.read(0x606)?;
    /// println!("MSR 0x606 = 0x{:016X}", value);
    /// ```
    pub fn read(&self, msr: u64) -> Result<u64> {
        let mut buffer = [0u8; 8];
        self.file
            .read_exact_at(&mut buffer, msr)
            .map_err(|e| MsrError::ReadFailed {
                cpu: self.cpu,
                msr,
                source: e,
            })?;

        Ok(u64::from_le_bytes(buffer))
    }

    pub fn cpu(&self) -> u32 {
        self.cpu
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn classify_open_error(cpu: u32, path: &Path, source: io::Error) -> MsrError {
    match source.raw_os_error() {
        Some(libc::ENXIO) => MsrError::NoSuchCpu { cpu },
        Some(libc::EIO) => MsrError::Unsupported { cpu },
        _ => MsrError::OpenFailed {
            cpu,
            path: path.to_path_buf(),
            source,
        },
    }
}
