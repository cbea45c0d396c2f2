use std::path::{Path, PathBuf};

use rapl_raw::MsrDevice;

use crate::error::Result;

/// Read access to the registers of one logical core
pub trait RegisterAccess {
    fn cpu_id(&self) -> u32;

    fn read(&mut self, addr: u64) -> Result<u64>;
}

/// Opens register handles by core id
pub trait RegisterBackend {
    type Handle: RegisterAccess;

    fn open(&self, cpu: u32) -> Result<Self::Handle>;
}

pub struct MsrHandle {
    device: MsrDevice,
}

impl MsrHandle {
    pub fn new(device_root: &Path, cpu: u32) -> Result<Self> {
        let device = MsrDevice::open_in(device_root, cpu)?;

        tracing::info!(
            "Opened MSR handle {} for core {}",
            device.path().display(),
            cpu
        );

        Ok(Self { device })
    }
}

impl RegisterAccess for MsrHandle {
    fn cpu_id(&self) -> u32 {
        self.device.cpu()
    }

    fn read(&mut self, addr: u64) -> Result<u64> {
        let value = self.device.read(addr)?;
        tracing::debug!(
            "MSR read: CPU {} MSR 0x{:08x} = 0x{:016x}",
            self.device.cpu(),
            addr,
            value
        );
        Ok(value)
    }
}

/// `/dev/cpu/<N>/msr` device files below a configurable root
#[derive(Debug, Clone)]
pub struct MsrBackend {
    device_root: PathBuf,
}

impl MsrBackend {
    pub fn new(device_root: impl Into<PathBuf>) -> Self {
        Self {
            device_root: device_root.into(),
        }
    }
}

impl RegisterBackend for MsrBackend {
    type Handle = MsrHandle;

    fn open(&self, cpu: u32) -> Result<MsrHandle> {
        MsrHandle::new(&self.device_root, cpu)
    }
}
