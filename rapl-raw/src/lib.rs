//! # rapl-raw
//!
//! RAPL register definitions and MSR device access for AMD and Intel processors.
//!
//! This crate provides type-safe abstractions over MSR (Model-Specific Register)
//! reads and the register constants of both RAPL dialects: the AMD layout
//! (`0xC001_0299` / `0xC001_029B`) and the Intel layout (`0x606` / `0x611`).
//!
//! ## Usage
//!
//! ```ignore
//! use rapl_raw::arch::rapl::RaplPowerUnit;
//! use rapl_raw::{MsrDevice, Vendor};
//!
//! let layout = Vendor::Intel.layout();
//! let device = MsrDevice::open(0)?;
//!
//! let units = RaplPowerUnit::decode(device.read(layout.units_register)?, &layout);
//! let energy = device.read(layout.energy_register)?;
//! println!("{} J", energy as f64 * units.energy_unit_multiplier());
//! ```

pub mod arch;
pub mod msr;
pub mod register;

// Re-export for convenience
pub use arch::rapl::{RaplEnergyStatus, RaplPowerUnit};
pub use arch::{RaplLayout, Vendor};
pub use msr::{MsrDevice, MsrError, Result};
pub use register::{BitField, RegisterLayout};
