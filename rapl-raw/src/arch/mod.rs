//! Vendor-specific RAPL register definitions
//!
//! AMD (family 17h and later) and Intel expose the same RAPL programming
//! model through different MSR addresses. The bit layout of the power unit
//! register is shared between both dialects, so a dialect is fully described
//! by a [`RaplLayout`]: two register addresses plus three unit fields.
//!
//! ## Supported Dialects
//!
//! - **AMD** (`amd`) - `MSR_RAPL_PWR_UNIT` / `MSR_PKG_ENERGY_STAT` at `0xC001_029x`
//! - **Intel** (`intel`) - `MSR_RAPL_POWER_UNIT` / `MSR_PKG_ENERGY_STATUS` at `0x6xx`

pub mod amd;
pub mod intel;
pub mod rapl;

use std::fmt;
use std::str::FromStr;

use crate::register::BitField;

/// Processor vendor, selecting which RAPL register dialect to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Amd,
    Intel,
}

impl Vendor {
    pub fn name(&self) -> &'static str {
        match self {
            Vendor::Amd => "AMD",
            Vendor::Intel => "INTEL",
        }
    }

    /// The register layout of this vendor's RAPL implementation
    pub fn layout(&self) -> RaplLayout {
        match self {
            Vendor::Amd => RaplLayout::AMD,
            Vendor::Intel => RaplLayout::INTEL,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("amd") {
            Ok(Vendor::Amd)
        } else if s.eq_ignore_ascii_case("intel") {
            Ok(Vendor::Intel)
        } else {
            Err(format!("unknown vendor '{s}', expected AMD or INTEL"))
        }
    }
}

/// Addresses and unit fields of one RAPL register dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaplLayout {
    /// Power unit register (time, energy and power scales)
    pub units_register: u64,
    /// Package energy status register (wrapping energy accumulator)
    pub energy_register: u64,
    pub time_unit: BitField,
    pub energy_unit: BitField,
    pub power_unit: BitField,
}

impl RaplLayout {
    pub const AMD: RaplLayout = RaplLayout {
        units_register: amd::msr::MSR_RAPL_PWR_UNIT,
        energy_register: amd::msr::MSR_PKG_ENERGY_STAT,
        time_unit: rapl::TIME_UNIT_FIELD,
        energy_unit: rapl::ENERGY_UNIT_FIELD,
        power_unit: rapl::POWER_UNIT_FIELD,
    };

    pub const INTEL: RaplLayout = RaplLayout {
        units_register: intel::msr::MSR_RAPL_POWER_UNIT,
        energy_register: intel::msr::MSR_PKG_ENERGY_STATUS,
        time_unit: rapl::TIME_UNIT_FIELD,
        energy_unit: rapl::ENERGY_UNIT_FIELD,
        power_unit: rapl::POWER_UNIT_FIELD,
    };
}
