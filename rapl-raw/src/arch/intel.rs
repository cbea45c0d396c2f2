//! Intel RAPL register definitions
//!
//! ## References
//!
//! - Intel® 64 and IA-32 Architectures Software Developer's Manual, Volume 3B
//! - Section 14.10: Platform Specific Power Management Support

/// MSR addresses for Intel RAPL
pub mod msr {
    /// RAPL Power Unit MSR - Defines energy, power, and time units
    pub const MSR_RAPL_POWER_UNIT: u64 = 0x606;

    /// Package Energy Status - Total package energy consumption
    pub const MSR_PKG_ENERGY_STATUS: u64 = 0x611;
}
