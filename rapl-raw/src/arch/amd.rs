//! AMD RAPL register definitions (family 17h/19h, Zen and later)
//!
//! ## References
//!
//! - AMD Processor Programming Reference (PPR) for Family 17h, MSRC001_0299..029B

/// MSR addresses for AMD RAPL
pub mod msr {
    /// RAPL Power Unit - Defines energy, power, and time units
    pub const MSR_RAPL_PWR_UNIT: u64 = 0xC001_0299;

    /// Package Energy Status - Total package energy consumption
    pub const MSR_PKG_ENERGY_STAT: u64 = 0xC001_029B;
}
