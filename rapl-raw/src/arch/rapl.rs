//! RAPL (Running Average Power Limit) register layouts shared by both vendors
//!
//! RAPL provides energy consumption monitoring for various power domains.
//! Only the package domain is decoded here.

use crate::register::{BitField, RegisterLayout};

/// Time units field of the power unit register (bits 16-19)
pub const TIME_UNIT_FIELD: BitField = BitField::new(0xF0000, 16);

/// Energy status units field of the power unit register (bits 8-12)
pub const ENERGY_UNIT_FIELD: BitField = BitField::new(0x1F00, 8);

/// Power units field of the power unit register (bits 0-3)
pub const POWER_UNIT_FIELD: BitField = BitField::new(0xF, 0);

/// The energy accumulator occupies the low 32 bits of the energy status register
pub const ENERGY_COUNTER_MASK: u64 = 0xFFFF_FFFF;

/// RAPL Power Unit Register layout
///
/// Defines the units for energy, power, and time measurements.
///
/// ## Register Format
///
/// | Bits   | Field        | Description                           |
/// |--------|--------------|---------------------------------------|
/// | 0-3    | power_units  | Power units (1/2^PU watts)            |
/// | 4-7    | reserved     |                                       |
/// | 8-12   | energy_units | Energy units (1/2^ESU joules)         |
/// | 13-15  | reserved     |                                       |
/// | 16-19  | time_units   | Time units (1/2^TU seconds)           |
/// | 20-63  | reserved     |                                       |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaplPowerUnit {
    /// Power units: watts = value * (1.0 / 2^power_units)
    pub power_units: u8,

    /// Energy units: joules = value * (1.0 / 2^energy_units)
    pub energy_units: u8,

    /// Time units: seconds = value * (1.0 / 2^time_units)
    pub time_units: u8,
}

impl RaplPowerUnit {
    /// Decode a power unit register value using the fields of `layout`
    pub fn decode(value: u64, layout: &super::RaplLayout) -> Self {
        Self {
            power_units: layout.power_unit.extract(value) as u8,
            energy_units: layout.energy_unit.extract(value) as u8,
            time_units: layout.time_unit.extract(value) as u8,
        }
    }

    /// Get power unit multiplier (watts per LSB)
    pub fn power_unit_multiplier(&self) -> f64 {
        0.5f64.powi(self.power_units as i32)
    }

    /// Get energy unit multiplier (joules per LSB)
    pub fn energy_unit_multiplier(&self) -> f64 {
        0.5f64.powi(self.energy_units as i32)
    }

    /// Get time unit multiplier (seconds per LSB)
    pub fn time_unit_multiplier(&self) -> f64 {
        0.5f64.powi(self.time_units as i32)
    }
}

/// Package energy status register: a wrapping 32-bit energy accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaplEnergyStatus {
    pub counter: u32,
}

impl RegisterLayout for RaplEnergyStatus {
    fn from_msr_value(value: u64) -> Self {
        Self {
            counter: (value & ENERGY_COUNTER_MASK) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::RaplLayout;

    #[test]
    fn test_decode_intel_sample() {
        // Typical Intel client value: 1/8 W, 1/16384 J (~61 uJ), 1/1024 s
        let unit = RaplPowerUnit::decode(0x000A_0E03, &RaplLayout::INTEL);

        assert_eq!(unit.power_units, 3);
        assert_eq!(unit.energy_units, 14);
        assert_eq!(unit.time_units, 10);
        assert_eq!(unit.power_unit_multiplier(), 1.0 / 8.0);
        assert_eq!(unit.energy_unit_multiplier(), 1.0 / 16384.0);
        assert_eq!(unit.time_unit_multiplier(), 1.0 / 1024.0);
    }

    #[test]
    fn test_decode_follows_mask_and_shift() {
        let raw = 0x0000_A0E2;
        let unit = RaplPowerUnit::decode(raw, &RaplLayout::AMD);

        let expected = 0.5f64.powi(((raw & 0x1F00) >> 8) as i32);
        assert_eq!(unit.energy_unit_multiplier(), expected);
        assert_eq!(unit.energy_unit_multiplier(), 1.0);
        assert_eq!(unit.power_unit_multiplier(), 0.25);
    }

    #[test]
    fn test_decode_amd_sample() {
        // Zen 2/3 value: 1/8 W, 1/65536 J (~15.3 uJ), 1/1024 s
        let unit = RaplPowerUnit::decode(0x000A_1003, &RaplLayout::AMD);
        assert_eq!(unit.energy_units, 16);
        assert_eq!(unit.energy_unit_multiplier(), 1.0 / 65536.0);
    }

    #[test]
    fn test_decode_uses_layout_fields() {
        // Same raw value, energy field moved to bits 0-3
        let layout = RaplLayout {
            energy_unit: BitField::new(0xF, 0),
            ..RaplLayout::INTEL
        };
        let unit = RaplPowerUnit::decode(0x000A_0E03, &layout);
        assert_eq!(unit.energy_units, 3);
        assert_eq!(unit.power_units, 3);
        assert_eq!(unit.time_units, 10);
    }

    #[test]
    fn test_energy_status_ignores_upper_bits() {
        let status = RaplEnergyStatus::from_msr_value(0xDEAD_BEEF_0000_0005);
        assert_eq!(status.counter, 5);
    }
}
