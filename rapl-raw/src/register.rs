//! Generic register abstractions for typed MSR decoding

/// Trait for register layouts that can be decoded from raw MSR values
///
/// # Example
///
/// ```ignore
/// use rapl_raw::register::RegisterLayout;
///
/// #[derive(Debug, Default)]
/// struct EnergyStatus {
///     counter: u32,
/// }
///
/// impl RegisterLayout for EnergyStatus {
///     fn from_msr_value(value: u64) -> Self {
///         Self {
///             counter: (value & 0xFFFF_FFFF) as u32,
///         }
///     }
/// }
/// ```
pub trait RegisterLayout: Sized {
    /// Parse a raw MSR value into this register layout
    fn from_msr_value(value: u64) -> Self;
}

/// A contiguous bit field inside a 64-bit register, described by mask and shift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    /// Mask selecting the field in place (already shifted)
    pub mask: u64,
    /// Position of the least significant bit of the field
    pub shift: u32,
}

impl BitField {
    pub const fn new(mask: u64, shift: u32) -> Self {
        Self { mask, shift }
    }

    /// Extract the field value from a raw register value
    pub const fn extract(&self, raw: u64) -> u64 {
        (raw & self.mask) >> self.shift
    }
}
