//! Conversions between caller-facing distances and wire-facing units.
//!
//! Callers work in micrometers. The HSC-103 expects motor pulses and the
//! DS102 reports positions in millimeters.

/// The fixed distance one motor pulse moves an axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PulseScale {
    /// Micrometers moved per pulse.
    um_per_pulse: f64,
}

impl PulseScale {
    /// Create a scale where one pulse moves `um_per_pulse` micrometers.
    pub const fn new(um_per_pulse: f64) -> Self {
        PulseScale { um_per_pulse }
    }

    /// Micrometers moved per pulse.
    pub const fn um_per_pulse(self) -> f64 {
        self.um_per_pulse
    }

    /// Convert a distance in micrometers to whole pulses.
    ///
    /// The result is truncated toward zero and saturates at the limits of `i64`.
    pub fn to_pulses(self, um: f64) -> i64 {
        (um / self.um_per_pulse) as i64
    }

    /// Convert a pulse count to micrometers.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_micrometers(self, pulses: i64) -> f64 {
        pulses as f64 * self.um_per_pulse
    }
}

/// Convert millimeters to the nearest whole micrometer.
///
/// Rounding, rather than truncating, keeps every digit of a three decimal
/// reading whose product is not exactly representable (`65.526 * 1000.0` is
/// `65525.99999999999`).
pub fn mm_to_um(mm: f64) -> i64 {
    (mm * 1000.0).round() as i64
}
