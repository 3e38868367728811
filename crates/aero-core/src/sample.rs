//! Measurement value types and derived quantities.

use micromath::F32Ext;

/// Standard sea-level reference pressure in hPa.
pub const SEA_LEVEL_PRESSURE_HPA: f32 = 1013.25;

/// One complete measurement cycle across both sensors.
///
/// Immutable once captured; the sampling task builds a new value each cycle
/// and publishes it whole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentSample {
    /// Ambient temperature in °C, enclosure offset applied.
    pub temperature_c: f32,
    /// Relative humidity in %, enclosure offset applied.
    pub humidity_pct: f32,
    /// Barometric pressure in hPa.
    pub pressure_hpa: f32,
    /// Altitude in meters, derived from pressure.
    pub altitude_m: f32,
    /// Gas sensor resistance in kΩ.
    pub gas_kohm: f32,
    /// Equivalent CO₂ in ppm.
    pub eco2_ppm: u16,
    /// Total volatile organic compounds in ppb.
    pub tvoc_ppb: u16,
    /// Capture time in unix seconds. Zero until the wall clock is synced.
    pub timestamp: u32,
}

impl EnvironmentSample {
    pub const ZERO: Self = Self {
        temperature_c: 0.0,
        humidity_pct: 0.0,
        pressure_hpa: 0.0,
        altitude_m: 0.0,
        gas_kohm: 0.0,
        eco2_ppm: 0,
        tvoc_ppb: 0,
        timestamp: 0,
    };
}

impl Default for EnvironmentSample {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Altitude in meters from barometric pressure, via the international
/// barometric formula.
///
/// `sea_level_hpa` is the reference pressure at sea level; with the standard
/// 1013.25 hPa this matches the usual pressure-altitude approximation.
pub fn altitude_from_pressure(pressure_hpa: f32, sea_level_hpa: f32) -> f32 {
    44330.0 * (1.0 - (pressure_hpa / sea_level_hpa).powf(0.1903))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn altitude_is_zero_at_reference_pressure() {
        let alt = altitude_from_pressure(SEA_LEVEL_PRESSURE_HPA, SEA_LEVEL_PRESSURE_HPA);
        assert!(alt.abs() < 0.5, "expected ~0 m, got {alt}");
    }

    #[test]
    fn altitude_increases_as_pressure_drops() {
        let mut last = altitude_from_pressure(1013.25, SEA_LEVEL_PRESSURE_HPA);
        for p in [1000.0, 950.0, 900.0, 850.0] {
            let alt = altitude_from_pressure(p, SEA_LEVEL_PRESSURE_HPA);
            assert!(alt > last, "altitude at {p} hPa should exceed {last}");
            last = alt;
        }
    }

    #[test]
    fn altitude_magnitude_is_plausible() {
        // 1000 hPa against the standard reference sits a bit above 100 m.
        let alt = altitude_from_pressure(1000.0, SEA_LEVEL_PRESSURE_HPA);
        assert!((100.0..125.0).contains(&alt), "got {alt}");
    }

    #[test]
    fn altitude_below_sea_level_is_negative() {
        let alt = altitude_from_pressure(1020.0, SEA_LEVEL_PRESSURE_HPA);
        assert!(alt < 0.0, "got {alt}");
    }
}
