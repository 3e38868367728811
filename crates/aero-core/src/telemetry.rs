//! Telemetry upload record.
//!
//! The channel ingestion endpoint accepts a flat JSON object with the write
//! key and up to eight numbered data fields; this device uploads four of
//! them. Serialization to the wire happens in the firmware, which owns the
//! JSON encoder and the socket.

use serde::Serialize;

use crate::shared::Snapshot;

/// One upload's worth of data for the channel endpoint.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord<'a> {
    #[serde(rename = "writeKey")]
    pub write_key: &'a str,
    /// Temperature, °C.
    pub d1: f32,
    /// Relative humidity, %.
    pub d2: f32,
    /// Pressure, hPa.
    pub d3: f32,
    /// eCO₂, ppm.
    pub d4: f32,
}

impl<'a> TelemetryRecord<'a> {
    pub fn from_snapshot(write_key: &'a str, snapshot: &Snapshot) -> Self {
        Self {
            write_key,
            d1: snapshot.current.temperature_c,
            d2: snapshot.current.humidity_pct,
            d3: snapshot.current.pressure_hpa,
            d4: snapshot.current.eco2_ppm as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::EnvironmentSample;

    #[test]
    fn record_maps_the_four_uploaded_metrics() {
        let mut snapshot = Snapshot::EMPTY;
        snapshot.current = EnvironmentSample {
            temperature_c: 22.5,
            humidity_pct: 41.0,
            pressure_hpa: 1009.8,
            eco2_ppm: 734,
            tvoc_ppb: 55,
            ..EnvironmentSample::ZERO
        };

        let record = TelemetryRecord::from_snapshot("abc123", &snapshot);
        assert_eq!(record.write_key, "abc123");
        assert_eq!(record.d1, 22.5);
        assert_eq!(record.d2, 41.0);
        assert_eq!(record.d3, 1009.8);
        assert_eq!(record.d4, 734.0);
    }
}
