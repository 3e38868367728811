//! Wall-clock conversion and formatting.
//!
//! The firmware keeps time as unix seconds (seeded once from NTP at boot);
//! this module turns that into a civil date/time at a fixed UTC offset and
//! formats the clock line. The date conversion is the standard days-from-epoch
//! algorithm for the proleptic Gregorian calendar.

use heapless::String;

/// Maximum length of the formatted clock line, `YYYY-MM-DD HH:MM:SS`.
pub const CLOCK_STRING_LEN: usize = 19;

/// A civil date and time at some fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilDateTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CivilDateTime {
    /// Fixed-width `YYYY-MM-DD HH:MM:SS` clock string.
    pub fn format(&self) -> String<CLOCK_STRING_LEN> {
        let mut s = String::new();
        let _ = core::fmt::write(
            &mut s,
            format_args!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                self.year, self.month, self.day, self.hour, self.minute, self.second
            ),
        );
        s
    }
}

/// Convert unix seconds to a civil date/time at the given UTC offset.
pub fn civil_from_unix(unix_secs: i64, utc_offset_secs: i32) -> CivilDateTime {
    let local = unix_secs + utc_offset_secs as i64;
    let days = local.div_euclid(86_400);
    let secs = local.rem_euclid(86_400);

    let (year, month, day) = civil_from_days(days);
    CivilDateTime {
        year,
        month,
        day,
        hour: (secs / 3600) as u8,
        minute: (secs / 60 % 60) as u8,
        second: (secs % 60) as u8,
    }
}

/// Days since 1970-01-01 to (year, month, day).
fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };

    let year = if month <= 2 { year + 1 } else { year };
    (year as i32, month as u8, day as u8)
}
