use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Local, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceheadError};

/// `MMMM D YYYY, HH:mm:ss.SSS`, the header's standard timestamp shape.
const DATETIME_FORMAT: &str = "%B %-d %Y, %H:%M:%S%.3f";

const ONE_MILLISECOND: u64 = 1_000;
const ONE_SECOND: u64 = 1_000 * ONE_MILLISECOND;
const ONE_MINUTE: u64 = 60 * ONE_SECOND;
const ONE_HOUR: u64 = 60 * ONE_MINUTE;
const ONE_DAY: u64 = 24 * ONE_HOUR;

struct UnitStep {
    unit: &'static str,
    micros: u64,
    of_previous: u64,
}

const UNIT_STEPS: [UnitStep; 6] = [
    UnitStep { unit: "d", micros: ONE_DAY, of_previous: 24 },
    UnitStep { unit: "h", micros: ONE_HOUR, of_previous: 60 },
    UnitStep { unit: "m", micros: ONE_MINUTE, of_previous: 60 },
    UnitStep { unit: "s", micros: ONE_SECOND, of_previous: 1000 },
    UnitStep { unit: "ms", micros: ONE_MILLISECOND, of_previous: 1000 },
    UnitStep { unit: "μs", micros: 1, of_previous: 1000 },
];

/// Formatting collaborator used by the summary projector.
pub trait TraceFormatter {
    fn format_datetime(&self, micros: i64) -> String;
    fn format_duration(&self, micros: u64) -> String;
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    #[default]
    Utc,
    Local,
}

impl FromStr for TimeZoneMode {
    type Err = TraceheadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" | "z" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => Err(TraceheadError::Parse(format!("unknown time zone mode: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter {
    pub time_zone: TimeZoneMode,
}

impl DefaultFormatter {
    pub fn new(time_zone: TimeZoneMode) -> Self {
        Self { time_zone }
    }
}

impl TraceFormatter for DefaultFormatter {
    fn format_datetime(&self, micros: i64) -> String {
        let Some(ts) = DateTime::<Utc>::from_timestamp_micros(micros) else {
            return micros.to_string();
        };
        match self.time_zone {
            TimeZoneMode::Utc => ts.format(DATETIME_FORMAT).to_string(),
            TimeZoneMode::Local => ts.with_timezone(&Local).format(DATETIME_FORMAT).to_string(),
        }
    }

    fn format_duration(&self, micros: u64) -> String {
        format_duration(micros)
    }
}

/// Formats a duration with the largest unit that fits. Sub-minute units
/// render as a decimal with up to two places; larger units render as a
/// whole primary unit plus the next unit down, e.g. `1m 30s`.
pub fn format_duration(micros: u64) -> String {
    let idx = UNIT_STEPS
        .iter()
        .position(|step| step.micros <= micros)
        .unwrap_or(UNIT_STEPS.len() - 1);
    let primary = &UNIT_STEPS[idx];

    if primary.of_previous == 1000 {
        let value = round2(micros as f64 / primary.micros as f64);
        return format!("{value}{}", primary.unit);
    }

    let secondary = &UNIT_STEPS[idx + 1];
    let primary_value = micros / primary.micros;
    let secondary_value =
        ((micros as f64 / secondary.micros as f64) % primary.of_previous as f64).round() as u64;
    if secondary_value == 0 {
        format!("{primary_value}{}", primary.unit)
    } else {
        format!(
            "{primary_value}{} {secondary_value}{}",
            primary.unit, secondary.unit
        )
    }
}

/// Splits a formatted timestamp into its whole-second part and sub-second
/// tail so the two can be styled apart.
pub fn split_datetime(formatted: &str) -> (String, Option<String>) {
    static FRACTION: OnceLock<Option<Regex>> = OnceLock::new();
    let re = FRACTION.get_or_init(|| Regex::new(r"^(.+)(\.\d+)$").ok());

    if let Some(caps) = re.as_ref().and_then(|re| re.captures(formatted))
        && let (Some(main), Some(detail)) = (caps.get(1), caps.get(2))
    {
        return (main.as_str().to_string(), Some(detail.as_str().to_string()));
    }
    (formatted.to_string(), None)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn unit_rank(formatted: &str) -> usize {
        let primary = formatted.split(' ').next().unwrap_or_default();
        let unit = primary.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
        UNIT_STEPS
            .iter()
            .position(|s| s.unit == unit)
            .map(|i| UNIT_STEPS.len() - i)
            .unwrap()
    }

    #[test]
    fn formats_datetime_in_utc() {
        let base = Utc
            .with_ymd_and_hms(2026, 2, 1, 0, 0, 0)
            .unwrap()
            .timestamp_micros();
        let fmt = DefaultFormatter::new(TimeZoneMode::Utc);
        assert_eq!(
            fmt.format_datetime(base + 123_456),
            "February 1 2026, 00:00:00.123"
        );
    }

    #[test]
    fn out_of_range_timestamp_falls_back_to_raw_value() {
        let fmt = DefaultFormatter::default();
        assert_eq!(fmt.format_datetime(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn splits_sub_second_tail() {
        let (main, detail) = split_datetime("February 1 2026, 00:00:00.123");
        assert_eq!(main, "February 1 2026, 00:00:00");
        assert_eq!(detail.as_deref(), Some(".123"));
    }

    #[test]
    fn split_without_fraction_keeps_whole_string() {
        let (main, detail) = split_datetime("1769904000000000");
        assert_eq!(main, "1769904000000000");
        assert!(detail.is_none());
    }

    #[test]
    fn formats_sub_minute_durations_as_decimals() {
        assert_eq!(format_duration(0), "0μs");
        assert_eq!(format_duration(999), "999μs");
        assert_eq!(format_duration(1_500), "1.5ms");
        assert_eq!(format_duration(12_000), "12ms");
        assert_eq!(format_duration(2_345_678), "2.35s");
    }

    #[test]
    fn formats_large_durations_with_secondary_unit() {
        assert_eq!(format_duration(60 * ONE_SECOND), "1m");
        assert_eq!(format_duration(61 * ONE_SECOND), "1m 1s");
        assert_eq!(format_duration(ONE_HOUR), "1h");
        assert_eq!(format_duration(ONE_DAY + ONE_HOUR + ONE_MINUTE), "1d 1h");
    }

    #[test]
    fn unit_never_shrinks_as_duration_grows() {
        let samples = [
            0,
            7,
            999,
            1_000,
            45_000,
            999_999,
            ONE_SECOND,
            59 * ONE_SECOND,
            ONE_MINUTE,
            ONE_HOUR - 1,
            ONE_HOUR,
            3 * ONE_DAY,
        ];
        let ranks: Vec<usize> = samples
            .iter()
            .map(|d| unit_rank(&format_duration(*d)))
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "{ranks:?}");
    }

    #[test]
    fn parses_time_zone_mode() {
        assert_eq!("UTC".parse::<TimeZoneMode>().unwrap(), TimeZoneMode::Utc);
        assert_eq!("local".parse::<TimeZoneMode>().unwrap(), TimeZoneMode::Local);
        assert!("mars".parse::<TimeZoneMode>().is_err());
    }
}
