//! Decoding CF-style numeric time axes into calendar dates.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::error::ModelError;

/// Calendars whose day arithmetic matches chrono's proleptic Gregorian one.
const GREGORIAN_CALENDARS: &[&str] = &["standard", "gregorian", "proleptic_gregorian"];

/// Unit of a numeric time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "days" | "day" | "d" => Some(Self::Days),
            "hours" | "hour" | "h" => Some(Self::Hours),
            "minutes" | "minute" | "min" => Some(Self::Minutes),
            "seconds" | "second" | "s" => Some(Self::Seconds),
            _ => None,
        }
    }

    fn millis(self) -> f64 {
        match self {
            Self::Days => 86_400_000.0,
            Self::Hours => 3_600_000.0,
            Self::Minutes => 60_000.0,
            Self::Seconds => 1_000.0,
        }
    }
}

/// Parsed `"<unit> since <origin>"` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeUnits {
    unit: TimeUnit,
    origin: NaiveDateTime,
}

impl TimeUnits {
    /// Parses strings such as `"days since 1901-01-01"` or
    /// `"hours since 1850-1-1 00:00:00"`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidTime`] for an unknown unit or an origin
    /// that is not a date.
    pub fn parse(units: &str) -> Result<Self, ModelError> {
        let bad = |why: &str| ModelError::InvalidTime {
            reason: format!("{why}: '{units}'"),
        };
        let (unit, origin) = units
            .split_once(" since ")
            .ok_or_else(|| bad("expected '<unit> since <date>'"))?;
        let unit = TimeUnit::parse(unit.trim()).ok_or_else(|| bad("unknown time unit"))?;

        let mut parts = origin.split_whitespace();
        let date_part = parts.next().ok_or_else(|| bad("missing origin date"))?;
        // ISO 8601 with a 'T' separator carries the time in the same token.
        let (date_str, time_str) = match date_part.split_once('T') {
            Some((d, t)) => (d, Some(t)),
            None => (date_part, parts.next()),
        };
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|_| bad("unparseable origin date"))?;
        let time = match time_str.map(|t| t.trim_end_matches('Z')) {
            Some(t) if t.contains(':') => NaiveTime::parse_from_str(t, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                .map_err(|_| bad("unparseable origin time"))?,
            _ => NaiveTime::MIN,
        };

        Ok(Self {
            unit,
            origin: date.and_time(time),
        })
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn origin(&self) -> NaiveDateTime {
        self.origin
    }

    /// Calendar date of each offset.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidTime`] for non-finite offsets or dates
    /// outside chrono's range.
    pub fn decode(&self, offsets: &[f64]) -> Result<Vec<NaiveDate>, ModelError> {
        offsets
            .iter()
            .map(|&offset| {
                if !offset.is_finite() {
                    return Err(ModelError::InvalidTime {
                        reason: format!("non-finite time offset {offset}"),
                    });
                }
                let millis = (offset * self.unit.millis()).round() as i64;
                TimeDelta::try_milliseconds(millis)
                    .and_then(|delta| self.origin.checked_add_signed(delta))
                    .map(|dt| dt.date())
                    .ok_or_else(|| ModelError::InvalidTime {
                        reason: format!("offset {offset} overflows from {}", self.origin),
                    })
            })
            .collect()
    }
}

/// Rejects calendars that differ from the proleptic Gregorian one.
///
/// A missing attribute means the CF default, `standard`.
///
/// # Errors
///
/// Returns [`ModelError::InvalidTime`] for `noleap`, `360_day` and others.
pub fn check_calendar(calendar: Option<&str>) -> Result<(), ModelError> {
    match calendar {
        None => Ok(()),
        Some(c) if GREGORIAN_CALENDARS.contains(&c.to_lowercase().as_str()) => Ok(()),
        Some(c) => Err(ModelError::InvalidTime {
            reason: format!("unsupported calendar '{c}'"),
        }),
    }
}

/// A time axis, either raw CF offsets or already decoded dates.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeAxis {
    /// Numeric offsets with their `units` and optional `calendar` attribute.
    Offsets {
        values: Vec<f64>,
        units: String,
        calendar: Option<String>,
    },
    /// Decoded calendar dates.
    Dates(Vec<NaiveDate>),
}

impl TimeAxis {
    pub fn len(&self) -> usize {
        match self {
            Self::Offsets { values, .. } => values.len(),
            Self::Dates(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calendar dates of the axis, decoding offsets if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidTime`] if the units or calendar cannot
    /// be handled.
    pub fn dates(&self) -> Result<Vec<NaiveDate>, ModelError> {
        match self {
            Self::Dates(d) => Ok(d.clone()),
            Self::Offsets {
                values,
                units,
                calendar,
            } => {
                check_calendar(calendar.as_deref())?;
                TimeUnits::parse(units)?.decode(values)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_days_since_date() {
        let u = TimeUnits::parse("days since 1901-01-01").unwrap();
        assert_eq!(u.unit(), TimeUnit::Days);
        assert_eq!(u.origin().date(), ymd(1901, 1, 1));
    }

    #[test]
    fn parse_with_time_and_unpadded_date() {
        let u = TimeUnits::parse("hours since 1850-1-1 06:00:00").unwrap();
        assert_eq!(u.unit(), TimeUnit::Hours);
        assert_eq!(u.origin().date(), ymd(1850, 1, 1));
        assert_eq!(u.origin().time(), NaiveTime::from_hms_opt(6, 0, 0).unwrap());
    }

    #[test]
    fn parse_iso_t_separator() {
        let u = TimeUnits::parse("seconds since 2000-01-01T00:00:00Z").unwrap();
        assert_eq!(u.unit(), TimeUnit::Seconds);
        assert_eq!(u.origin().date(), ymd(2000, 1, 1));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(TimeUnits::parse("days after 1901-01-01").is_err());
        assert!(TimeUnits::parse("fortnights since 1901-01-01").is_err());
        assert!(TimeUnits::parse("days since yesterday").is_err());
    }

    #[test]
    fn decode_days_across_leap_day() {
        let u = TimeUnits::parse("days since 2000-02-28").unwrap();
        let d = u.decode(&[0.0, 1.0, 2.0, 0.5]).unwrap();
        assert_eq!(d, vec![ymd(2000, 2, 28), ymd(2000, 2, 29), ymd(2000, 3, 1), ymd(2000, 2, 28)]);
    }

    #[test]
    fn decode_hours() {
        let u = TimeUnits::parse("hours since 2000-01-01 00:00:00").unwrap();
        let d = u.decode(&[23.0, 24.0, 48.0]).unwrap();
        assert_eq!(d, vec![ymd(2000, 1, 1), ymd(2000, 1, 2), ymd(2000, 1, 3)]);
    }

    #[test]
    fn decode_rejects_nan() {
        let u = TimeUnits::parse("days since 2000-01-01").unwrap();
        assert!(u.decode(&[f64::NAN]).is_err());
    }

    #[test]
    fn calendars() {
        assert!(check_calendar(None).is_ok());
        assert!(check_calendar(Some("proleptic_gregorian")).is_ok());
        assert!(check_calendar(Some("Standard")).is_ok());
        assert!(check_calendar(Some("noleap")).is_err());
        assert!(check_calendar(Some("360_day")).is_err());
    }

    #[test]
    fn axis_decodes_offsets() {
        let axis = TimeAxis::Offsets {
            values: vec![0.0, 31.0],
            units: "days since 1979-01-01".to_string(),
            calendar: Some("gregorian".to_string()),
        };
        assert_eq!(axis.len(), 2);
        assert_eq!(axis.dates().unwrap(), vec![ymd(1979, 1, 1), ymd(1979, 2, 1)]);
    }

    #[test]
    fn axis_rejects_noleap() {
        let axis = TimeAxis::Offsets {
            values: vec![0.0],
            units: "days since 1979-01-01".to_string(),
            calendar: Some("noleap".to_string()),
        };
        assert!(matches!(axis.dates(), Err(ModelError::InvalidTime { .. })));
    }
}
