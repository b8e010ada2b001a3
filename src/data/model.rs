use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// Measurement – one valid row of the data file
// ---------------------------------------------------------------------------

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// A parsed row: both required columns converted to typed values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub timestamp: NaiveDateTime,
    /// Share of active AC measurements, nominally 0..=100.
    /// Values outside that range are kept as-is.
    pub percent: f64,
}

impl Measurement {
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// One export / clipboard line: `YYYY-MM-DD HH:MM:SS : VALUE%`.
    pub fn export_line(&self) -> String {
        format!(
            "{} : {}%",
            self.timestamp.format(TIMESTAMP_FORMAT),
            format_percent(self.percent)
        )
    }
}

/// Render a percentage the way the data overview shows it: whole numbers
/// keep one decimal (`42.0`), everything else uses the shortest exact form.
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

// ---------------------------------------------------------------------------
// DateRange – inclusive calendar range
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` range of calendar days.
///
/// A reversed range (`start > end`) is allowed and simply contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether the timestamp's calendar day lies inside the range.
    /// The whole end day is included.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let day = timestamp.date();
        self.start <= day && day <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DAY_FORMAT),
            self.end.format(DAY_FORMAT)
        )
    }
}

// ---------------------------------------------------------------------------
// Series – measurements restricted to a date range
// ---------------------------------------------------------------------------

/// The filtered series, in source-file order, tagged with its range.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub range: DateRange,
    pub measurements: Vec<Measurement>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Distinct calendar days, in order of first appearance.
    pub fn distinct_days(&self) -> Vec<NaiveDate> {
        let mut seen = BTreeSet::new();
        self.measurements
            .iter()
            .map(Measurement::day)
            .filter(|day| seen.insert(*day))
            .collect()
    }

    /// Indices of the measurements that fall on any of the given days.
    pub fn indices_on_days(&self, days: &BTreeSet<NaiveDate>) -> Vec<usize> {
        self.measurements
            .iter()
            .enumerate()
            .filter(|(_, m)| days.contains(&m.day()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Newline-terminated clipboard text, one line per measurement.
    pub fn export_text(&self) -> String {
        self.measurements
            .iter()
            .map(|m| m.export_line() + "\n")
            .collect()
    }
}
