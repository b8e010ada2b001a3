use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::error::DataError;
use super::model::{DateRange, Measurement};

pub const TIME_COLUMN: &str = "time_from";
pub const PERCENT_COLUMN: &str = "ac_measurements_active_percent";
pub const FIELD_DELIMITER: u8 = b'|';

/// Naive layouts tried in order after RFC 3339.
const TIMESTAMP_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse the downloaded data file into measurements.
pub fn parse_file(path: &Path) -> Result<Vec<Measurement>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_reader(file)
}

/// Parse `|`-delimited text with a header row.
///
/// Rows with an unparsable `time_from` or `ac_measurements_active_percent`
/// are dropped. Only a column that yields no number at all is an error.
pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<Measurement>, DataError> {
    let mut reader = open_reader(reader);

    let headers = reader.headers()?.clone();
    let time_idx = column_index(&headers, TIME_COLUMN)?;
    let percent_idx = column_index(&headers, PERCENT_COLUMN)?;

    let mut measurements = Vec::new();
    let mut dated_rows = 0usize;
    let mut dropped = 0usize;

    for result in reader.records() {
        let record = result?;

        let Some(timestamp) = record.get(time_idx).and_then(parse_timestamp) else {
            dropped += 1;
            continue;
        };
        dated_rows += 1;

        let Some(percent) = record.get(percent_idx).and_then(parse_percent) else {
            dropped += 1;
            continue;
        };

        measurements.push(Measurement { timestamp, percent });
    }

    if dated_rows > 0 && measurements.is_empty() {
        return Err(DataError::NonNumericColumn {
            column: PERCENT_COLUMN,
            rows: dated_rows,
        });
    }

    if dropped > 0 {
        log::warn!("Dropped {dropped} rows with an invalid timestamp or percentage");
    }
    log::debug!("Parsed {} measurements", measurements.len());

    Ok(measurements)
}

/// Earliest and latest calendar day with a valid timestamp, if any.
pub fn coverage(path: &Path) -> Result<Option<DateRange>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = open_reader(file);

    let headers = reader.headers()?.clone();
    let time_idx = column_index(&headers, TIME_COLUMN)?;

    let mut span: Option<DateRange> = None;
    for result in reader.records() {
        let record = result?;
        let Some(day) = record
            .get(time_idx)
            .and_then(parse_timestamp)
            .map(|ts| ts.date())
        else {
            continue;
        };
        span = Some(match span {
            None => DateRange::new(day, day),
            Some(r) => DateRange::new(r.start.min(day), r.end.max(day)),
        });
    }
    Ok(span)
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

fn open_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn column_index(headers: &csv::StringRecord, name: &'static str) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|h| unquote(h) == name)
        .ok_or(DataError::MissingColumn(name))
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"').trim()
}

/// Parse a `time_from` cell. Offsets in RFC 3339 input are dropped and the
/// local wall time is kept.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = unquote(raw);
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Some(ts) = TIMESTAMP_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
    {
        return Some(ts);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse an `ac_measurements_active_percent` cell written with a decimal
/// comma. Non-finite values count as invalid.
pub fn parse_percent(raw: &str) -> Option<f64> {
    let s = unquote(raw);
    if s.is_empty() {
        return None;
    }
    s.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
