use std::path::Path;

use super::error::DataError;
use super::loader::parse_file;
use super::model::{DateRange, Measurement, Series};

// ---------------------------------------------------------------------------
// Date-range filter
// ---------------------------------------------------------------------------

/// Keep the measurements whose calendar day lies in `range`, in source order.
pub fn filter_by_range(measurements: &[Measurement], range: &DateRange) -> Vec<Measurement> {
    measurements
        .iter()
        .filter(|m| range.contains(&m.timestamp))
        .copied()
        .collect()
}

/// Parse the data file and restrict it to `range`.
///
/// Nothing is cached: every call reads the file again. An empty series is a
/// valid result.
pub fn load_series(path: &Path, range: DateRange) -> Result<Series, DataError> {
    let measurements = parse_file(path)?;
    let total = measurements.len();
    let filtered = filter_by_range(&measurements, &range);
    log::info!("{} of {total} measurements fall in {range}", filtered.len());
    Ok(Series {
        range,
        measurements: filtered,
    })
}
