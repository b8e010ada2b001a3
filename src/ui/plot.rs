use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use eframe::egui::{Color32, Ui};
use egui_plot::{
    uniform_grid_spacer, Corner, GridInput, GridMark, Legend, Line, MarkerShape, Plot, PlotPoint,
    PlotPoints, Points,
};

use crate::data::model::{format_percent, Measurement, DAY_FORMAT, TIMESTAMP_FORMAT};
use crate::state::AppState;

const SERIES_NAME: &str = "AC Measurements Active Percent";
const HIGHLIGHT_NAME: &str = "Selected Points";
const SERIES_COLOR: Color32 = Color32::from_rgb(30, 144, 255);
const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_WEEK: f64 = 7.0 * SECONDS_PER_DAY;
const SECONDS_PER_MONTH: f64 = 30.436_875 * SECONDS_PER_DAY;
/// 1970-01-05, the first Monday after the epoch. Week marks start on Mondays.
const FIRST_MONDAY: f64 = 4.0 * SECONDS_PER_DAY;
/// Upper bound on day marks drawn at once; beyond it days are skipped.
const MAX_DAY_MARKS: f64 = 400.0;
const MAX_CALENDAR_MARKS: usize = 2_000;

// ---------------------------------------------------------------------------
// Tick density
// ---------------------------------------------------------------------------

/// How x-axis ticks are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStrategy {
    /// One tick per calendar day.
    Daily,
    /// Calendar-aligned spacing that follows the zoom level.
    Adaptive,
}

pub fn tick_strategy(rows: usize, dense_threshold: usize) -> TickStrategy {
    if rows > dense_threshold {
        TickStrategy::Adaptive
    } else {
        TickStrategy::Daily
    }
}

/// Grid marks at every midnight inside the visible bounds.
pub fn daily_grid_spacer(input: GridInput) -> Vec<GridMark> {
    let (min, max) = input.bounds;
    let first = (min / SECONDS_PER_DAY).floor();
    let last = (max / SECONDS_PER_DAY).ceil();
    if !(first.is_finite() && last.is_finite()) || last < first {
        return Vec::new();
    }
    let stride = ((last - first) / MAX_DAY_MARKS).ceil().max(1.0);
    let step_size = stride * SECONDS_PER_DAY;

    let mut marks = Vec::new();
    let mut day = first;
    while day <= last {
        marks.push(GridMark {
            value: day * SECONDS_PER_DAY,
            step_size,
        });
        day += stride;
    }
    marks
}

/// A tick interval on the time axis.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CalendarStep {
    Seconds(f64),
    Months(i64),
}

use CalendarStep::{Months, Seconds};

/// Candidate intervals, finest first.
const CALENDAR_STEPS: &[CalendarStep] = &[
    Seconds(60.0),
    Seconds(300.0),
    Seconds(900.0),
    Seconds(1_800.0),
    Seconds(SECONDS_PER_HOUR),
    Seconds(3.0 * SECONDS_PER_HOUR),
    Seconds(6.0 * SECONDS_PER_HOUR),
    Seconds(12.0 * SECONDS_PER_HOUR),
    Seconds(SECONDS_PER_DAY),
    Seconds(SECONDS_PER_WEEK),
    Months(1),
    Months(3),
    Months(6),
    Months(12),
    Months(24),
    Months(60),
    Months(120),
];

impl CalendarStep {
    fn approx_seconds(self) -> f64 {
        match self {
            Seconds(s) => s,
            Months(k) => k as f64 * SECONDS_PER_MONTH,
        }
    }

    fn origin(self) -> f64 {
        if self == Seconds(SECONDS_PER_WEEK) {
            FIRST_MONDAY
        } else {
            0.0
        }
    }

    /// Whether `x` sits on a whole multiple of this step.
    fn aligned(self, x: f64) -> bool {
        match self {
            Seconds(s) => (x - self.origin()).rem_euclid(s) == 0.0,
            Months(k) => from_plot_x(x).is_some_and(|ts| {
                ts.day() == 1
                    && ts.num_seconds_from_midnight() == 0
                    && month_index(&ts.date()).rem_euclid(k) == 0
            }),
        }
    }
}

fn month_index(date: &NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

fn month_start(index: i64) -> Option<NaiveDateTime> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

/// Grid marks on whole minutes, hours, days, Monday-weeks or month starts,
/// picking the finest interval at least `base_step_size` wide. Each mark
/// carries the coarsest interval it is aligned to, so egui_plot labels the
/// round ones first.
pub fn calendar_grid_spacer(input: GridInput) -> Vec<GridMark> {
    let (min, max) = input.bounds;
    if !(min.is_finite() && max.is_finite()) || max < min {
        return Vec::new();
    }
    let fine = CALENDAR_STEPS
        .iter()
        .copied()
        .find(|step| step.approx_seconds() >= input.base_step_size)
        .unwrap_or(Months(120));

    let mut values = Vec::new();
    match fine {
        Seconds(s) => {
            let origin = fine.origin();
            let first = ((min - origin) / s).ceil();
            let mut i = 0.0;
            while values.len() < MAX_CALENDAR_MARKS {
                let x = origin + (first + i) * s;
                if x > max {
                    break;
                }
                values.push(x);
                i += 1.0;
            }
        }
        Months(k) => {
            let Some(start) = from_plot_x(min) else {
                return Vec::new();
            };
            let mut index = month_index(&start.date());
            if !Months(1).aligned(min) {
                index += 1;
            }
            index = -(-index).div_euclid(k) * k;
            while values.len() < MAX_CALENDAR_MARKS {
                let Some(x) = month_start(index).map(|ts| to_plot_x(&ts)) else {
                    break;
                };
                if x > max {
                    break;
                }
                values.push(x);
                index += k;
            }
        }
    }

    values
        .into_iter()
        .map(|value| {
            let step_size = CALENDAR_STEPS
                .iter()
                .rev()
                .find(|step| step.aligned(value))
                .unwrap_or(&fine)
                .approx_seconds();
            GridMark { value, step_size }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Time axis conversions
// ---------------------------------------------------------------------------

/// Plot x coordinate: seconds since the epoch, wall time taken as UTC.
pub fn to_plot_x(timestamp: &NaiveDateTime) -> f64 {
    timestamp.and_utc().timestamp() as f64
}

pub fn from_plot_x(x: f64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(x.round() as i64, 0).map(|dt| dt.naive_utc())
}

fn day_label(x: f64) -> String {
    from_plot_x(x)
        .map(|ts| ts.format(DAY_FORMAT).to_string())
        .unwrap_or_default()
}

/// Tick label: the date, plus the time of day for sub-day marks.
fn axis_label(mark: &GridMark) -> String {
    if mark.step_size >= SECONDS_PER_DAY {
        return day_label(mark.value);
    }
    from_plot_x(mark.value)
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Hover text for a highlighted point: exact timestamp and value.
pub fn highlight_label(point: &Measurement) -> String {
    format!(
        "Time: {}\nValue: {}%",
        point.timestamp.format(TIMESTAMP_FORMAT),
        format_percent(point.percent)
    )
}

fn nearest<'a>(points: &'a [Measurement], x: f64) -> Option<&'a Measurement> {
    points.iter().min_by(|a, b| {
        let da = (to_plot_x(&a.timestamp) - x).abs();
        let db = (to_plot_x(&b.timestamp) - x).abs();
        da.total_cmp(&db)
    })
}

// ---------------------------------------------------------------------------
// Activity chart (visualization tab)
// ---------------------------------------------------------------------------

/// Render the line chart with its filled area and the highlight overlay.
pub fn activity_plot(ui: &mut Ui, state: &AppState) {
    let series = match &state.series {
        Some(s) => s,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("The chart is shown here once a visualization has run");
            });
            return;
        }
    };

    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading("AC Measurements Active Percent Over Time");
    });

    let highlighted = state.highlighted();
    let hover_points = highlighted.clone();

    let mut plot = Plot::new("activity_plot")
        .legend(Legend::default().position(Corner::LeftTop))
        .x_axis_label(format!("Time From ({})", series.range))
        .y_axis_label("Percent")
        .include_y(0.0)
        .include_y(100.0)
        .y_grid_spacer(uniform_grid_spacer(|_input| [10.0, 50.0, 100.0]))
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| axis_label(&mark))
        .label_formatter(move |name: &str, value: &PlotPoint| {
            if name == HIGHLIGHT_NAME {
                return nearest(&hover_points, value.x)
                    .map(highlight_label)
                    .unwrap_or_default();
            }
            let time = from_plot_x(value.x)
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default();
            if name.is_empty() {
                format!("{time}\n{:.1}%", value.y)
            } else {
                format!("{name}\n{time}\n{:.1}%", value.y)
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    plot = match tick_strategy(series.len(), state.settings.dense_threshold) {
        TickStrategy::Daily => plot.x_grid_spacer(daily_grid_spacer),
        TickStrategy::Adaptive => plot.x_grid_spacer(calendar_grid_spacer),
    };

    plot.show(ui, |plot_ui| {
        let points: PlotPoints = series
            .measurements
            .iter()
            .map(|m| [to_plot_x(&m.timestamp), m.percent])
            .collect();

        plot_ui.line(
            Line::new(points)
                .name(SERIES_NAME)
                .color(SERIES_COLOR)
                .width(2.0)
                .fill(0.0),
        );

        if !highlighted.is_empty() {
            let marks: PlotPoints = highlighted
                .iter()
                .map(|m| [to_plot_x(&m.timestamp), m.percent])
                .collect();
            plot_ui.points(
                Points::new(marks)
                    .name(HIGHLIGHT_NAME)
                    .color(Color32::RED)
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(5.0),
            );
        }
    });
}
