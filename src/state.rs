use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{Local, Months, NaiveDate};

use crate::config::Settings;
use crate::data::error::{DataError, FetchError};
use crate::data::fetch::{fetch, Credentials};
use crate::data::filter::load_series;
use crate::data::loader::coverage;
use crate::data::model::{DateRange, Measurement, Series};
use crate::tasks::BackgroundTask;

// ---------------------------------------------------------------------------
// Session phases and notices
// ---------------------------------------------------------------------------

/// Where the session is in the sign-in → download → visualize flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Credentials dialog is open.
    Authenticating,
    Downloading,
    Downloaded,
    Visualizing,
    Visualized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// A blocking message dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub text: String,
}

impl Notice {
    fn new(kind: NoticeKind, title: &str, text: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Chart,
    Table,
}

/// Result of the download task.
pub struct DownloadOutcome {
    pub path: PathBuf,
    /// Period covered by the file, shown right after the download.
    pub coverage: Result<Option<DateRange>, DataError>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,
    pub phase: Phase,

    /// Credentials form contents; cleared as soon as a download starts.
    pub credentials: Credentials,

    /// Date pickers (inclusive).
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Downloaded file, once the fetch succeeded.
    pub data_file: Option<PathBuf>,

    /// Last non-empty filtered series.
    pub series: Option<Series>,
    /// Distinct days of `series`, for the day list.
    pub days: Vec<NaiveDate>,
    pub selected_days: BTreeSet<NaiveDate>,
    pub selected_rows: BTreeSet<usize>,
    /// Indices into `series` of the highlighted points.
    pub highlight: Vec<usize>,

    pub tab: Tab,

    /// Progress label text.
    pub status_message: String,
    pub notice: Option<Notice>,

    download: Option<BackgroundTask<DownloadOutcome>>,
    visualize: Option<BackgroundTask<Series>>,
    /// Phase to return to when a visualization fails.
    resume_phase: Phase,
}

impl AppState {
    /// Fresh session: the credentials dialog is open and the pickers cover
    /// the last month.
    pub fn new(settings: Settings) -> Self {
        let today = Local::now().date_naive();
        let start = today.checked_sub_months(Months::new(1)).unwrap_or(today);
        Self {
            settings,
            phase: Phase::Authenticating,
            credentials: Credentials::default(),
            start_date: start,
            end_date: today,
            data_file: None,
            series: None,
            days: Vec::new(),
            selected_days: BTreeSet::new(),
            selected_rows: BTreeSet::new(),
            highlight: Vec::new(),
            tab: Tab::Chart,
            status_message: "Ready".to_string(),
            notice: None,
            download: None,
            visualize: None,
            resume_phase: Phase::Downloaded,
        }
    }

    /// A background task is in flight.
    pub fn busy(&self) -> bool {
        self.download.is_some() || self.visualize.is_some()
    }

    pub fn can_sign_in(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn can_visualize(&self) -> bool {
        self.data_file.is_some() && !self.busy()
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    // -- Fetch stage --------------------------------------------------------

    pub fn open_sign_in(&mut self) {
        if self.can_sign_in() {
            self.phase = Phase::Authenticating;
        }
    }

    pub fn cancel_sign_in(&mut self) {
        self.credentials = Credentials::default();
        self.phase = Phase::Idle;
    }

    /// Close the credentials dialog and start the download when both fields
    /// are filled in.
    pub fn submit_credentials<N>(&mut self, notify: N)
    where
        N: FnOnce() + Send + 'static,
    {
        let credentials = std::mem::take(&mut self.credentials);
        if !credentials.is_complete() {
            self.phase = Phase::Idle;
            return;
        }

        let settings = self.settings.clone();
        let job = move || {
            let path = fetch(&settings, &credentials)?;
            let coverage = coverage(&path);
            Ok(DownloadOutcome { path, coverage })
        };

        match BackgroundTask::spawn("download", job, notify) {
            Ok(task) => {
                self.download = Some(task);
                self.phase = Phase::Downloading;
                self.status_message = "Downloading…".to_string();
            }
            Err(e) => self.download_failed(e),
        }
    }

    fn download_finished(&mut self, result: anyhow::Result<DownloadOutcome>) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => return self.download_failed(e),
        };

        self.phase = Phase::Downloaded;
        self.status_message = format!("Download complete: {}", outcome.path.display());
        self.data_file = Some(outcome.path);

        self.notice = Some(match outcome.coverage {
            Ok(Some(span)) => Notice::new(
                NoticeKind::Info,
                "Available period",
                format!("Available period: {span}"),
            ),
            Ok(None) => Notice::new(
                NoticeKind::Warning,
                "Available period",
                "The file contains no valid timestamps.",
            ),
            Err(e) => {
                log::error!("Failed to read downloaded file: {e}");
                self.status_message = format!("Error loading data: {e}");
                Notice::new(NoticeKind::Error, "Invalid data", format!("Error loading data: {e}"))
            }
        });
    }

    fn download_failed(&mut self, err: anyhow::Error) {
        log::error!("Download failed: {err:#}");
        self.phase = Phase::Idle;
        self.status_message = format!("{err:#}");
        self.notice = Some(Notice::new(NoticeKind::Error, error_title(&err), format!("{err:#}")));
    }

    // -- Filter / visualize stage --------------------------------------------

    /// Parse and filter the downloaded file for the picked range off the UI
    /// thread.
    pub fn start_visualization<N>(&mut self, notify: N)
    where
        N: FnOnce() + Send + 'static,
    {
        if !self.can_visualize() {
            return;
        }
        let Some(path) = self.data_file.clone() else {
            return;
        };
        let range = self.date_range();
        log::info!("Visualizing {range}");

        let job = move || Ok(load_series(&path, range)?);
        match BackgroundTask::spawn("visualize", job, notify) {
            Ok(task) => {
                self.visualize = Some(task);
                self.resume_phase = self.phase;
                self.phase = Phase::Visualizing;
                self.status_message = "Loading and visualizing data…".to_string();
            }
            Err(e) => {
                self.resume_phase = self.phase;
                self.visualization_failed(e);
            }
        }
    }

    fn visualization_finished(&mut self, result: anyhow::Result<Series>) {
        match result {
            Ok(series) => {
                self.status_message = "Visualization complete".to_string();
                self.apply_series(series);
            }
            Err(e) => self.visualization_failed(e),
        }
    }

    fn visualization_failed(&mut self, err: anyhow::Error) {
        log::error!("Visualization failed: {err:#}");
        self.phase = self.resume_phase;
        self.status_message = format!("{err:#}");
        self.notice = Some(Notice::new(NoticeKind::Error, error_title(&err), format!("{err:#}")));
    }

    /// Show a freshly filtered series. An empty one only raises a warning
    /// and keeps whatever is currently displayed.
    pub fn apply_series(&mut self, series: Series) {
        if series.is_empty() {
            log::warn!("No measurements in {}", series.range);
            self.phase = if self.series.is_some() {
                Phase::Visualized
            } else {
                Phase::Downloaded
            };
            self.notice = Some(Notice::new(
                NoticeKind::Warning,
                "Warning",
                "No data available for the selected period.",
            ));
            return;
        }

        self.days = series.distinct_days();
        self.selected_days.clear();
        self.selected_rows.clear();
        self.highlight.clear();
        self.series = Some(series);
        self.phase = Phase::Visualized;
    }

    /// Hand finished task results to the state. Call once per frame.
    pub fn poll_tasks(&mut self) {
        if let Some(result) = self.download.as_mut().and_then(BackgroundTask::poll) {
            self.download = None;
            self.download_finished(result);
        }
        if let Some(result) = self.visualize.as_mut().and_then(BackgroundTask::poll) {
            self.visualize = None;
            self.visualization_finished(result);
        }
    }

    // -- Selection and highlight ---------------------------------------------

    /// Select a day in the day list. `additive` toggles it in a
    /// multi-selection, otherwise it replaces the selection.
    pub fn select_day(&mut self, day: NaiveDate, additive: bool) {
        toggle(&mut self.selected_days, day, additive);
        self.selected_rows.clear();
        self.highlight = match &self.series {
            Some(series) => series.indices_on_days(&self.selected_days),
            None => Vec::new(),
        };
    }

    /// Select a row in the data table, same rules as [`Self::select_day`].
    pub fn select_row(&mut self, index: usize, additive: bool) {
        toggle(&mut self.selected_rows, index, additive);
        self.selected_days.clear();
        let len = self.series.as_ref().map_or(0, Series::len);
        self.highlight = self.selected_rows.iter().copied().filter(|&i| i < len).collect();
    }

    pub fn highlighted(&self) -> Vec<Measurement> {
        let Some(series) = &self.series else {
            return Vec::new();
        };
        self.highlight
            .iter()
            .filter_map(|&i| series.measurements.get(i).copied())
            .collect()
    }

    // -- Export ----------------------------------------------------------------

    /// Clipboard text for the current series, with a confirmation notice.
    pub fn export_to_clipboard(&mut self) -> Option<String> {
        let text = self.series.as_ref()?.export_text();
        self.notice = Some(Notice::new(
            NoticeKind::Info,
            "Information",
            "Data copied to the clipboard.",
        ));
        Some(text)
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T, additive: bool) {
    if !additive {
        set.clear();
        set.insert(value);
    } else if !set.remove(&value) {
        set.insert(value);
    }
}

/// Notice title for a failed task.
fn error_title(err: &anyhow::Error) -> &'static str {
    if let Some(fetch) = err.downcast_ref::<FetchError>() {
        return match fetch {
            FetchError::Unauthorized(_) => "Sign-in failed",
            _ => "Download failed",
        };
    }
    if err.downcast_ref::<DataError>().is_some() {
        return "Invalid data";
    }
    "Error"
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDateTime;
    use reqwest::StatusCode;

    use super::*;
    use crate::data::model::TIMESTAMP_FORMAT;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(rows: &[&str]) -> Series {
        Series {
            range: DateRange::new(day("2024-04-01"), day("2024-05-31")),
            measurements: rows
                .iter()
                .enumerate()
                .map(|(i, ts)| Measurement {
                    timestamp: NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).unwrap(),
                    percent: i as f64 * 10.0,
                })
                .collect(),
        }
    }

    fn state() -> AppState {
        let dir = std::env::temp_dir().join("ac-activity-viewer-state-tests");
        AppState::new(Settings {
            data_dir: dir,
            ..Settings::default()
        })
    }

    fn wait_idle(state: &mut AppState) {
        for _ in 0..500 {
            state.poll_tasks();
            if !state.busy() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("background task did not finish");
    }

    const MAY_FIRST: &[&str] = &[
        "2024-04-30 22:00:00",
        "2024-05-01 06:00:00",
        "2024-05-01 12:00:00",
        "2024-05-01 18:00:00",
        "2024-05-02 06:00:00",
    ];

    #[test]
    fn starts_in_sign_in_with_last_month_selected() {
        let s = state();
        assert_eq!(s.phase, Phase::Authenticating);
        assert!(s.start_date < s.end_date);
        assert_eq!(s.end_date, Local::now().date_naive());
        assert!(!s.can_visualize());
    }

    #[test]
    fn empty_credentials_return_to_idle() {
        let mut s = state();
        s.credentials = Credentials::new("alice", "");
        s.submit_credentials(|| {});
        assert_eq!(s.phase, Phase::Idle);
        assert!(!s.busy());
        s.open_sign_in();
        assert_eq!(s.phase, Phase::Authenticating);
    }

    #[test]
    fn selecting_a_day_highlights_exactly_its_points() {
        let mut s = state();
        s.apply_series(series(MAY_FIRST));
        assert_eq!(s.days, vec![day("2024-04-30"), day("2024-05-01"), day("2024-05-02")]);

        s.select_day(day("2024-05-02"), false);
        assert_eq!(s.highlight, vec![4]);

        s.select_day(day("2024-05-01"), false);
        assert_eq!(s.highlight, vec![1, 2, 3]);
        assert!(s.highlighted().iter().all(|m| m.day() == day("2024-05-01")));
    }

    #[test]
    fn additive_day_selection_toggles() {
        let mut s = state();
        s.apply_series(series(MAY_FIRST));
        s.select_day(day("2024-04-30"), false);
        s.select_day(day("2024-05-02"), true);
        assert_eq!(s.highlight, vec![0, 4]);
        s.select_day(day("2024-04-30"), true);
        assert_eq!(s.highlight, vec![4]);
        s.select_day(day("2024-05-02"), true);
        assert!(s.highlight.is_empty());
    }

    #[test]
    fn row_selection_replaces_day_selection() {
        let mut s = state();
        s.apply_series(series(MAY_FIRST));
        s.select_day(day("2024-05-01"), false);
        s.select_row(0, false);
        assert!(s.selected_days.is_empty());
        assert_eq!(s.highlight, vec![0]);
        s.select_row(3, true);
        assert_eq!(s.highlight, vec![0, 3]);
    }

    #[test]
    fn empty_series_warns_and_keeps_previous_chart() {
        let mut s = state();
        let shown = series(MAY_FIRST);
        s.apply_series(shown.clone());
        s.select_day(day("2024-05-01"), false);

        s.apply_series(series(&[]));

        assert_eq!(s.series.as_ref(), Some(&shown));
        assert_eq!(s.highlight, vec![1, 2, 3]);
        assert_eq!(s.phase, Phase::Visualized);
        assert_eq!(s.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Warning));
    }

    #[test]
    fn new_series_resets_selection() {
        let mut s = state();
        s.apply_series(series(MAY_FIRST));
        s.select_row(2, false);
        s.apply_series(series(&["2024-05-10 00:00:00"]));
        assert!(s.selected_rows.is_empty());
        assert!(s.highlight.is_empty());
        assert_eq!(s.days, vec![day("2024-05-10")]);
    }

    #[test]
    fn export_copies_every_row() {
        let mut s = state();
        assert!(s.export_to_clipboard().is_none());
        s.apply_series(series(MAY_FIRST));
        let text = s.export_to_clipboard().unwrap();
        assert_eq!(text.lines().count(), MAY_FIRST.len());
        assert_eq!(text.lines().next(), Some("2024-04-30 22:00:00 : 0.0%"));
        assert_eq!(s.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Info));
    }

    #[test]
    fn visualization_runs_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("18311100.txt");
        std::fs::write(
            &path,
            "time_from|ac_measurements_active_percent\n\
             2024-05-01 06:00:00|10,5\n\
             2024-05-01 07:00:00|20,5\n\
             2024-06-01 07:00:00|30,5\n",
        )
        .unwrap();

        let mut s = state();
        s.phase = Phase::Downloaded;
        s.data_file = Some(path);
        s.start_date = day("2024-05-01");
        s.end_date = day("2024-05-31");

        s.start_visualization(|| {});
        assert_eq!(s.phase, Phase::Visualizing);
        assert!(!s.can_visualize());
        wait_idle(&mut s);

        assert_eq!(s.phase, Phase::Visualized);
        assert_eq!(s.series.as_ref().map(Series::len), Some(2));
        assert_eq!(s.status_message, "Visualization complete");
    }

    #[test]
    fn visualization_error_returns_to_downloaded() {
        let mut s = state();
        s.phase = Phase::Downloaded;
        s.data_file = Some(PathBuf::from("/nonexistent/dir/18311100.txt"));

        s.start_visualization(|| {});
        wait_idle(&mut s);

        assert_eq!(s.phase, Phase::Downloaded);
        let notice = s.notice.clone().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.title, "Invalid data");
    }

    #[test]
    fn failed_download_returns_to_idle() {
        let mut s = state();
        s.settings.source_url = "http://127.0.0.1:9/18311100.txt".to_string();
        s.settings.timeout = Duration::from_secs(2);
        s.phase = Phase::Authenticating;
        s.credentials = Credentials::new("alice", "secret");
        s.submit_credentials(|| {});
        assert_eq!(s.phase, Phase::Downloading);
        assert!(s.credentials.username.is_empty());
        wait_idle(&mut s);

        assert_eq!(s.phase, Phase::Idle);
        assert!(s.data_file.is_none());
        assert_eq!(s.notice.as_ref().map(|n| n.title.as_str()), Some("Download failed"));
    }

    fn downloading() -> AppState {
        let mut s = state();
        s.phase = Phase::Downloading;
        s
    }

    fn finished(coverage: Result<Option<DateRange>, DataError>) -> AppState {
        let mut s = downloading();
        s.download_finished(Ok(DownloadOutcome {
            path: PathBuf::from("data/18311100.txt"),
            coverage,
        }));
        s
    }

    #[test]
    fn download_reports_available_period() {
        let span = DateRange::new(day("2024-04-01"), day("2024-05-31"));
        let s = finished(Ok(Some(span)));

        assert_eq!(s.phase, Phase::Downloaded);
        assert_eq!(s.data_file, Some(PathBuf::from("data/18311100.txt")));
        assert!(s.can_visualize());
        let notice = s.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Info);
        assert_eq!(notice.title, "Available period");
        assert_eq!(notice.text, format!("Available period: {span}"));
    }

    #[test]
    fn download_without_timestamps_warns() {
        let s = finished(Ok(None));

        assert_eq!(s.phase, Phase::Downloaded);
        assert!(s.data_file.is_some());
        let notice = s.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert_eq!(notice.title, "Available period");
    }

    #[test]
    fn unreadable_download_is_invalid_data_but_stays_downloaded() {
        let s = finished(Err(DataError::MissingColumn("time_from")));

        assert_eq!(s.phase, Phase::Downloaded);
        assert_eq!(s.data_file, Some(PathBuf::from("data/18311100.txt")));
        let notice = s.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.title, "Invalid data");
        assert!(notice.text.contains("time_from"), "{}", notice.text);
        assert!(s.status_message.starts_with("Error loading data"));
    }

    #[test]
    fn rejected_credentials_read_as_sign_in_failure() {
        let mut s = downloading();
        s.download_failed(FetchError::Unauthorized(StatusCode::UNAUTHORIZED).into());

        assert_eq!(s.phase, Phase::Idle);
        assert!(s.data_file.is_none());
        assert!(s.can_sign_in());
        let notice = s.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.title, "Sign-in failed");
    }

    #[test]
    fn failed_task_result_goes_through_download_failed() {
        let mut s = downloading();
        s.download_finished(Err(anyhow::anyhow!("download task panicked")));

        assert_eq!(s.phase, Phase::Idle);
        assert!(s.data_file.is_none());
        let notice = s.notice.unwrap();
        assert_eq!(notice.title, "Error");
        assert_eq!(notice.text, "download task panicked");
    }
}
