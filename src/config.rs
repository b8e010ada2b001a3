use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Compiled-in settings
// ---------------------------------------------------------------------------

pub const SOURCE_URL: &str = "https://pgb-app-01.rz.uni-jena.de/data/18311100.txt";
pub const DATA_FILE_NAME: &str = "18311100.txt";
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Series with at most this many rows get one x tick per day.
pub const DENSE_SERIES_THRESHOLD: usize = 20;

/// Where the data comes from and where it is stored.
///
/// Nothing here is read from disk or the environment; tests build their own
/// instance pointing at a local server and a scratch directory.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source_url: String,
    pub data_dir: PathBuf,
    pub file_name: String,
    pub timeout: Duration,
    pub dense_threshold: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_url: SOURCE_URL.to_string(),
            data_dir: default_data_dir(),
            file_name: DATA_FILE_NAME.to_string(),
            timeout: HTTP_TIMEOUT,
            dense_threshold: DENSE_SERIES_THRESHOLD,
        }
    }
}

impl Settings {
    /// Fixed local path of the downloaded file.
    pub fn data_file(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

/// `data/` next to the executable, or under the working directory when the
/// executable path cannot be resolved.
fn default_data_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("data")))
        .unwrap_or_else(|| PathBuf::from("data"))
}
