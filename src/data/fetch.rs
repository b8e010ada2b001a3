use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use reqwest::StatusCode;
use tempfile::NamedTempFile;

use super::error::FetchError;
use crate::config::Settings;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Username / password pair for one download. Never persisted.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields filled in.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

/// Download the data file once and store the body verbatim at
/// [`Settings::data_file`].
///
/// The body is written to a temporary file in the data directory and renamed
/// over the target, so a failure never leaves a partial file behind.
pub fn fetch(settings: &Settings, credentials: &Credentials) -> Result<PathBuf, FetchError> {
    let url = settings.source_url.as_str();
    let network = |source: reqwest::Error| FetchError::Network {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(settings.timeout)
        .build()
        .map_err(network)?;

    log::info!("Downloading {url}");
    let response = client
        .get(url)
        .basic_auth(&credentials.username, Some(&credentials.password))
        .send()
        .map_err(network)?;

    let status = response.status();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(FetchError::Unauthorized(status));
    }
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let body = response.bytes().map_err(network)?;

    let target = settings.data_file();
    let io_err = |source: std::io::Error| FetchError::Io {
        path: target.clone(),
        source,
    };
    std::fs::create_dir_all(&settings.data_dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(&settings.data_dir).map_err(io_err)?;
    tmp.write_all(&body).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(&target).map_err(|e| io_err(e.error))?;

    log::info!("Saved {} bytes to {}", body.len(), target.display());
    Ok(target)
}
