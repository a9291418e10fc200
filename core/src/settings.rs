//! Typed engine settings read from the INI configuration.

use crate::config::ConfigStore;
use crate::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Driver mode that leaves the configured path untouched.
pub const REMOTE_DRIVER: &str = "remote";

/// Snapshot of the settings the engine needs at startup.
///
/// Values are kept as the strings found in the file; interpreting
/// `stderr_enabled` or `max_concurrency` is up to the consumer. The snapshot
/// is not refreshed when the file changes afterwards.
#[derive(Clone, PartialEq, Eq, serde::Serialize)]
pub struct EngineSettings {
    /// `Platform.url`
    pub server_url: String,
    /// `Platform.enable-stderr`
    pub stderr_enabled: String,
    /// `Engine.engine-code`
    pub engine_id: String,
    /// `Engine.engine-secret`
    pub engine_secret: String,
    /// `WebDriver.options`
    pub driver_option_mode: String,
    /// `WebDriver.path`, resolved against the browser-driver directory.
    pub driver_path: PathBuf,
    /// `RunSetting.max-run`
    pub max_concurrency: String,
    /// Every option of `[Header]`.
    pub headers: BTreeMap<String, String>,
}

impl EngineSettings {
    /// Open `path` and read every field. Fails on the first missing value.
    pub fn load(path: impl AsRef<Path>, browser_dir: impl AsRef<Path>) -> Result<Self> {
        let store = ConfigStore::open(path)?;
        Self::from_store(&store, browser_dir.as_ref())
    }

    /// Read every field through an already opened store.
    pub fn from_store(store: &ConfigStore, browser_dir: &Path) -> Result<Self> {
        let server_url = store.get("Platform", "url")?;
        let stderr_enabled = store.get("Platform", "enable-stderr")?;
        let engine_id = store.get("Engine", "engine-code")?;
        let engine_secret = store.get("Engine", "engine-secret")?;
        let headers = store.get_all("Header")?;
        let driver_option_mode = store.get("WebDriver", "options")?;
        let raw_driver_path = store.get("WebDriver", "path")?;
        let driver_path = resolve_driver_path(&driver_option_mode, &raw_driver_path, browser_dir);
        let max_concurrency = store.get("RunSetting", "max-run")?;

        tracing::debug!(
            path = %store.path().display(),
            driver_path = %driver_path.display(),
            headers = headers.len(),
            "loaded engine settings"
        );

        Ok(Self {
            server_url,
            stderr_enabled,
            engine_id,
            engine_secret,
            driver_option_mode,
            driver_path,
            max_concurrency,
            headers,
        })
    }
}

impl fmt::Debug for EngineSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSettings")
            .field("server_url", &self.server_url)
            .field("stderr_enabled", &self.stderr_enabled)
            .field("engine_id", &self.engine_id)
            .field("engine_secret", &"<redacted>")
            .field("driver_option_mode", &self.driver_option_mode)
            .field("driver_path", &self.driver_path)
            .field("max_concurrency", &self.max_concurrency)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Decide where the WebDriver executable lives.
///
/// Remote drivers and paths that already contain a separator are used as
/// written. A bare file name is looked up in `browser_dir`.
pub fn resolve_driver_path(mode: &str, raw: &str, browser_dir: &Path) -> PathBuf {
    let has_separator = raw.contains('/') || raw.contains(std::path::MAIN_SEPARATOR);
    if mode == REMOTE_DRIVER || has_separator {
        PathBuf::from(raw)
    } else {
        browser_dir.join(raw)
    }
}
