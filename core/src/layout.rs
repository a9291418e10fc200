//! Directory layout of an engine installation.

use crate::settings::EngineSettings;
use crate::Result;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the installation root.
pub const HOME_ENV: &str = "LMENGINE_HOME";

/// File name of the log written when no destination is given.
pub const DEFAULT_LOG_FILE: &str = "engine_run.log";

/// Well-known directories below an installation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root taken from `LMENGINE_HOME`, or the current directory.
    pub fn from_env() -> Self {
        let root = env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root)
    }

    /// Installation root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Test data files.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Temporary and downloaded files.
    pub fn file_dir(&self) -> PathBuf {
        self.root.join("file")
    }

    /// Log files.
    pub fn log_dir(&self) -> PathBuf {
        self.root.join("log")
    }

    /// Main INI configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config").join("config.ini")
    }

    /// Screenshots.
    pub fn image_dir(&self) -> PathBuf {
        self.root.join("image")
    }

    /// Local WebDriver executables.
    pub fn browser_dir(&self) -> PathBuf {
        self.root.join("browser")
    }

    /// Log file used when a caller names no destination.
    pub fn default_log_file(&self) -> PathBuf {
        self.log_dir().join(DEFAULT_LOG_FILE)
    }

    /// Load settings from this layout's config file.
    pub fn load_settings(&self) -> Result<EngineSettings> {
        EngineSettings::load(self.config_file(), self.browser_dir())
    }
}
