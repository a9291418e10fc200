//! Core crate for the engine: INI configuration store, typed settings and the
//! synchronized file logger.

pub mod config;
pub mod ini;
pub mod layout;
pub mod logger;
pub mod settings;

pub use config::ConfigStore;
pub use ini::{IniDocument, SyntaxError};
pub use layout::Layout;
pub use logger::{FileLogger, LogService};
pub use settings::EngineSettings;

use std::path::PathBuf;
use thiserror::Error;

/// Common error type for configuration access.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file does not exist.
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The requested section is absent.
    #[error("no section: '{section}'")]
    MissingSection { section: String },

    /// The requested option is absent from an existing section.
    #[error("no option '{option}' in section: '{section}'")]
    MissingOption { section: String, option: String },

    /// The file could not be parsed as INI.
    #[error("invalid config file {}: {source}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: SyntaxError,
    },

    /// Reading or writing the file failed.
    #[error("I/O error accessing config at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenient alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, Error>;
