//! Synchronized per-call file logging.
//!
//! A [`FileLogger`] has no permanent output. Each call binds the destination
//! file as the only sink of a scoped `tracing` subscriber, emits one record and
//! drops the sink again, all while holding the lock of the [`LogService`] the
//! logger came from. Loggers from the same service never interleave, whatever
//! file they target.
//!
//! Failures never reach the caller. They are reported on stderr.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use thiserror::Error;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::{FmtContext, MakeWriter};
use tracing_subscriber::registry::LookupSpan;

/// Timestamp layout of a record, local time with milliseconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Channel name used when the caller does not pick one.
pub const DEFAULT_CHANNEL: &str = "Auto Test";

#[derive(Debug, Error)]
pub(crate) enum LogError {
    #[error("could not create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write log file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Owner of the lock that serializes every write of its loggers.
///
/// Clone it (or hand out channels) to share the same lock.
#[derive(Debug, Clone)]
pub struct LogService {
    lock: Arc<ReentrantMutex<()>>,
}

impl Default for LogService {
    fn default() -> Self {
        Self::new()
    }
}

impl LogService {
    /// Service with a fresh, unshared lock.
    pub fn new() -> Self {
        Self { lock: Arc::new(ReentrantMutex::new(())) }
    }

    /// Create a named channel sharing this service's lock.
    pub fn channel(&self, name: impl Into<String>) -> FileLogger {
        FileLogger { name: name.into(), lock: Arc::clone(&self.lock) }
    }

    /// Keep other threads out while the guard lives.
    ///
    /// The lock is re-entrant, so the holding thread may keep logging.
    pub fn hold(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }
}

/// Named logging channel writing one line per call to a caller-chosen file.
#[derive(Debug, Clone)]
pub struct FileLogger {
    name: String,
    lock: Arc<ReentrantMutex<()>>,
}

impl FileLogger {
    /// Channel name given at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an INFO record.
    pub fn info(&self, message: &str, destination: impl AsRef<Path>) {
        self.log(Level::INFO, message, destination);
    }

    /// Append an ERROR record.
    pub fn error(&self, message: &str, destination: impl AsRef<Path>) {
        self.log(Level::ERROR, message, destination);
    }

    /// Append a WARN record.
    pub fn warn(&self, message: &str, destination: impl AsRef<Path>) {
        self.log(Level::WARN, message, destination);
    }

    /// Append a DEBUG record.
    pub fn debug(&self, message: &str, destination: impl AsRef<Path>) {
        self.log(Level::DEBUG, message, destination);
    }

    /// Append one record to `destination`, creating missing directories.
    pub fn log(&self, level: Level, message: &str, destination: impl AsRef<Path>) {
        if let Err(err) = self.write_record(level, message, destination.as_ref()) {
            eprintln!(
                "Failed to record {} log on channel '{}'. Reason:\n {err}",
                level.as_str().to_lowercase(),
                self.name
            );
        }
    }

    pub(crate) fn write_record(
        &self,
        level: Level,
        message: &str,
        destination: &Path,
    ) -> Result<(), LogError> {
        let _guard = self.lock.lock();

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LogError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(destination)
            .map_err(|source| LogError::Open { path: destination.to_path_buf(), source })?;

        let sink = FileSink::new(file);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .event_format(RecordFormat)
            .with_writer(sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || emit(level, message));

        sink.finish()
            .map_err(|source| LogError::Write { path: destination.to_path_buf(), source })
    }
}

fn emit(level: Level, message: &str) {
    if level == Level::ERROR {
        tracing::error!("{}", message);
    } else if level == Level::WARN {
        tracing::warn!("{}", message);
    } else if level == Level::INFO {
        tracing::info!("{}", message);
    } else if level == Level::DEBUG {
        tracing::debug!("{}", message);
    } else {
        tracing::trace!("{}", message);
    }
}

/// `<timestamp> - <LEVEL> - <message>`
struct RecordFormat;

impl<S, N> FormatEvent<S, N> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        write!(writer, "{timestamp} - {:<4} - ", event.metadata().level().as_str())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

struct SinkState {
    file: File,
    written: usize,
    failure: Option<io::Error>,
}

/// Writer handed to the scoped subscriber; remembers the first write error.
#[derive(Clone)]
struct FileSink {
    state: Arc<Mutex<SinkState>>,
}

impl FileSink {
    fn new(file: File) -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState { file, written: 0, failure: None })),
        }
    }

    fn finish(self) -> io::Result<()> {
        let mut state = self.state.lock();
        if let Some(err) = state.failure.take() {
            return Err(err);
        }
        if state.written == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "record was not emitted"));
        }
        state.file.flush()
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        match state.file.write(buf) {
            Ok(n) => {
                state.written += n;
                Ok(n)
            }
            Err(err) => {
                if state.failure.is_none() {
                    state.failure = Some(io::Error::new(err.kind(), err.to_string()));
                }
                Err(err)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.lock().file.flush()
    }
}

impl<'a> MakeWriter<'a> for FileSink {
    type Writer = FileSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
