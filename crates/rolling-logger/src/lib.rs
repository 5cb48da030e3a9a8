//! Rolling Logger
//!
//! Process-wide logging: size-rotated files (`<app>.log`, `<app>.log.1`, ...)
//! plus an in-memory ring buffer of recent lines. `log` records are bridged
//! into `tracing`, so library code can keep using `log::info!` and friends.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

static LOGGER: OnceLock<RollingWriter> = OnceLock::new();

#[derive(Debug)]
pub enum LoggerError {
    NotInitialized,
    AlreadyInitialized,
    Io(io::Error),
    Subscriber(String),
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerError::NotInitialized => write!(f, "Logger not initialized"),
            LoggerError::AlreadyInitialized => write!(f, "Logger already initialized"),
            LoggerError::Io(e) => write!(f, "Log file error: {}", e),
            LoggerError::Subscriber(msg) => write!(f, "Failed to install subscriber: {}", msg),
        }
    }
}

impl std::error::Error for LoggerError {}

impl From<io::Error> for LoggerError {
    fn from(e: io::Error) -> Self {
        LoggerError::Io(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Rotate once the active file would exceed this size
    pub max_file_bytes: u64,
    /// Rotated files kept besides the active one
    pub max_files: usize,
    /// Lines held in memory for `recent_lines`
    pub buffer_lines: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
            max_files: 5,
            buffer_lines: 1000,
        }
    }
}

struct State {
    dir: PathBuf,
    app_name: String,
    config: LoggerConfig,
    file: Option<File>,
    written: u64,
    /// Bytes of a line not yet terminated
    pending: Vec<u8>,
    ring: VecDeque<String>,
}

impl State {
    fn active_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.app_name))
    }

    fn rotated_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.app_name, n))
    }

    fn open(&mut self) -> io::Result<()> {
        let path = self.active_path();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.written = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;
        if self.config.max_files == 0 {
            fs::remove_file(self.active_path())?;
            return self.open();
        }

        let oldest = self.rotated_path(self.config.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.config.max_files).rev() {
            let from = self.rotated_path(n);
            if from.exists() {
                fs::rename(&from, self.rotated_path(n + 1))?;
            }
        }
        fs::rename(self.active_path(), self.rotated_path(1))?;
        self.open()
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let stamped = format!("{} {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"), line);
        let len = stamped.len() as u64 + 1;

        if self.written > 0 && self.written + len > self.config.max_file_bytes {
            self.rotate()?;
        }
        if self.file.is_none() {
            self.open()?;
        }
        if let Some(file) = self.file.as_mut() {
            writeln!(file, "{}", stamped)?;
            self.written += len;
        }

        if self.config.buffer_lines > 0 {
            if self.ring.len() == self.config.buffer_lines {
                self.ring.pop_front();
            }
            self.ring.push_back(stamped);
        }
        Ok(())
    }

    fn accept(&mut self, buf: &[u8]) -> io::Result<()> {
        self.pending.extend_from_slice(buf);
        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]).into_owned();
            self.write_line(&text)?;
        }
        Ok(())
    }
}

/// Writer shared by the subscriber and the ring buffer
#[derive(Clone)]
pub struct RollingWriter {
    state: Arc<Mutex<State>>,
}

impl RollingWriter {
    pub fn new(log_dir: impl AsRef<Path>, app_name: &str, config: LoggerConfig) -> Result<Self, LoggerError> {
        let dir = log_dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let mut state = State {
            dir,
            app_name: app_name.to_string(),
            config,
            file: None,
            written: 0,
            pending: Vec::new(),
            ring: VecDeque::with_capacity(config.buffer_lines.min(4096)),
        };
        state.open()?;
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Write one complete line
    pub fn write_line(&self, line: &str) -> Result<(), LoggerError> {
        let mut state = self.lock()?;
        state.write_line(line)?;
        Ok(())
    }

    /// Up to `n` most recent lines, oldest first
    pub fn recent_lines(&self, n: usize) -> Vec<String> {
        match self.state.lock() {
            Ok(state) => {
                let skip = state.ring.len().saturating_sub(n);
                state.ring.iter().skip(skip).cloned().collect()
            }
            Err(_) => Vec::new(),
        }
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.state.lock().ok().map(|s| s.active_path())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, LoggerError> {
        self.state
            .lock()
            .map_err(|_| LoggerError::Subscriber("log state poisoned".to_string()))
    }
}

pub struct RollingHandle {
    state: Arc<Mutex<State>>,
}

impl Write for RollingHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log state poisoned"))?;
        state.accept(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log state poisoned"))?;
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingHandle;

    fn make_writer(&'a self) -> Self::Writer {
        RollingHandle {
            state: Arc::clone(&self.state),
        }
    }
}

/// Install the global subscriber with default rotation settings
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(log_dir, app_name, LoggerConfig::default())
}

pub fn init_logger_with(log_dir: impl AsRef<Path>, app_name: &str, config: LoggerConfig) -> Result<(), LoggerError> {
    if LOGGER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }
    let writer = RollingWriter::new(log_dir, app_name, config)?;

    tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .without_time()
        .with_target(true)
        .finish()
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))?;

    LOGGER
        .set(writer)
        .map_err(|_| LoggerError::AlreadyInitialized)?;
    tracing::info!("{} logger started", app_name);
    Ok(())
}

/// Most recent lines from the global logger
pub fn recent_lines(n: usize) -> Vec<String> {
    LOGGER.get().map(|w| w.recent_lines(n)).unwrap_or_default()
}

pub fn log_path() -> Option<PathBuf> {
    LOGGER.get().and_then(|w| w.log_path())
}

fn ensure_initialized() -> Result<(), LoggerError> {
    LOGGER.get().map(|_| ()).ok_or(LoggerError::NotInitialized)
}

pub fn info(msg: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::info!("{}", msg);
    Ok(())
}

pub fn warn(msg: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::warn!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::error!("{}", msg);
    Ok(())
}
