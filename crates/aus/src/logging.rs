use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Append-only log file that is reopened when rotated away or deleted
/// underneath a long-running process.
struct ReopeningLogFile {
    path: PathBuf,
    file: Mutex<File>,
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl ReopeningLogFile {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = open_append(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    fn with_file<T>(&self, op: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.path.exists() {
            *file = open_append(&self.path)?;
        }
        op(&mut file)
    }
}

impl Write for ReopeningLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

/// Cut the log down to its newer half, starting on a line boundary, once it
/// exceeds `max_size` bytes. Returns the number of bytes dropped.
fn trim_to_recent_half(log_path: &Path, max_size: u64) -> io::Result<usize> {
    if std::fs::metadata(log_path)?.len() <= max_size {
        return Ok(0);
    }
    let contents = std::fs::read(log_path)?;
    let half = contents.len() / 2;
    let cut = contents[half..]
        .iter()
        .position(|&byte| byte == b'\n')
        .map_or(half, |newline| half + newline + 1);
    std::fs::write(log_path, &contents[cut..])?;
    Ok(cut)
}

fn level_for(debug_enabled: bool) -> LevelFilter {
    if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Log to stderr and, when a path is given, to an append-only log file.
///
/// Only records from this workspace's crates pass the filter. Failing to open
/// the log file leaves stderr logging in place.
pub fn init_logging(log_path: Option<&Path>, debug_enabled: bool, max_log_size: u64) {
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("aus")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Debug,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let mut trimmed = 0;
    let mut open_error = None;
    if let Some(log_path) = log_path {
        trimmed = trim_to_recent_half(log_path, max_log_size).unwrap_or(0);
        match ReopeningLogFile::open(log_path.to_path_buf()) {
            Ok(writer) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, writer)),
            Err(error) => open_error = Some(error),
        }
    }

    let _ = CombinedLogger::init(loggers);
    log::set_max_level(level_for(debug_enabled));

    let Some(log_path) = log_path else {
        return;
    };
    if let Some(error) = open_error {
        log::warn!("Cannot open log file {}: {error}", log_path.display());
    } else if trimmed > 0 {
        log::info!("Dropped {trimmed} bytes from {}", log_path.display());
    }
    log::debug!("Logging to {}", log_path.display());
}
