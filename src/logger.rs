//! Session logger. Backs the `log` facade with a single file in the OS data
//! directory.
//!
//! The file is **truncated at each `init()`**, so it only ever holds output
//! from the most recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\PixelFE\pixelfe.log`
//!   Linux:    `~/.local/share/PixelFE/pixelfe.log`
//!   macOS:    `~/Library/Application Support/PixelFE/pixelfe.log`
//!
//! Anywhere in the crate use `log::info!` / `log::warn!` / `log::debug!`.
//! Nothing is written until a host calls [`init`]; until then the facade is a
//! no-op.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Log, Metadata, Record};

pub(crate) const APP_DIR: &str = "PixelFE";

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

struct SessionLogger {
    file: Mutex<File>,
    level: LevelFilter,
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        write_line(
            &self.file,
            &format_line(&timestamp(), record.level().as_str(), &record.args().to_string()),
        );
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Returns the path to the current session log file, once [`init`] succeeded.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Initialise the session logger at the default location.
///
/// Safe to call more than once; only the first successful call installs the
/// logger.
pub fn init(level: LevelFilter) {
    init_at(&log_file_path(), level);
}

/// Initialise the session logger writing to `path`.
///
/// * Creates (or truncates) the log file. Failure to open it is not fatal.
/// * Installs a panic hook that writes the panic message to the log before
///   running the previous handler.
pub fn init_at(path: &Path, level: LevelFilter) {
    if LOG_PATH.get().is_some() {
        return;
    }

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = match OpenOptions::new().create(true).write(true).truncate(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("[logger] Failed to open log file {:?}: {}", path, e);
            return;
        }
    };

    let logger = SessionLogger { file: Mutex::new(file), level };
    write_line(&logger.file, &format!("=== PixelFE session started (unix {}) ===", unix_seconds()));
    write_line(&logger.file, &format!("Log file: {}", path.display()));

    if log::set_boxed_logger(Box::new(logger)).is_err() {
        // Another backend owns the facade already.
        return;
    }
    log::set_max_level(level);
    let _ = LOG_PATH.set(path.to_path_buf());

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log::error!("PANIC: {}", info);
        log::logger().flush();
        prev(info);
    }));
}

fn write_line(file: &Mutex<File>, line: &str) {
    if let Ok(mut file) = file.lock() {
        let _ = writeln!(file, "{}", line);
    }
}

fn format_line(ts: &str, level: &str, msg: &str) -> String {
    format!("[{}] [{}] {}", ts, level, msg)
}

fn log_file_path() -> PathBuf {
    data_dir().join(APP_DIR).join("pixelfe.log")
}

/// Platform data directory (without the app sub-folder).
pub(crate) fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library").join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// `HH:MM:SS` within the current UTC day.
fn timestamp() -> String {
    clock_time(unix_seconds())
}

fn clock_time(secs: u64) -> String {
    let h = (secs % 86400) / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}
