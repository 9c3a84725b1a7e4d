//! Debug logger
//!
//! Keeps the most recent entries in a ring buffer and, once `init` has
//! been called, appends every entry to `<dir>/debug.log`. Also installed as
//! the `log` facade backend so `log::warn!` and friends land in the same file.

use chrono::Local;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

pub struct DebugLogEntry {
    pub timestamp: String,
    pub level: String,
    pub module: String,
    pub message: String,
}

impl DebugLogEntry {
    fn line(&self) -> String {
        format!(
            "[{}] [{}] [{}] {}",
            self.timestamp, self.level, self.module, self.message
        )
    }
}

pub struct DebugLogger {
    ring_buffer: VecDeque<DebugLogEntry>,
    max_entries: usize,
    file_path: Option<PathBuf>,
}

static LOGGER: OnceLock<Mutex<DebugLogger>> = OnceLock::new();
static FACADE: Facade = Facade;

fn get_logger() -> &'static Mutex<DebugLogger> {
    LOGGER.get_or_init(|| Mutex::new(DebugLogger::new(1000)))
}

impl DebugLogger {
    pub fn new(max_entries: usize) -> Self {
        Self {
            ring_buffer: VecDeque::with_capacity(max_entries),
            max_entries,
            file_path: None,
        }
    }

    pub fn set_file_path(&mut self, path: PathBuf) {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        self.file_path = Some(path);
    }

    pub fn log(&mut self, level: &str, module: &str, message: &str) {
        let entry = DebugLogEntry {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            level: level.to_string(),
            module: module.to_string(),
            message: message.to_string(),
        };

        if let Some(path) = &self.file_path {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", entry.line());
            }
        }

        if self.ring_buffer.len() >= self.max_entries {
            self.ring_buffer.pop_front();
        }
        self.ring_buffer.push_back(entry);
    }

    pub fn get_recent(&self, n: usize) -> Vec<String> {
        self.ring_buffer
            .iter()
            .rev()
            .take(n)
            .map(DebugLogEntry::line)
            .collect()
    }
}

struct Facade;

impl log::Log for Facade {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            get_logger().lock().log(
                record.level().as_str(),
                record.module_path().unwrap_or("sherwood"),
                &record.args().to_string(),
            );
        }
    }

    fn flush(&self) {}
}

/// Route logs to `<log_dir>/debug.log` and register the `log` facade.
pub fn init(log_dir: PathBuf) {
    get_logger().lock().set_file_path(log_dir.join("debug.log"));
    if log::set_logger(&FACADE).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }
}

pub fn log(level: &str, module: &str, message: impl Into<String>) {
    get_logger().lock().log(level, module, &message.into());
}

pub fn get_recent_logs(n: usize) -> Vec<String> {
    get_logger().lock().get_recent(n)
}

#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::logger::log("DEBUG", module_path!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        $crate::logger::log("INFO", module_path!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        $crate::logger::log("WARN", module_path!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        $crate::logger::log("ERROR", module_path!(), format!($($arg)*));
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_drops_oldest() {
        let mut logger = DebugLogger::new(2);
        logger.log("INFO", "a", "first");
        logger.log("INFO", "a", "second");
        logger.log("INFO", "a", "third");

        let recent = logger.get_recent(5);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].ends_with("third"));
        assert!(recent[1].ends_with("second"));
    }

    #[test]
    fn writes_to_file_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("debug.log");

        let mut logger = DebugLogger::new(10);
        logger.set_file_path(path.clone());
        logger.log("ERROR", "sherwood_core::pipeline", "Gemini failed");

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("[ERROR] [sherwood_core::pipeline] Gemini failed"));
    }
}
