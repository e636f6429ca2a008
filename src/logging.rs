use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Logger that writes to a rolling file and echoes important records to stderr
struct PosterLogger {
    file_writer: Mutex<RollingFileAppender>,
    file_level: LevelFilter,
    echo_level: LevelFilter,
}

impl Log for PosterLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.file_level || metadata.level() <= self.echo_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = record.level();
        let line = format_line(
            &chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            level,
            record.target(),
            &record.args().to_string(),
        );

        if level <= self.file_level {
            if let Ok(mut writer) = self.file_writer.lock() {
                let _ = writeln!(writer, "{}", line);
            }
        }

        if level <= self.echo_level {
            eprintln!("{}", line);
        }
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.file_writer.lock() {
            let _ = writer.flush();
        }
    }
}

fn format_line(timestamp: &str, level: log::Level, target: &str, message: &str) -> String {
    format!("{} [{}] {}: {}", timestamp, level, target, message)
}

/// Parse log level string to LevelFilter
pub fn parse_level(level_str: &str) -> LevelFilter {
    match level_str.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Default log file location inside the data directory
pub fn default_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("logs").join("lineposter.log")
}

/// Initialize the file logger
pub fn init_logger(log_file_path: PathBuf, file_level: &str, echo_level: &str) -> Result<()> {
    let log_dir = log_file_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Invalid log file path"))?;
    fs::create_dir_all(log_dir).context("Failed to create log directory")?;

    // Daily rotation, keep 3 files
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(3)
        .filename_prefix(
            log_file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("lineposter"),
        )
        .filename_suffix(
            log_file_path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("log"),
        )
        .build(log_dir)
        .context("Failed to create rotating file appender")?;

    let file_level = parse_level(file_level);
    let echo_level = parse_level(echo_level);

    let logger = PosterLogger {
        file_writer: Mutex::new(file_appender),
        file_level,
        echo_level,
    };

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(file_level.max(echo_level));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }

    #[test]
    fn test_format_line() {
        let line = format_line(
            "2024-01-01 12:00:00",
            log::Level::Warn,
            "lineposter::dispatcher",
            "No handler",
        );
        assert_eq!(
            line,
            "2024-01-01 12:00:00 [WARN] lineposter::dispatcher: No handler"
        );
    }

    #[test]
    fn test_default_log_path() {
        assert_eq!(
            default_log_path(Path::new("/data")),
            PathBuf::from("/data/logs/lineposter.log")
        );
    }
}
