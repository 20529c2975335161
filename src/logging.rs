use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::LoggingConfig;

/// Install a file logger at ~/.local/share/shellpipe/session.log (or the
/// configured file).
/// Best-effort: failures are silently ignored (logging must never stop a session).
pub fn init(config: &LoggingConfig) {
    let level = parse_level(&config.level);
    if level == LevelFilter::Off {
        return;
    }
    let Some(path) = log_path(config) else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return;
    };

    let log_config = ConfigBuilder::new().set_thread_level(LevelFilter::Off).build();
    // Already initialized (e.g. by an embedding host) is fine.
    let _ = WriteLogger::init(level, log_config, file);
}

/// Level names as accepted by `log`; unknown names fall back to `warn`.
pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Warn)
}

fn log_path(config: &LoggingConfig) -> Option<PathBuf> {
    if let Some(file) = &config.file {
        return Some(file.clone());
    }
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".local/share/shellpipe/session.log"))
}
