use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("alarm window start must be before its end")]
    InvalidWindow,
}

/// The daily window inside which a progress photo is expected. The end
/// of the window is when the alarm starts ringing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmWindow {
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
}

impl AlarmWindow {
    /// Build a window, rejecting one whose start is not strictly before
    /// its end.
    pub fn new(
        start_hour: u32,
        start_minute: u32,
        end_hour: u32,
        end_minute: u32,
    ) -> Result<Self, ConfigError> {
        if start_hour > end_hour || (start_hour == end_hour && start_minute >= end_minute) {
            return Err(ConfigError::InvalidWindow);
        }
        Ok(Self {
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        })
    }
}

impl fmt::Display for AlarmWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02} - {:02}:{:02}",
            self.start_hour, self.start_minute, self.end_hour, self.end_minute
        )
    }
}

/// Default config file: `<config dir>/workgood/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("workgood")
        .join("config.json")
}

/// Read the saved window. A file that was never written is `Ok(None)`.
pub fn load_window(path: &Path) -> Result<Option<AlarmWindow>, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Persist the window, creating the config directory as needed.
pub fn save_window(path: &Path, window: &AlarmWindow) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(window)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn window_requires_start_before_end() {
        assert!(AlarmWindow::new(9, 30, 9, 45).is_ok());
        assert!(AlarmWindow::new(9, 59, 10, 0).is_ok());
        assert!(AlarmWindow::new(7, 0, 19, 0).is_ok());

        assert!(matches!(
            AlarmWindow::new(9, 30, 9, 30),
            Err(ConfigError::InvalidWindow)
        ));
        assert!(matches!(
            AlarmWindow::new(10, 0, 9, 0),
            Err(ConfigError::InvalidWindow)
        ));
        assert!(matches!(
            AlarmWindow::new(9, 45, 9, 30),
            Err(ConfigError::InvalidWindow)
        ));
    }

    #[test]
    fn window_displays_zero_padded() {
        let window = AlarmWindow::new(7, 5, 19, 0).unwrap();
        assert_eq!(window.to_string(), "07:05 - 19:00");
    }

    #[test]
    fn window_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let window = AlarmWindow::new(8, 15, 17, 45).unwrap();
        save_window(&path, &window).unwrap();

        let loaded = load_window(&path).unwrap();
        assert_eq!(loaded, Some(window));
    }

    #[test]
    fn missing_config_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(load_window(&path).unwrap(), None);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();

        assert!(matches!(load_window(&path), Err(ConfigError::Parse(_))));
    }
}
