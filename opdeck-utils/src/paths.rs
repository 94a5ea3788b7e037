//! Path utilities for opdeck
//!
//! Handles XDG Base Directory specification compliance for config,
//! state, and cache directories.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application identifier for XDG directories
const APP_NAME: &str = "opdeck";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory
///
/// Location: `$XDG_CONFIG_HOME/opdeck` or `~/.config/opdeck`
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(fallback_config_dir)
}

/// Get the main configuration file path
///
/// Location: `$XDG_CONFIG_HOME/opdeck/config.toml`
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the state directory (persistent state like logs)
///
/// Location: `$XDG_STATE_HOME/opdeck` or `~/.local/state/opdeck`
pub fn state_dir() -> PathBuf {
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(fallback_state_dir)
}

/// Get the cache directory (temporary data, safe to delete)
///
/// Location: `$XDG_CACHE_HOME/opdeck` or `~/.cache/opdeck`
pub fn cache_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.cache_dir().to_path_buf())
        .unwrap_or_else(fallback_cache_dir)
}

/// Get the log directory
///
/// Location: `$XDG_STATE_HOME/opdeck/log` or `~/.local/state/opdeck/log`
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

// Fallback implementations when ProjectDirs is unavailable

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

fn fallback_config_dir() -> PathBuf {
    home_dir().join(".config").join(APP_NAME)
}

fn fallback_state_dir() -> PathBuf {
    home_dir().join(".local").join("state").join(APP_NAME)
}

fn fallback_cache_dir() -> PathBuf {
    home_dir().join(".cache").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_is_toml() {
        let path = config_file();
        assert!(path.to_string_lossy().ends_with(".toml"));
    }

    #[test]
    fn test_config_file_in_config_dir() {
        let file = config_file();
        let dir = config_dir();
        assert!(file.starts_with(&dir));
    }

    #[test]
    fn test_log_dir_is_under_state() {
        let log = log_dir();
        let state = state_dir();
        assert!(log.starts_with(&state));
    }

    #[test]
    fn test_log_dir_name() {
        let path = log_dir();
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), "log");
    }

    #[test]
    fn test_all_paths_contain_opdeck() {
        let paths = [config_dir(), config_file(), state_dir(), cache_dir(), log_dir()];

        for path in paths {
            let path_str = path.to_string_lossy();
            assert!(
                path_str.contains("opdeck"),
                "Path should contain 'opdeck': {:?}",
                path
            );
        }
    }

    #[test]
    fn test_ensure_dir_creates_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let test_dir = temp_dir.path().join("nested").join("deep");

        let result = ensure_dir(&test_dir);
        assert!(result.is_ok());
        assert!(test_dir.exists());
        assert!(test_dir.is_dir());
    }

    #[test]
    fn test_ensure_dir_already_exists() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let test_dir = temp_dir.path().join("existing");
        std::fs::create_dir_all(&test_dir).unwrap();

        assert!(ensure_dir(&test_dir).is_ok());
    }

    #[test]
    fn test_fallback_dirs() {
        assert!(fallback_config_dir().to_string_lossy().contains(".config"));
        assert!(fallback_state_dir().to_string_lossy().contains(".local/state"));
        assert!(fallback_cache_dir().to_string_lossy().contains(".cache"));
    }
}
