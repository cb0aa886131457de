//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a small TOML file; anything the file leaves
//! out falls back to compiled defaults. The root folder (where the session
//! file lives) is resolved in priority order:
//!
//! 1. Command-line argument
//! 2. `SKILLS_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML file
//! 4. OS-dependent compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SKILLS_ROOT_FOLDER";

/// Directory name used under the platform config and data directories
pub const APP_DIR_NAME: &str = "skills-matrix";

/// Persisted auth session file name, relative to the root folder
pub const SESSION_FILE_NAME: &str = "session.json";

/// OS-dependent default root folder
///
/// Linux and Windows use the local data directory, macOS the application
/// support directory.
fn default_root_folder() -> PathBuf {
    let base = if cfg!(target_os = "macos") {
        dirs::data_dir()
    } else {
        dirs::data_local_dir()
    };
    base.map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(format!("./{}_data", APP_DIR_NAME.replace('-', "_"))))
}

/// `<config dir>/skills-matrix/config.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

// ========================================
// TOML configuration
// ========================================

/// Dashboard bootstrap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Root folder for the session file (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    /// Base URL of the skills backend API
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// HTTP port the dashboard listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout for ordinary backend requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Ceiling for PDF generation requests
    #[serde(default = "default_export_timeout_secs")]
    pub export_timeout_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8001/api".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_export_timeout_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            backend_url: default_backend_url(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            export_timeout_secs: default_export_timeout_secs(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from a TOML file
    ///
    /// A missing file is not an error: a warning is logged and defaults are
    /// returned. A file that exists but cannot be parsed is a `Config` error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {:?} not found, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {:?}: {}", path, e)))?;

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load from the platform default location, or defaults if there is none
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => {
                warn!("No platform config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }
}

// ========================================
// Root folder
// ========================================

/// Resolves the root folder from CLI, environment, TOML and defaults
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_config(mut self, config: &DashboardConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            debug!("Root folder from command line: {:?}", path);
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                debug!("Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            debug!("Root folder from config file: {:?}", path);
            return path.clone();
        }

        default_root_folder()
    }
}

/// Prepares the resolved root folder for use
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root folder (and parents) if it does not exist yet
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root.exists() {
            info!("Creating root folder {:?}", self.root);
            std::fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    pub fn session_path(&self) -> PathBuf {
        self.root.join(SESSION_FILE_NAME)
    }
}

// ========================================
// Atomic writes
// ========================================

/// Write `contents` to `path` through a sibling temp file and a rename
///
/// Readers never observe a half-written file. On Unix the file is created
/// with mode 0600 since it may hold credentials.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Not a file path: {:?}", path)))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::Io(e));
    }
    Ok(())
}

/// True if group or other can read the file
#[cfg(unix)]
pub fn check_permissions_loose(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o077 != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.port, 5780);
        assert_eq!(config.backend_url, "http://127.0.0.1:8001/api");
        assert_eq!(config.export_timeout(), Duration::from_secs(60));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: DashboardConfig = toml::from_str("port = 9000\n[logging]\n").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.export_timeout_secs, 60);
        assert_eq!(config.logging.level, "info");
        assert!(config.root_folder.is_none());
    }

    #[test]
    fn test_session_path_is_inside_root() {
        let init = RootFolderInitializer::new(PathBuf::from("/data/skills"));
        assert_eq!(init.session_path(), PathBuf::from("/data/skills/session.json"));
    }
}
