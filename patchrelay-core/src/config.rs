//! User configuration at `~/.patchrelay/config.yaml`.
//!
//! # Storage layout
//!
//! ```text
//! ~/.patchrelay/
//!   config.yaml        (mode 0600, optional)
//!   templates/*.tera   (optional message template overrides)
//!   runs/*.json        (run records, written by patchrelay-workflow)
//! ```
//!
//! # API pattern
//!
//! Every function that touches the filesystem has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must never call the no-arg wrappers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

pub const DEFAULT_MAIN_REPO: &str = "napistu/napistu";
pub const DEFAULT_BASE: &str = "main";
pub const DEFAULT_CONVENTIONS: &str = "./conventions.md";
pub const DEFAULT_LIB_DIR: &str = "lib";
pub const DEFAULT_REMOTE: &str = "origin";

/// How to invoke the change-proposal agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Executable name or path.
    pub program: String,
    /// Name used in user-facing messages and pull-request attribution.
    pub display_name: String,
    /// Arguments placed before the generated ones.
    pub extra_args: Vec<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            program: "claude-code".to_string(),
            display_name: "Claude Code".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Effective configuration. Every field has a built-in default, so a missing
/// or partial file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Superproject as `owner/name`.
    pub main_repo: String,
    pub base: String,
    pub conventions: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_reviewer: Option<String>,
    /// Directory, relative to the superproject root, holding subrepositories.
    pub lib_dir: PathBuf,
    pub remote: String,
    /// Template override directory; `~/.patchrelay/templates` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
    pub git_program: String,
    pub gh_program: String,
    pub agent: AgentSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            main_repo: DEFAULT_MAIN_REPO.to_string(),
            base: DEFAULT_BASE.to_string(),
            conventions: PathBuf::from(DEFAULT_CONVENTIONS),
            default_reviewer: None,
            lib_dir: PathBuf::from(DEFAULT_LIB_DIR),
            remote: DEFAULT_REMOTE.to_string(),
            templates_dir: None,
            git_program: "git".to_string(),
            gh_program: "gh".to_string(),
            agent: AgentSettings::default(),
        }
    }
}

impl Config {
    /// Template override directory for this config, rooted at `home`.
    pub fn templates_dir_at(&self, home: &Path) -> PathBuf {
        self.templates_dir
            .clone()
            .unwrap_or_else(|| patchrelay_root(home).join("templates"))
    }
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.patchrelay/`
pub fn patchrelay_root(home: &Path) -> PathBuf {
    home.join(".patchrelay")
}

/// `<home>/.patchrelay/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    patchrelay_root(home).join("config.yaml")
}

/// `<home>/.patchrelay/runs/`
pub fn runs_dir_at(home: &Path) -> PathBuf {
    patchrelay_root(home).join("runs")
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the config file, falling back to defaults when it does not exist.
///
/// Returns `ConfigError::Parse` (with path) if the YAML is malformed.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save `config` to `<home>/.patchrelay/config.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &Config) -> Result<(), ConfigError> {
    let dir = patchrelay_root(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    let path = config_path_at(home);
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(&path, e));
    }
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// 4. Init
// ---------------------------------------------------------------------------

/// Write a default config file if none exists.
///
/// Idempotent: an existing file is loaded and returned unchanged. The
/// boolean is `true` when a new file was written.
pub fn init_at(home: &Path) -> Result<(Config, bool), ConfigError> {
    if config_path_at(home).exists() {
        return Ok((load_at(home)?, false));
    }
    let config = Config::default();
    save_at(home, &config)?;
    Ok((config, true))
}

/// `init_at` convenience wrapper.
pub fn init() -> Result<(Config, bool), ConfigError> {
    init_at(&home()?)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Home directory from `dirs::home_dir()`.
pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
