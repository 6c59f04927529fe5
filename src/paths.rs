//! Filesystem locations for configuration, logs and persisted storage.

use std::env;
use std::path::{Path, PathBuf};

/// Application directory name used under every base directory.
const APP_DIR: &str = "langsync";

/// Resolve an XDG base directory from environment or default to `$HOME` + segments.
///
/// Inputs:
/// - `var`: Environment variable to check (e.g., `XDG_CONFIG_HOME`).
/// - `home_default`: Fallback path segments relative to `$HOME` if `var` is unset/empty.
///
/// Output: Resolved base directory path.
fn xdg_base_dir(var: &str, home_default: &[&str]) -> PathBuf {
    if let Ok(p) = env::var(var)
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let mut base = PathBuf::from(home);
    for seg in home_default {
        base = base.join(seg);
    }
    base
}

/// Create `dir` if needed and hand it back.
fn ensured(dir: PathBuf) -> PathBuf {
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::debug!(path = %dir.display(), error = %e, "could not create directory");
    }
    dir
}

/// Config directory: `$XDG_CONFIG_HOME/langsync`, else `$HOME/.config/langsync` (ensured to exist)
#[must_use]
pub fn config_dir() -> PathBuf {
    ensured(xdg_base_dir("XDG_CONFIG_HOME", &[".config"]).join(APP_DIR))
}

/// Logs directory under config: `<config>/logs` (ensured to exist)
#[must_use]
pub fn logs_dir() -> PathBuf {
    ensured(config_dir().join("logs"))
}

/// Data directory: `$XDG_DATA_HOME/langsync`, else `$HOME/.local/share/langsync` (ensured to exist)
#[must_use]
pub fn data_dir() -> PathBuf {
    ensured(xdg_base_dir("XDG_DATA_HOME", &[".local", "share"]).join(APP_DIR))
}

/// Default location of the persisted key/value storage file.
#[must_use]
pub fn default_storage_file() -> PathBuf {
    data_dir().join("i18n_storage.json")
}

/// What: Resolve a possibly relative path against the config directory.
///
/// Details:
/// - `~/` prefixes are expanded with `$HOME`
#[must_use]
pub fn resolve_against_config(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~")
        && let Ok(home) = env::var("HOME")
    {
        return Path::new(&home).join(stripped);
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir().join(path)
    }
}
