//! IO and path helpers for reading config layers from disk.

use super::{ConfigLayer, ConfigLayerSource, DEFAULT_CONFIG_FILE, schema};
use crate::ConfigError;
use directories::ProjectDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Load a layer when a path is given and exists on disk.
pub(super) fn load_optional_layer(
    source: ConfigLayerSource,
    path: Option<&Path>,
) -> Result<Option<(ConfigLayer, Value)>, ConfigError> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !path.exists() {
        debug!(
            "optional layer missing (source={:?}, path={})",
            source,
            path.display()
        );
        return Ok(None);
    }
    load_layer(source, path).map(Some)
}

/// Read, parse, and schema-check a layer that must exist.
pub(super) fn load_layer(
    source: ConfigLayerSource,
    path: &Path,
) -> Result<(ConfigLayer, Value), ConfigError> {
    debug!(
        "loading config layer (source={:?}, path={})",
        source,
        path.display()
    );
    let contents = read_layer(path)?;
    let label = format!("{}({})", source.label(), path.display());
    let value = parse_json5(&contents, &label)?;
    schema::validate_layer_schema(&value, &label)?;
    let meta = ConfigLayer {
        source,
        path: path.to_path_buf(),
    };
    Ok((meta, value))
}

pub(super) fn read_layer(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn parse_json5(contents: &str, origin: &str) -> Result<Value, ConfigError> {
    json5::from_str(contents).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Requirements file location on Unix; None elsewhere.
pub(super) fn default_requirements_path() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        Some(PathBuf::from(super::SYSTEM_REQUIREMENTS_PATH))
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Per-user config file in the platform config directory.
pub(super) fn default_user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "csvchat").map(|dirs| dirs.config_dir().join(DEFAULT_CONFIG_FILE))
}

/// Canonicalize when possible; a missing directory is kept as given.
pub(super) fn normalize_path(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Key used to skip a file reached through two layer candidates.
pub(super) fn dedupe_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Nearest ancestor of `cwd` containing one of the marker entries.
pub(super) fn find_project_root(cwd: &Path, markers: &[String]) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|dir| markers.iter().any(|marker| dir.join(marker).exists()))
        .map(Path::to_path_buf)
}
