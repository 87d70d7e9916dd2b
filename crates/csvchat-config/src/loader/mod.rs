//! Layered config discovery for csvchat.
//!
//! Each JSON5 layer is schema-checked on its own, then merged over the
//! previous ones. Keys present in the requirements file are pinned and win
//! over every other layer.

mod layer_io;
mod merge;
mod schema;

#[cfg(test)]
mod tests;

use crate::{ConfigError, CsvChatConfig};
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name looked up in the user, project, and cwd layers.
const DEFAULT_CONFIG_FILE: &str = "csvchat.json5";
/// Directory holding the project layer under the project root.
const DEFAULT_CONFIG_DIR: &str = ".csvchat";
/// Entries that mark a directory as the project root.
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git", DEFAULT_CONFIG_DIR];

#[cfg(unix)]
const SYSTEM_REQUIREMENTS_PATH: &str = "/etc/csvchat/requirements.json5";

/// The merged config and the layers that produced it.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: CsvChatConfig,
    /// Contributing layers, requirements first, then lowest to highest
    /// precedence.
    pub layers: Vec<ConfigLayer>,
}

/// Where a layer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// Pinned keys that override every other layer.
    Requirements,
    /// `csvchat.json5` in the platform config directory.
    User,
    /// `<root>/.csvchat/csvchat.json5`.
    Project,
    /// `csvchat.json5` in the working directory.
    Cwd,
    /// Files passed explicitly, e.g. with `--config`.
    Runtime,
}

impl ConfigLayerSource {
    fn label(self) -> &'static str {
        match self {
            ConfigLayerSource::Requirements => "requirements",
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Project => "project",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Runtime => "runtime",
        }
    }
}

/// A layer that was found and loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Locations searched by [`CsvChatConfig::load_layered_with_options`].
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Start of the project-root search and home of the cwd layer.
    pub cwd: PathBuf,
    pub user_config_path: Option<PathBuf>,
    pub requirements_path: Option<PathBuf>,
    /// Applied after the discovered layers, in order; each must exist.
    pub runtime_paths: Vec<PathBuf>,
    /// In-memory layer applied after the runtime files, e.g. from flags.
    pub overrides: Option<Value>,
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    /// Platform defaults for user and requirements files, rooted at `cwd`.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layer_io::default_user_config_path(),
            requirements_path: layer_io::default_requirements_path(),
            runtime_paths: Vec::new(),
            overrides: None,
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Layer `overrides` above every file; pinned keys still win.
    pub fn with_overrides(mut self, overrides: Value) -> Self {
        match &mut self.overrides {
            Some(existing) => merge::overlay(existing, &overrides),
            None => self.overrides = Some(overrides),
        }
        self
    }

    /// Optional layers in ascending precedence.
    fn discovered_layers(&self, cwd: &Path) -> Vec<(ConfigLayerSource, PathBuf)> {
        let mut found = Vec::new();
        if let Some(user) = &self.user_config_path {
            found.push((ConfigLayerSource::User, user.clone()));
        }
        match layer_io::find_project_root(cwd, &self.project_root_markers) {
            Some(root) => {
                debug!("project root found (path={})", root.display());
                found.push((
                    ConfigLayerSource::Project,
                    root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
                ));
            }
            None => debug!("no project root above cwd (cwd={})", cwd.display()),
        }
        found.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));
        found
    }
}

impl CsvChatConfig {
    /// Read one JSON5 file without any layering.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config file (path={})", path.display());
        let contents = layer_io::read_layer(path)?;
        let value = layer_io::parse_json5(&contents, &path.display().to_string())?;
        decode(value, "config")
    }

    /// Parse inline JSON5 without any layering.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        let value = layer_io::parse_json5(contents, "inline config")?;
        decode(value, "config")
    }

    /// Load the default layer stack for `cwd`.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load and merge the layer stack described by `options`.
    ///
    /// Precedence, lowest first: user, project, cwd, runtime files, then
    /// in-memory overrides. Requirements keys are applied last and cannot be
    /// overridden.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = layer_io::normalize_path(&options.cwd)?;
        let mut layers = Vec::new();

        let pinned = match layer_io::load_optional_layer(
            ConfigLayerSource::Requirements,
            options.requirements_path.as_deref(),
        )? {
            Some((layer, value)) => {
                layers.push(layer);
                Some(value)
            }
            None => None,
        };

        let mut merged = Value::Object(Map::new());
        let mut visited = HashSet::new();
        for (source, path) in options.discovered_layers(&cwd) {
            if !visited.insert(layer_io::dedupe_key(&path)) {
                debug!(
                    "layer already loaded (source={}, path={})",
                    source.label(),
                    path.display()
                );
                continue;
            }
            if let Some((layer, value)) = layer_io::load_optional_layer(source, Some(&path))? {
                merge::overlay_unlocked(&mut merged, &value, pinned.as_ref());
                layers.push(layer);
            }
        }
        for path in &options.runtime_paths {
            let (layer, value) = layer_io::load_layer(ConfigLayerSource::Runtime, path)?;
            merge::overlay_unlocked(&mut merged, &value, pinned.as_ref());
            layers.push(layer);
        }
        if let Some(overrides) = &options.overrides {
            schema::validate_layer_schema(overrides, "overrides")?;
            merge::overlay_unlocked(&mut merged, overrides, pinned.as_ref());
            debug!("override layer applied (pinned={})", pinned.is_some());
        }
        if let Some(pinned) = &pinned {
            merge::overlay(&mut merged, pinned);
        }

        let config = decode(merged, "merged")?;
        info!(
            "config layers merged (count={}, pinned={})",
            layers.len(),
            pinned.is_some()
        );
        Ok(LayeredConfig { config, layers })
    }

    /// Check the rules serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.api.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidField {
                path: "api.endpoint".to_string(),
                message: "expected an http(s) url".to_string(),
            });
        }
        if self.ui.mobile_breakpoint == 0 {
            return Err(ConfigError::InvalidField {
                path: "ui.mobile_breakpoint".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn decode(mut value: Value, origin: &str) -> Result<CsvChatConfig, ConfigError> {
    schema::validate_layer_schema(&value, origin)?;
    merge::strip_nulls(&mut value);
    let config: CsvChatConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
