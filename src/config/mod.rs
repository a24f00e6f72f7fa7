//! Preview configuration (`md-previewer.toml`).
//!
//! # Lookup
//!
//! 1. `--config <path>` if given (must exist)
//! 2. `md-previewer.toml` next to the source file, if present
//! 3. built-in defaults
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[serve]`   | Bind address, browser launch, reload debounce  |
//! | `[watch]`   | Source debounce, recursion                     |
//! | `[cache]`   | Render cache bound                             |
//! | `[handoff]` | Temp directory namespace                       |
//!
//! Unknown keys are reported as warnings and otherwise ignored.

mod error;
mod section;

pub use error::ConfigError;
pub use section::{CacheConfig, HandoffConfig, ServeConfig, WatchConfig};

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::handoff::Handoff;

/// File name looked up beside the source document.
pub const CONFIG_FILE: &str = "md-previewer.toml";

/// Root configuration structure representing md-previewer.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Config file this was loaded from, if any (internal use only)
    #[serde(skip)]
    pub path: Option<PathBuf>,

    pub serve: ServeConfig,
    pub watch: WatchConfig,
    pub cache: CacheConfig,
    pub handoff: HandoffConfig,
}

impl PreviewConfig {
    /// Load configuration for previewing `source`.
    ///
    /// An explicit path that cannot be read or parsed is an error. The
    /// implicit sibling file is only used when it exists.
    pub fn load(explicit: Option<&Path>, source: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }

        let sibling = source
            .and_then(Path::parent)
            .map(|dir| dir.join(CONFIG_FILE))
            .filter(|path| path.is_file());

        match sibling {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)
            .map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;

        if !ignored.is_empty() {
            print_unknown_fields_warning(&ignored, path);
        }

        config.validate()?;
        config.path = Some(path.to_path_buf());
        crate::debug!("previewer"; "config loaded from {}", path.display());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let namespace = Path::new(&self.handoff.namespace);
        let mut components = namespace.components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal {
            return Err(ConfigError::Validation(format!(
                "handoff.namespace must be a single directory name, got `{}`",
                self.handoff.namespace
            )));
        }
        Ok(())
    }

    /// Handoff location under the system temp dir.
    pub fn handoff(&self) -> Handoff {
        Handoff::in_temp_dir(&self.handoff.namespace)
    }
}

fn print_unknown_fields_warning(fields: &[String], path: &Path) {
    crate::log!("warning"; "unknown fields in {}, ignoring: {}", path.display(), fields.join(", "));
}

#[cfg(test)]
pub(crate) fn test_parse_config(content: &str) -> PreviewConfig {
    let (config, _) = PreviewConfig::parse_with_ignored(content).unwrap();
    config
}
