//! `diac.toml` configuration.
//!
//! ```toml
//! [compiler]
//! program = "plantuml"
//! flag_prefix = "-"
//! charset = "UTF-8"
//! version_pattern = 'version (\S+)'
//! version_on_stderr = true
//!
//! [watch]
//! filter = "*.puml"
//! creation_wait_secs = 2
//! poll_interval_secs = 1
//! ```
//!
//! A missing file means defaults; a malformed one is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::compiler::CompilerSettings;
use crate::watch::{GlobFilter, MonitorConfig};

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiacConfig {
    pub compiler: CompilerSection,
    pub watch: WatchSection,
}

/// `[compiler]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerSection {
    pub program: String,
    pub flag_prefix: String,
    pub charset: String,
    pub version_pattern: String,
    pub version_on_stderr: bool,
}

impl Default for CompilerSection {
    fn default() -> Self {
        let defaults = CompilerSettings::default();
        Self {
            program: defaults.program,
            flag_prefix: defaults.flag_prefix,
            charset: "UTF-8".into(),
            version_pattern: defaults.version_pattern,
            version_on_stderr: defaults.version_on_stderr,
        }
    }
}

impl CompilerSection {
    pub fn settings(&self) -> CompilerSettings {
        CompilerSettings {
            program: self.program.clone(),
            flag_prefix: self.flag_prefix.clone(),
            version_pattern: self.version_pattern.clone(),
            version_on_stderr: self.version_on_stderr,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSection {
    pub filter: String,
    pub creation_wait_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            filter: "*.puml".into(),
            creation_wait_secs: 2,
            poll_interval_secs: 1,
        }
    }
}

impl WatchSection {
    pub fn monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        Ok(MonitorConfig {
            filter: GlobFilter::new(&self.filter)
                .map_err(|e| ConfigError::Validation(format!("watch.filter: {e}")))?,
            creation_wait: Duration::from_secs(self.creation_wait_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        })
    }
}

impl DiacConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(path.to_path_buf(), e)),
        };
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.compiler.program.trim().is_empty() {
            return Err(ConfigError::Validation("compiler.program is empty".into()));
        }
        regex::Regex::new(&self.compiler.version_pattern).map_err(|e| {
            ConfigError::Validation(format!("compiler.version_pattern: {e}"))
        })?;
        if self.watch.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "watch.poll_interval_secs must be at least 1".into(),
            ));
        }
        self.watch.monitor_config().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiacConfig::default();
        assert_eq!(config.compiler.program, "plantuml");
        assert_eq!(config.watch.filter, "*.puml");
        assert_eq!(config.watch.creation_wait_secs, 2);
    }

    #[test]
    fn test_parse_partial() {
        let config: DiacConfig = toml::from_str(
            r#"
            [compiler]
            program = "mermaid"
            flag_prefix = "--"

            [watch]
            creation_wait_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.compiler.program, "mermaid");
        assert_eq!(config.compiler.flag_prefix, "--");
        assert_eq!(config.compiler.charset, "UTF-8"); // untouched default
        assert_eq!(config.watch.creation_wait_secs, 5);
        assert_eq!(config.watch.filter, "*.puml");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<DiacConfig, _> = toml::from_str("[compiler]\nprogramm = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_default_settings_validate() {
        // The shipped version_pattern uses \S and must compile.
        DiacConfig::default().validate().unwrap();
    }

    #[test]
    fn test_invalid_version_pattern() {
        let config: DiacConfig = toml::from_str(
            "[compiler]\nversion_pattern = \"(unclosed\"\n",
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let config = DiacConfig::load(Path::new("/nonexistent/diac.toml")).unwrap();
        assert_eq!(config.compiler.program, "plantuml");
    }
}
