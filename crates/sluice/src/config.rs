//! Configuration for sluice.
//!
//! Looks for `.config/sluice.toml` in the current directory or any parent
//! directory. Example:
//!
//! ```toml
//! [capabilities]
//! variant = "mariadb"
//! version = "10.4.3"
//!
//! [options]
//! indent = "  "
//! auto_increment = "emit"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Capabilities, ConfigError};

/// Whether table options carry an explicit `AUTO_INCREMENT` seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoIncrementPolicy {
    /// Never write the seed.
    #[default]
    Omit,
    /// Write the seed when altering, or when it is not the default of 1.
    Emit,
}

/// Knobs that change the text of a plan but not its meaning.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    /// Indent for multi-clause bodies. `None` keeps them on one line.
    pub indent: Option<String>,
    /// `None` qualifies tables with their own schema, `Some("")` never
    /// qualifies and `Some(s)` always qualifies with `s`.
    ///
    /// Setting a qualifier scopes the plan to one schema: schema-level
    /// changes and changes spanning schemas are rejected.
    pub schema_qualifier: Option<String>,
    pub auto_increment: AutoIncrementPolicy,
}

impl PlanOptions {
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = Some(indent.into());
        self
    }

    pub fn with_schema_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.schema_qualifier = Some(qualifier.into());
        self
    }

    pub fn with_auto_increment(mut self, policy: AutoIncrementPolicy) -> Self {
        self.auto_increment = policy;
        self
    }
}

/// Everything a [`Planner`](crate::Planner) needs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capabilities: Capabilities,
    pub options: PlanOptions,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from `.config/sluice.toml`, searching up the
    /// directory tree from the current directory.
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let cwd = std::env::current_dir()?;
        Self::load_from(&cwd)
    }

    /// Load configuration starting from a specific directory.
    pub fn load_from(start: &Path) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = find_config_file(start)?;
        let config = Self::from_file(&config_path)?;
        tracing::debug!(path = %config_path.display(), "loaded config");
        Ok((config, config_path))
    }
}

fn find_config_file(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".config/sluice.toml");
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(ConfigError::NotFound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Variant, Version};

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.options.auto_increment, AutoIncrementPolicy::Omit);
    }

    #[test]
    fn test_capabilities_from_toml() {
        let config = Config::from_toml_str(
            r#"
            [capabilities]
            variant = "mariadb"
            version = "10.4.3-MariaDB"

            [options]
            indent = "  "
            schema_qualifier = ""
            auto_increment = "emit"
            "#,
        )
        .unwrap();

        let caps = &config.capabilities;
        assert_eq!(caps.variant, Variant::MariaDb);
        assert_eq!(caps.version, Version::new(10, 4, 3));
        assert!(!caps.supports_rename_column);
        assert_eq!(caps.charset, "latin1");
        assert_eq!(config.options.indent.as_deref(), Some("  "));
        assert_eq!(config.options.schema_qualifier.as_deref(), Some(""));
        assert_eq!(config.options.auto_increment, AutoIncrementPolicy::Emit);
    }

    #[test]
    fn test_capability_overrides() {
        let config = Config::from_toml_str(
            r#"
            [capabilities]
            version = "5.7.40"
            supports_rename_column = true
            charset = "utf8mb4"
            "#,
        )
        .unwrap();
        assert!(config.capabilities.supports_rename_column);
        assert_eq!(config.capabilities.charset, "utf8mb4");
        assert_eq!(config.capabilities.collation, "latin1_swedish_ci");
    }

    #[test]
    fn test_bad_version_is_parse_error() {
        let err = Config::from_toml_str("[capabilities]\nversion = \"eight\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::from_file("/nonexistent/sluice.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
