//! Compiler configuration loaded from relq.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default prefix for generated subquery aliases (`t`, `t0`, `t1`, ...)
pub const DEFAULT_SUBQUERY_ALIAS_PREFIX: &str = "t";

/// Default prefix for generated projection aliases (`c`, `c0`, `c1`, ...)
pub const DEFAULT_COLUMN_ALIAS_PREFIX: &str = "c";

/// Settings that steer alias generation and table naming during compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Base name for subquery aliases created by push-down
    #[serde(default = "default_subquery_alias_prefix")]
    pub subquery_alias_prefix: String,

    /// Base name for projection aliases of unnamed expressions
    #[serde(default = "default_column_alias_prefix")]
    pub column_alias_prefix: String,

    /// Schema applied to catalog tables that do not declare one
    #[serde(default)]
    pub default_schema: Option<String>,
}

fn default_subquery_alias_prefix() -> String {
    DEFAULT_SUBQUERY_ALIAS_PREFIX.to_string()
}

fn default_column_alias_prefix() -> String {
    DEFAULT_COLUMN_ALIAS_PREFIX.to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            subquery_alias_prefix: default_subquery_alias_prefix(),
            column_alias_prefix: default_column_alias_prefix(),
            default_schema: None,
        }
    }
}

impl CompilerConfig {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a directory.
    /// Looks for relq.yml or relq.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("relq.yml");
        let yaml_path = dir.join("relq.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        // An empty document means "all defaults"
        let config: CompilerConfig = if content.trim().is_empty() {
            CompilerConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        validate_prefix("subquery_alias_prefix", &self.subquery_alias_prefix)?;
        validate_prefix("column_alias_prefix", &self.column_alias_prefix)?;

        if let Some(schema) = &self.default_schema {
            if schema.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: "default_schema cannot be empty when set".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Alias prefixes are emitted unquoted, so they must be plain identifiers.
fn validate_prefix(field: &str, prefix: &str) -> CoreResult<()> {
    let mut chars = prefix.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CoreError::ConfigInvalid {
            message: format!(
                "{field} must be a non-empty identifier (letters, digits, '_'), got '{prefix}'"
            ),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
