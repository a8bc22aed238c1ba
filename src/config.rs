//! Compiler configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! standard behavior:
//!
//! ```toml
//! max_passes = 50
//! ignore_types = ["Shop.Internal.AuditTrail"]
//! exclude_controllers = ["Health"]
//! strip_route_prefixes = ["REST/", "api/"]
//! prefer_route_name_for = ["get", "put", "post", "delete"]
//! object_revival = "construct"
//! sort_methods = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// Default ceiling on discovery passes.
pub const DEFAULT_MAX_PASSES: usize = 50;

/// How object values are revived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectRevival {
    /// Call the generated class constructor, which revives its own properties.
    #[default]
    Construct,
    /// Expand the object's properties in place, guarding against cyclic types.
    Inline,
}

/// Options controlling discovery, naming and endpoint extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Upper bound on fixed-point discovery passes.
    pub max_passes: usize,
    /// Fully-qualified type names that are never discovered.
    pub ignore_types: Vec<String>,
    /// Controllers whose operations are skipped entirely.
    pub exclude_controllers: Vec<String>,
    /// Route prefixes removed from URL templates.
    pub strip_route_prefixes: Vec<String>,
    /// Action names that are replaced by the route-derived name when one exists.
    pub prefer_route_name_for: Vec<String>,
    /// Object revival strategy.
    pub object_revival: ObjectRevival,
    /// Sort interface methods by name.
    pub sort_methods: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            ignore_types: Vec::new(),
            exclude_controllers: Vec::new(),
            strip_route_prefixes: vec!["REST/".to_string(), "api/".to_string()],
            prefer_route_name_for: ["get", "put", "post", "delete"]
                .into_iter()
                .map(String::from)
                .collect(),
            object_revival: ObjectRevival::default(),
            sort_methods: true,
        }
    }
}

impl CompilerConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, CompileError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let text = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub(crate) fn is_ignored(&self, name: &str, identity: &str) -> bool {
        self.ignore_types.iter().any(|t| t == name || t == identity)
    }

    pub(crate) fn is_excluded_controller(&self, controller: &str) -> bool {
        self.exclude_controllers
            .iter()
            .any(|c| c.eq_ignore_ascii_case(controller))
    }

    pub(crate) fn prefers_route_name(&self, action: &str) -> bool {
        self.prefer_route_name_for
            .iter()
            .any(|a| a.eq_ignore_ascii_case(action))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CompilerConfig::from_toml_str("").unwrap();
        assert_eq!(config, CompilerConfig::default());
        assert_eq!(config.max_passes, 50);
        assert_eq!(config.strip_route_prefixes, vec!["REST/", "api/"]);
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = CompilerConfig::from_toml_str(
            r#"
max_passes = 3
object_revival = "inline"
exclude_controllers = ["Health"]
"#,
        )
        .unwrap();
        assert_eq!(config.max_passes, 3);
        assert_eq!(config.object_revival, ObjectRevival::Inline);
        assert!(config.is_excluded_controller("health"));
        assert!(config.sort_methods);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let err = CompilerConfig::from_toml_str("max_passes = \"many\"").unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ignore_types = [\"Shop.Secret\"]").unwrap();
        let config = CompilerConfig::load(file.path()).unwrap();
        assert!(config.is_ignored("Shop.Secret", "Shop.Secret"));
        assert!(!config.is_ignored("Shop.Item", "Shop.Item"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = CompilerConfig::load(Path::new("/nonexistent/contractgen.toml")).unwrap_err();
        assert!(matches!(err, CompileError::Io { .. }));
    }
}
