//! User configuration and preferences

use crate::domain::{ConfirmationPolicy, DeleteMode, TraversalLimits};
use crate::error::{Result, SweeprError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Private storage the app may delete from directly
    pub sandbox_root: Option<PathBuf>,
    /// JSON catalog standing in for the shared media index
    pub catalog_path: Option<PathBuf>,
    /// Whether index deletes must be confirmed out of process
    pub confirmation: ConfirmationPolicy,
    /// How sandbox files are disposed of
    pub delete_mode: DeleteMode,
    /// Caps for walking granted directory trees
    pub traversal: TraversalLimits,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            sandbox_root: None,
            catalog_path: None,
            confirmation: ConfirmationPolicy::Required,
            delete_mode: DeleteMode::Remove,
            traversal: TraversalLimits::default(),
        }
    }
}

impl UserConfig {
    /// Get the config file path (~/.config/sweepr/config.json)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sweepr").join("config.json"))
    }

    /// Default sandbox (~/.local/share/sweepr)
    pub fn default_sandbox_root() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("sweepr"))
    }

    /// Default catalog location (~/.local/share/sweepr-index/catalog.json).
    /// Kept outside the sandbox so the catalog itself is never a sandbox file.
    pub fn default_catalog_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("sweepr-index").join("catalog.json"))
    }

    /// Sandbox root, falling back to the platform default
    pub fn resolved_sandbox_root(&self) -> Option<PathBuf> {
        self.sandbox_root
            .clone()
            .or_else(Self::default_sandbox_root)
    }

    /// Catalog path, falling back to the platform default
    pub fn resolved_catalog_path(&self) -> Option<PathBuf> {
        self.catalog_path
            .clone()
            .or_else(Self::default_catalog_path)
    }

    /// Load config from file, or create default if doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok_or_else(|| {
            SweeprError::ConfigError("Could not determine config directory".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            SweeprError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        Self::from_json(&contents)
    }

    /// Parse a config document. Missing fields take their defaults.
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| {
            SweeprError::ConfigError(format!("Failed to parse config file: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert!(config.sandbox_root.is_none());
        assert!(config.catalog_path.is_none());
        assert_eq!(config.confirmation, ConfirmationPolicy::Required);
        assert_eq!(config.delete_mode, DeleteMode::Remove);
        assert_eq!(config.traversal, TraversalLimits::default());
    }

    #[test]
    fn test_config_serialization() {
        let config = UserConfig {
            sandbox_root: Some(PathBuf::from("/data/app")),
            catalog_path: Some(PathBuf::from("/data/index.json")),
            confirmation: ConfirmationPolicy::NotRequired,
            delete_mode: DeleteMode::Trash,
            traversal: TraversalLimits {
                max_depth: 8,
                max_nodes: 500,
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized = UserConfig::from_json(&json).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = UserConfig::from_json(r#"{ "confirmation": "not-required" }"#).unwrap();
        assert_eq!(config.confirmation, ConfirmationPolicy::NotRequired);
        assert_eq!(config.delete_mode, DeleteMode::Remove);
        assert!(config.sandbox_root.is_none());
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let result = UserConfig::from_json(r#"{ "delete_mode": "shred" }"#);
        assert!(matches!(result, Err(SweeprError::ConfigError(_))));
    }

    #[test]
    fn test_explicit_paths_win_over_defaults() {
        let config = UserConfig {
            sandbox_root: Some(PathBuf::from("/data/app")),
            ..UserConfig::default()
        };
        assert_eq!(
            config.resolved_sandbox_root(),
            Some(PathBuf::from("/data/app"))
        );
    }
}
