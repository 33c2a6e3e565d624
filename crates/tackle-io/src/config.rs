// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration of the resource system, readable from RON documents.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tackle_core::resource::{ResourceError, ResourceType};
use tackle_data::CacheConfig;

/// A resource to load when the manager preloads its configured set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadEntry {
    /// Path of the resource.
    pub path: String,
    /// Type tag selecting the loader.
    pub resource_type: ResourceType,
}

impl PreloadEntry {
    /// Creates a preload entry.
    pub fn new(path: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            path: path.into(),
            resource_type,
        }
    }
}

/// Configuration of a [`ResourceManager`](crate::ResourceManager).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResourceManagerConfig {
    /// Name given to the background worker thread.
    pub worker_thread_name: String,
    /// Resources loaded by [`ResourceManager::preload_configured`](crate::ResourceManager::preload_configured).
    pub preload: Vec<PreloadEntry>,
}

impl Default for ResourceManagerConfig {
    fn default() -> Self {
        Self {
            worker_thread_name: "tackle-resource-worker".to_string(),
            preload: Vec::new(),
        }
    }
}

/// Top-level configuration document for the manager and the cache.
///
/// ```
/// use tackle_io::ResourceSystemConfig;
///
/// let config = ResourceSystemConfig::from_ron_str(
///     r#"(
///         manager: (preload: [(path: "ui/font.ttf", resource_type: "font")]),
///         cache: (size_limit_bytes: 4096),
///     )"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.manager.preload.len(), 1);
/// assert_eq!(config.cache.size_limit_bytes, 4096);
/// assert_eq!(config.cache.eviction_target_percent, 80);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResourceSystemConfig {
    /// Manager settings.
    pub manager: ResourceManagerConfig,
    /// Cache settings.
    pub cache: CacheConfig,
}

impl ResourceSystemConfig {
    /// Parses a configuration from a RON string. Missing fields take their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self, ResourceError> {
        ron::from_str(source).map_err(|e| ResourceError::Config(e.to_string()))
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ResourceError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_ron_str(&source)?;
        log::debug!(
            "Loaded resource configuration from {} ({} preload entries)",
            path.display(),
            config.manager.preload.len()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = ResourceSystemConfig::from_ron_str("()").unwrap();
        assert_eq!(config, ResourceSystemConfig::default());
        assert_eq!(config.manager.worker_thread_name, "tackle-resource-worker");
        assert_eq!(config.cache.size_limit_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn test_full_document() {
        let config = ResourceSystemConfig::from_ron_str(
            r#"(
                manager: (
                    worker_thread_name: "loader",
                    preload: [
                        (path: "textures/grass.png", resource_type: "texture"),
                        (path: "sounds/step.wav", resource_type: "sound"),
                    ],
                ),
                cache: (size_limit_bytes: 2048, eviction_target_percent: 50),
            )"#,
        )
        .unwrap();

        assert_eq!(config.manager.worker_thread_name, "loader");
        assert_eq!(
            config.manager.preload[1],
            PreloadEntry::new("sounds/step.wav", ResourceType::new("sound"))
        );
        assert_eq!(config.cache.eviction_target_percent, 50);
    }

    #[test]
    fn test_malformed_document_is_a_config_error() {
        let result = ResourceSystemConfig::from_ron_str("(manager: (preload: 3))");
        assert!(matches!(result, Err(ResourceError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let result = ResourceSystemConfig::load("/definitely/not/here/resources.ron");
        match result {
            Err(ResourceError::Config(message)) => assert!(message.contains("resources.ron")),
            other => panic!("expected a config error, got {other:?}"),
        }
    }
}
