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

use super::ResourceType;
use crate::telemetry::MetricsError;
use std::sync::Arc;
use thiserror::Error;

/// A loader or resource failure, shared between every caller waiting on the same load.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// An error produced by the resource system.
///
/// The type is `Clone` because a single load can complete several waiters at once
/// (concurrent requests for the same path share one loader invocation).
#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    /// No loader is registered for the requested type.
    #[error("no loader registered for resource type '{resource_type}'")]
    NoLoader {
        /// The type that was requested.
        resource_type: ResourceType,
    },

    /// The loader could not produce a resource for the path.
    #[error("loader could not create resource '{path}'")]
    LoaderFailed {
        /// The requested path.
        path: String,
        /// The loader's error.
        #[source]
        source: SharedError,
    },

    /// The resource was created but its own `load()` failed.
    #[error("resource '{path}' failed to load")]
    LoadFailed {
        /// The requested path.
        path: String,
        /// The resource's error.
        #[source]
        source: SharedError,
    },

    /// The load was abandoned before completing (e.g. the loader panicked).
    #[error("load of '{path}' was interrupted")]
    Interrupted {
        /// The requested path.
        path: String,
    },

    /// The manager shut down before the load could be served or registered.
    #[error("resource manager shut down before '{path}' was loaded")]
    ShuttingDown {
        /// The requested path.
        path: String,
    },

    /// The background worker thread could not be started.
    #[error("failed to spawn the resource worker thread")]
    WorkerSpawn(#[source] Arc<std::io::Error>),

    /// A metric could not be registered.
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// A configuration document could not be read or parsed.
    #[error("invalid resource configuration: {0}")]
    Config(String),
}

impl ResourceError {
    /// Returns the path the failed request was about, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ResourceError::LoaderFailed { path, .. }
            | ResourceError::LoadFailed { path, .. }
            | ResourceError::Interrupted { path }
            | ResourceError::ShuttingDown { path } => Some(path),
            _ => None,
        }
    }
}
