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

//! The resource manager and its background loading pipeline.
//!
//! A [`ResourceManager`] owns one loader per [`ResourceType`], the registry of
//! loaded resources keyed by path, and a queue of asynchronous requests served
//! by a single worker thread. Synchronous loads run on the calling thread.
//! Concurrent loads of the same path are coalesced so that the loader runs once.

mod flight;
mod metrics;
mod shared;
mod worker;

use crate::config::{PreloadEntry, ResourceManagerConfig};
use metrics::ManagerMetrics;
use shared::Shared;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tackle_core::resource::{ResourceError, ResourceHandle, ResourceLoader, ResourceType};
use tackle_telemetry::MetricsRegistry;
use worker::LoadRequest;

/// Outcome of a load request.
pub type LoadResult = Result<ResourceHandle, ResourceError>;

/// Outcome of a preload batch.
#[derive(Debug, Default)]
pub struct PreloadSummary {
    /// Paths that are now registered.
    pub loaded: Vec<String>,
    /// Paths that failed, with the reason.
    pub failed: Vec<(String, ResourceError)>,
}

impl PreloadSummary {
    /// Returns `true` if every entry loaded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Loads resources through registered loaders and tracks what is resident.
///
/// The manager is `Sync`: share it behind an `Arc` to load from several threads.
/// Call [`init`](Self::init) to start the worker before relying on
/// [`load_resource_async`](Self::load_resource_async); requests queued before
/// that are served once the worker starts, or failed by [`cleanup`](Self::cleanup).
pub struct ResourceManager {
    config: ResourceManagerConfig,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    metrics_registry: Arc<MetricsRegistry>,
}

impl ResourceManager {
    /// Creates a manager reporting to its own metrics registry.
    pub fn new(config: ResourceManagerConfig) -> Result<Self, ResourceError> {
        Self::with_metrics_registry(config, Arc::new(MetricsRegistry::new()))
    }

    /// Creates a manager reporting to `metrics_registry`.
    pub fn with_metrics_registry(
        config: ResourceManagerConfig,
        metrics_registry: Arc<MetricsRegistry>,
    ) -> Result<Self, ResourceError> {
        let metrics = ManagerMetrics::register(&metrics_registry)?;
        Ok(Self {
            config,
            shared: Arc::new(Shared::new(metrics)),
            worker: Mutex::new(None),
            metrics_registry,
        })
    }

    /// Starts the background worker. Does nothing if it is already running.
    ///
    /// After [`cleanup`](Self::cleanup), calling `init` again starts a new worker.
    pub fn init(&self) -> Result<(), ResourceError> {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);

        {
            let registry = self.shared.lock();
            // A previous worker may still be draining after a shutdown request.
            let mut registry = self
                .shared
                .wake
                .wait_while(registry, |r| r.worker_alive && r.shutdown)
                .unwrap_or_else(PoisonError::into_inner);
            if registry.worker_alive {
                return Ok(());
            }
            registry.shutdown = false;
            registry.worker_alive = true;
        }

        if let Some(previous) = slot.take() {
            if previous.join().is_err() {
                log::warn!("Previous resource worker thread panicked");
            }
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.config.worker_thread_name.clone())
            .spawn(move || worker::run(shared));
        match spawned {
            Ok(handle) => {
                *slot = Some(handle);
                log::info!(
                    "Resource manager initialized (worker '{}')",
                    self.config.worker_thread_name
                );
                Ok(())
            }
            Err(e) => {
                self.shared.lock().worker_alive = false;
                log::error!("Failed to spawn resource worker thread: {}", e);
                Err(ResourceError::WorkerSpawn(Arc::new(e)))
            }
        }
    }

    /// Registers the loader for `resource_type`, replacing any previous one.
    pub fn set_loader(&self, resource_type: ResourceType, loader: Arc<dyn ResourceLoader>) {
        let replaced = self
            .shared
            .lock()
            .loaders
            .insert(resource_type.clone(), loader)
            .is_some();
        if replaced {
            log::debug!("Replaced loader for resource type '{}'", resource_type);
        } else {
            log::debug!("Registered loader for resource type '{}'", resource_type);
        }
    }

    /// Returns the resource registered under `path`, loading it on the calling
    /// thread if needed.
    ///
    /// On failure the registry is left untouched.
    pub fn load_resource(&self, path: &str, resource_type: &ResourceType) -> LoadResult {
        self.shared.load(path, resource_type)
    }

    /// Queues a load and returns immediately.
    ///
    /// `callback` runs on the worker thread, in the order requests were queued,
    /// including for paths that are already loaded. If the manager shuts down
    /// first, it receives [`ResourceError::ShuttingDown`].
    pub fn load_resource_async<F>(
        &self,
        path: impl Into<String>,
        resource_type: ResourceType,
        callback: F,
    ) where
        F: FnOnce(LoadResult) + Send + 'static,
    {
        let request = LoadRequest {
            path: path.into(),
            resource_type,
            callback: Box::new(callback),
        };
        log::trace!("Queued async load of '{}'", request.path);
        self.shared.lock().pending.push(request);
        self.shared.wake.notify_all();
    }

    /// Unloads and unregisters `path`. Returns `false` if it was not registered.
    pub fn unload_resource(&self, path: &str) -> bool {
        match self.shared.detach(path) {
            Some((entry, loader)) => {
                shared::release(entry, loader);
                true
            }
            None => false,
        }
    }

    /// Unloads and unregisters every resource. Returns how many were removed.
    pub fn unload_all_resources(&self) -> usize {
        let detached = self.shared.detach_all();
        let count = detached.len();
        for (entry, loader) in detached {
            shared::release(entry, loader);
        }
        if count > 0 {
            log::info!("Unloaded all {} resources", count);
        }
        count
    }

    /// Loads every entry synchronously, in order. A failure does not stop the batch.
    pub fn preload_resources(&self, entries: &[PreloadEntry]) -> PreloadSummary {
        let mut summary = PreloadSummary::default();
        for entry in entries {
            match self.load_resource(&entry.path, &entry.resource_type) {
                Ok(_) => summary.loaded.push(entry.path.clone()),
                Err(e) => summary.failed.push((entry.path.clone(), e)),
            }
        }
        log::info!(
            "Preloaded {} resources ({} failed)",
            summary.loaded.len(),
            summary.failed.len()
        );
        summary
    }

    /// Preloads the entries listed in the manager's configuration.
    pub fn preload_configured(&self) -> PreloadSummary {
        self.preload_resources(&self.config.preload)
    }

    /// Returns the resource registered under `path`, without loading it.
    pub fn get_resource(&self, path: &str) -> Option<ResourceHandle> {
        self.shared
            .lock()
            .resources
            .get(path)
            .map(|entry| entry.handle.clone())
    }

    /// Returns `true` if `path` is registered.
    pub fn is_resource_loaded(&self, path: &str) -> bool {
        self.shared.lock().resources.contains_key(path)
    }

    /// Asks the loader for `resource_type` whether `path` exists.
    ///
    /// Returns `false` when no loader is registered for the type.
    pub fn resource_exists(&self, path: &str, resource_type: &ResourceType) -> bool {
        self.loader_for(resource_type)
            .is_some_and(|loader| loader.exists(path))
    }

    /// Asks the loader for `resource_type` for the size of `path` without loading it.
    pub fn resource_size_hint(&self, path: &str, resource_type: &ResourceType) -> Option<usize> {
        self.loader_for(resource_type)?.size_of(path)
    }

    fn loader_for(&self, resource_type: &ResourceType) -> Option<Arc<dyn ResourceLoader>> {
        self.shared.lock().loaders.get(resource_type).cloned()
    }

    /// Number of registered resources.
    pub fn loaded_resource_count(&self) -> usize {
        self.shared.lock().resources.len()
    }

    /// Sum of the sizes of the registered resources, as recorded when each was registered.
    pub fn total_memory_usage(&self) -> usize {
        self.shared.lock().total_memory
    }

    /// Number of asynchronous requests not yet picked up by the worker.
    pub fn pending_request_count(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Returns `true` while the worker is running and no shutdown was requested.
    pub fn is_running(&self) -> bool {
        let registry = self.shared.lock();
        registry.worker_alive && !registry.shutdown
    }

    /// The registry the manager reports its metrics to.
    pub fn metrics_registry(&self) -> &Arc<MetricsRegistry> {
        &self.metrics_registry
    }

    /// Stops the worker and releases everything.
    ///
    /// The request the worker is currently loading completes normally; every
    /// other queued request is failed with [`ResourceError::ShuttingDown`]
    /// before this returns. Then all resources are unloaded and the loaders
    /// are cleared. A synchronous load still running on another thread fails
    /// with [`ResourceError::ShuttingDown`] and its resource is released.
    /// Safe to call more than once.
    pub fn cleanup(&self) {
        let handle = {
            let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
            self.shared.lock().shutdown = true;
            self.shared.wake.notify_all();
            slot.take()
        };
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                log::warn!("Resource manager cleanup requested from its own worker thread");
            } else if handle.join().is_err() {
                log::error!("Resource worker thread panicked");
            }
        }

        self.shared.drain_pending();
        let detached = self.shared.teardown();
        let count = detached.len();
        for (entry, loader) in detached {
            shared::release(entry, loader);
        }
        log::info!("Resource manager cleaned up ({} resources unloaded)", count);
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}
