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

//! State shared between the manager handle and its worker thread.

use super::flight::{FlightGuard, InFlight};
use super::metrics::ManagerMetrics;
use super::worker::LoadRequest;
use super::LoadResult;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tackle_core::resource::{
    Resource, ResourceError, ResourceHandle, ResourceLoader, ResourceStatus, ResourceType,
};

/// A registered resource with the size it was accounted for at insertion.
#[derive(Debug)]
pub(crate) struct RegisteredResource {
    pub(crate) handle: ResourceHandle,
    pub(crate) size: usize,
}

/// A resource removed from the registry, with the loader that owns its type.
pub(crate) type Detached = (RegisteredResource, Option<Arc<dyn ResourceLoader>>);

/// Everything guarded by the manager lock.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) loaders: HashMap<ResourceType, Arc<dyn ResourceLoader>>,
    pub(crate) resources: HashMap<String, RegisteredResource>,
    pub(crate) in_flight: HashMap<String, Arc<InFlight>>,
    pub(crate) pending: Vec<LoadRequest>,
    pub(crate) total_memory: usize,
    /// Bumped by every teardown. Loads started under an older value are not registered.
    pub(crate) generation: u64,
    pub(crate) shutdown: bool,
    pub(crate) worker_alive: bool,
}

pub(crate) struct Shared {
    registry: Mutex<Registry>,
    /// Signalled when requests are queued, on shutdown, and when the worker exits.
    pub(crate) wake: Condvar,
    pub(crate) metrics: ManagerMetrics,
}

impl Shared {
    pub(crate) fn new(metrics: ManagerMetrics) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            wake: Condvar::new(),
            metrics,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the registered resource for `path`, loading it if needed.
    ///
    /// Concurrent calls for a path that is already loading wait for that load
    /// instead of invoking the loader again.
    pub(crate) fn load(&self, path: &str, resource_type: &ResourceType) -> LoadResult {
        let (loader, flight, generation) = {
            let mut registry = self.lock();
            if let Some(entry) = registry.resources.get(path) {
                return Ok(entry.handle.clone());
            }
            let existing = registry.in_flight.get(path).cloned();
            if let Some(flight) = existing {
                drop(registry);
                log::trace!("Waiting for in-flight load of '{}'", path);
                return flight.wait();
            }
            let loader = registry.loaders.get(resource_type).cloned().ok_or_else(|| {
                ResourceError::NoLoader {
                    resource_type: resource_type.clone(),
                }
            })?;
            let flight = Arc::new(InFlight::new(path));
            registry
                .in_flight
                .insert(path.to_owned(), Arc::clone(&flight));
            (loader, flight, registry.generation)
        };

        let guard = FlightGuard::new(self, flight);
        let result = self.run_loader(loader.as_ref(), path, resource_type);
        guard.finish(result, &loader, generation)
    }

    fn run_loader(
        &self,
        loader: &dyn ResourceLoader,
        path: &str,
        resource_type: &ResourceType,
    ) -> LoadResult {
        let _timer = self.metrics.load_timer();

        let mut resource = loader.load(path, resource_type).map_err(|source| {
            ResourceError::LoaderFailed {
                path: path.to_owned(),
                source: Arc::from(source),
            }
        })?;

        resource.info().set_status(ResourceStatus::Loading);
        match resource.load() {
            Ok(()) => {
                resource.info().set_status(ResourceStatus::Loaded);
                Ok(ResourceHandle::from_boxed(resource))
            }
            Err(source) => {
                resource.info().set_status(ResourceStatus::Failed);
                Err(ResourceError::LoadFailed {
                    path: path.to_owned(),
                    source: Arc::from(source),
                })
            }
        }
    }

    /// Publishes the outcome of a load started under `generation`.
    ///
    /// If the manager was torn down while the load ran, the resource is released
    /// instead of registered and the load fails with [`ResourceError::ShuttingDown`].
    pub(crate) fn commit(
        &self,
        path: &str,
        result: LoadResult,
        loader: &Arc<dyn ResourceLoader>,
        generation: u64,
    ) -> LoadResult {
        let mut registry = self.lock();
        registry.in_flight.remove(path);

        match result {
            Ok(handle) if registry.generation != generation => {
                drop(registry);
                log::debug!("Discarding '{}': manager was cleaned up while it loaded", path);
                let size = handle.size();
                release(RegisteredResource { handle, size }, Some(Arc::clone(loader)));
                self.metrics.record_outcome(false);
                Err(ResourceError::ShuttingDown {
                    path: path.to_owned(),
                })
            }
            Ok(handle) => {
                let size = handle.size();
                let previous = registry.resources.insert(
                    path.to_owned(),
                    RegisteredResource {
                        handle: handle.clone(),
                        size,
                    },
                );
                if let Some(previous) = previous {
                    registry.total_memory -= previous.size;
                }
                registry.total_memory += size;
                self.metrics
                    .record_residency(registry.total_memory, registry.resources.len());
                drop(registry);

                self.metrics.record_outcome(true);
                log::debug!("Loaded resource '{}' ({} bytes)", path, size);
                Ok(handle)
            }
            Err(e) => {
                drop(registry);
                self.metrics.record_outcome(false);
                log::warn!("Failed to load resource '{}': {}", path, e);
                Err(e)
            }
        }
    }

    /// Drops the in-flight marker of a load that never finished.
    pub(crate) fn abandon(&self, path: &str) {
        self.lock().in_flight.remove(path);
    }

    /// Removes `path` from the registry, returning it with the loader that owns its type.
    pub(crate) fn detach(&self, path: &str) -> Option<Detached> {
        let mut registry = self.lock();
        let entry = registry.resources.remove(path)?;
        registry.total_memory -= entry.size;
        self.metrics
            .record_residency(registry.total_memory, registry.resources.len());
        let loader = registry.loaders.get(entry.handle.resource_type()).cloned();
        Some((entry, loader))
    }

    /// Removes every registered resource, returning each with its loader.
    pub(crate) fn detach_all(&self) -> Vec<Detached> {
        let mut registry = self.lock();
        self.take_resources(&mut registry)
    }

    /// Detaches every resource and forgets the loaders in one step.
    ///
    /// Loads still running when this happens are released on completion rather
    /// than registered.
    pub(crate) fn teardown(&self) -> Vec<Detached> {
        let mut registry = self.lock();
        registry.generation += 1;
        let detached = self.take_resources(&mut registry);
        registry.loaders.clear();
        detached
    }

    fn take_resources(&self, registry: &mut Registry) -> Vec<Detached> {
        let resources = std::mem::take(&mut registry.resources);
        registry.total_memory = 0;
        self.metrics.record_residency(0, 0);
        resources
            .into_values()
            .map(|entry| {
                let loader = registry.loaders.get(entry.handle.resource_type()).cloned();
                (entry, loader)
            })
            .collect()
    }

    /// Fails every queued request with [`ResourceError::ShuttingDown`].
    ///
    /// Callbacks run on the calling thread, outside the lock.
    pub(crate) fn drain_pending(&self) -> usize {
        let pending = std::mem::take(&mut self.lock().pending);
        let drained = pending.len();
        if drained > 0 {
            log::info!("Failing {} queued resource requests on shutdown", drained);
        }
        for request in pending {
            request.reject();
        }
        drained
    }
}

/// Runs the resource's own release logic, then the loader hook.
pub(crate) fn release(entry: RegisteredResource, loader: Option<Arc<dyn ResourceLoader>>) {
    let resource: &dyn Resource = &*entry.handle;
    resource.unload();
    resource.info().set_status(ResourceStatus::Unloaded);
    if let Some(loader) = loader {
        loader.unload(resource);
    }
    log::debug!("Unloaded resource '{}' ({} bytes)", resource.path(), entry.size);
}
