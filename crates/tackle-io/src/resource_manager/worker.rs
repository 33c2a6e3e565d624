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

//! The background loading thread.

use super::shared::Shared;
use super::LoadResult;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError};
use tackle_core::resource::{ResourceError, ResourceType};

/// Completion callback of an asynchronous load. Always invoked on the worker
/// thread, or on the thread that shuts the manager down.
pub(crate) type LoadCallback = Box<dyn FnOnce(LoadResult) + Send + 'static>;

/// A queued asynchronous load.
pub(crate) struct LoadRequest {
    pub(crate) path: String,
    pub(crate) resource_type: ResourceType,
    pub(crate) callback: LoadCallback,
}

impl LoadRequest {
    /// Completes the request with [`ResourceError::ShuttingDown`].
    pub(crate) fn reject(self) {
        log::debug!("Dropping queued load of '{}': shutting down", self.path);
        (self.callback)(Err(ResourceError::ShuttingDown { path: self.path }));
    }
}

impl fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("path", &self.path)
            .field("resource_type", &self.resource_type)
            .finish_non_exhaustive()
    }
}

/// Marks the worker as gone and fails what is left in the queue, even if the
/// worker unwinds.
struct ExitGuard<'a>(&'a Shared);

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().worker_alive = false;
        self.0.wake.notify_all();
        self.0.drain_pending();
    }
}

/// Worker loop: waits for requests, then processes each batch in FIFO order.
pub(crate) fn run(shared: Arc<Shared>) {
    log::info!("Resource worker thread started.");
    let _exit = ExitGuard(&shared);

    loop {
        let batch = {
            let registry = shared.lock();
            let mut registry = shared
                .wake
                .wait_while(registry, |r| !r.shutdown && r.pending.is_empty())
                .unwrap_or_else(PoisonError::into_inner);
            if registry.shutdown {
                break;
            }
            std::mem::take(&mut registry.pending)
        };

        log::trace!("Resource worker picked up {} requests", batch.len());
        for request in batch {
            if shared.lock().shutdown {
                request.reject();
                continue;
            }
            serve(&shared, request);
        }
    }

    log::info!("Resource worker thread stopped.");
}

/// Loads one request and hands the result to its callback.
///
/// A panic in the loader completes the request with
/// [`ResourceError::Interrupted`]; a panic in either the loader or the callback
/// stays confined to that request and the worker moves on.
fn serve(shared: &Shared, request: LoadRequest) {
    let LoadRequest {
        path,
        resource_type,
        callback,
    } = request;

    let result = panic::catch_unwind(AssertUnwindSafe(|| shared.load(&path, &resource_type)))
        .unwrap_or_else(|_| {
            log::error!("Loader panicked while loading '{}'", path);
            Err(ResourceError::Interrupted { path: path.clone() })
        });

    if panic::catch_unwind(AssertUnwindSafe(move || callback(result))).is_err() {
        log::error!("Completion callback for '{}' panicked", path);
    }
}
