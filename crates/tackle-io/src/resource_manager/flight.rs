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

//! Coalescing of concurrent loads of the same path.

use super::shared::Shared;
use super::LoadResult;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use tackle_core::resource::{ResourceError, ResourceLoader};

/// A load of one path currently running on some thread.
///
/// Other requests for the same path block on it and receive a clone of its result.
#[derive(Debug)]
pub(crate) struct InFlight {
    path: String,
    slot: Mutex<Option<LoadResult>>,
    ready: Condvar,
}

impl InFlight {
    pub(crate) fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Blocks until the owning thread publishes the result.
    pub(crate) fn wait(&self) -> LoadResult {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = self
            .ready
            .wait_while(slot, |result| result.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        slot.clone().unwrap_or_else(|| {
            Err(ResourceError::Interrupted {
                path: self.path.clone(),
            })
        })
    }

    pub(crate) fn complete(&self, result: LoadResult) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(result);
        self.ready.notify_all();
    }
}

/// Ownership of an in-flight load.
///
/// Finishing commits the result to the registry and wakes the waiters. If the
/// owner unwinds before finishing, the marker is removed and the waiters get
/// [`ResourceError::Interrupted`].
pub(crate) struct FlightGuard<'a> {
    shared: &'a Shared,
    flight: Arc<InFlight>,
    finished: bool,
}

impl<'a> FlightGuard<'a> {
    pub(crate) fn new(shared: &'a Shared, flight: Arc<InFlight>) -> Self {
        Self {
            shared,
            flight,
            finished: false,
        }
    }

    /// Commits the result and hands the registered outcome to every waiter.
    pub(crate) fn finish(
        mut self,
        result: LoadResult,
        loader: &Arc<dyn ResourceLoader>,
        generation: u64,
    ) -> LoadResult {
        let result = self.shared.commit(&self.flight.path, result, loader, generation);
        self.flight.complete(result.clone());
        self.finished = true;
        result
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        log::warn!("Load of '{}' was interrupted", self.flight.path);
        self.shared.abandon(&self.flight.path);
        self.flight.complete(Err(ResourceError::Interrupted {
            path: self.flight.path.clone(),
        }));
    }
}
