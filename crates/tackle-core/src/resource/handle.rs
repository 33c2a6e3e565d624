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

use super::Resource;
use std::{ops::Deref, sync::Arc};

/// A thread-safe, reference-counted handle to a loaded resource.
///
/// The manager's registry, the cache and any number of callers can hold a handle
/// to the same resource at once. Cloning only bumps the reference count; the
/// resource itself is dropped when the last handle goes away.
#[derive(Debug, Clone)]
pub struct ResourceHandle(Arc<dyn Resource>);

impl ResourceHandle {
    /// Wraps a resource into a new handle.
    pub fn new(resource: impl Resource) -> Self {
        Self(Arc::new(resource))
    }

    /// Wraps a resource produced by a [`ResourceLoader`](super::ResourceLoader).
    pub fn from_boxed(resource: Box<dyn Resource>) -> Self {
        Self(Arc::from(resource))
    }

    /// Returns `true` if both handles point at the same resource instance.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&this.0), Arc::as_ptr(&other.0))
    }

    /// Returns the number of handles currently sharing this resource.
    pub fn strong_count(this: &Self) -> usize {
        Arc::strong_count(&this.0)
    }

    /// Attempts to view the resource as its concrete type `T`.
    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl Deref for ResourceHandle {
    type Target = dyn Resource;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
