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

use super::{BoxedError, Resource, ResourceType};

/// A factory that turns a path into a [`Resource`] of a given type.
///
/// This is the extension point of the resource system: the manager holds exactly
/// one loader per [`ResourceType`] and never inspects file contents itself.
/// Loaders are shared with the background worker, hence `Send + Sync`.
pub trait ResourceLoader: Send + Sync {
    /// Creates the resource for `path`.
    ///
    /// The returned resource is still [`Unloaded`](super::ResourceStatus::Unloaded);
    /// the manager calls [`Resource::load`] on it afterwards.
    fn load(
        &self,
        path: &str,
        resource_type: &ResourceType,
    ) -> Result<Box<dyn Resource>, BoxedError>;

    /// Hook invoked after a resource produced by this loader has been unloaded
    /// and removed from the manager.
    fn unload(&self, _resource: &dyn Resource) {}

    /// Returns `true` if `path` can be served by this loader.
    fn exists(&self, path: &str) -> bool;

    /// Returns the expected size of `path` in bytes, if it can be known without loading it.
    fn size_of(&self, _path: &str) -> Option<usize> {
        None
    }
}
