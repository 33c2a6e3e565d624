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

//! Provides the foundational traits and primitive types for Tackle's resource system.
//!
//! This module defines the "common language" for every resource-related operation.
//! It contains the contracts that asset-specific modules implement (textures, sounds,
//! shaders...) and that the manager and the cache consume, but it knows nothing about
//! how resources are decoded or where they are stored.
//!
//! The key components are:
//! - The [`Resource`] trait: a live, self-describing asset with a memory footprint.
//! - The [`ResourceLoader`] trait: the factory that turns a path into a [`Resource`].
//! - [`ResourceHandle`]: the shared, reference-counted pointer handed to callers.
//! - [`ResourceError`]: the typed failure returned by every loading operation.

mod error;
mod handle;
mod loader;
mod types;

pub use error::*;
pub use handle::*;
pub use loader::*;
pub use types::*;

use std::any::Any;
use std::fmt::Debug;

/// The error type reported by resource and loader implementations.
///
/// The manager carries it back to the caller inside a [`ResourceError`].
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// A live asset managed by the resource system.
///
/// Implementors embed a [`ResourceInfo`] for identity and status, and provide the
/// asset-specific `load`/`unload` logic. The manager drives the status transitions
/// around these calls, so implementations never need to touch the status themselves.
///
/// The supertraits enforce the guarantees the subsystem relies on:
/// - `Send` + `Sync`: resources are created on the worker thread and shared
///   between the manager, the cache and any caller.
/// - `Debug`: handles are printable in logs and test failures.
///
/// # Examples
///
/// ```
/// use std::any::Any;
/// use tackle_core::resource::{BoxedError, Resource, ResourceInfo, ResourceType};
///
/// #[derive(Debug)]
/// struct Script {
///     info: ResourceInfo,
///     source: String,
/// }
///
/// impl Resource for Script {
///     fn info(&self) -> &ResourceInfo {
///         &self.info
///     }
///     fn load(&mut self) -> Result<(), BoxedError> {
///         self.source = "print('hello')".to_string();
///         Ok(())
///     }
///     fn unload(&self) {}
///     fn size(&self) -> usize {
///         self.source.len()
///     }
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let mut script = Script {
///     info: ResourceInfo::new("hello", "scripts/hello.lua", ResourceType::new("script")),
///     source: String::new(),
/// };
/// script.load().unwrap();
/// assert_eq!(script.size(), 14);
/// assert_eq!(script.path(), "scripts/hello.lua");
/// ```
pub trait Resource: Any + Send + Sync + Debug {
    /// Returns the identity and status block of this resource.
    fn info(&self) -> &ResourceInfo;

    /// Brings the resource into memory.
    ///
    /// Called exactly once by the manager, before the resource is shared.
    fn load(&mut self) -> Result<(), BoxedError>;

    /// Releases whatever `load` acquired.
    ///
    /// Called by the manager when the resource leaves its registry. Other holders
    /// of the handle may still observe the resource afterwards, so implementations
    /// use interior mutability.
    fn unload(&self);

    /// Returns the memory footprint of the resource in bytes.
    fn size(&self) -> usize;

    /// Allows downcasting to the concrete resource type.
    fn as_any(&self) -> &dyn Any;

    /// Returns the human-readable name of the resource.
    fn name(&self) -> &str {
        self.info().name()
    }

    /// Returns the path identifying the resource.
    fn path(&self) -> &str {
        self.info().path()
    }

    /// Returns the type tag of the resource.
    fn resource_type(&self) -> &ResourceType {
        self.info().resource_type()
    }

    /// Returns the current lifecycle status of the resource.
    fn status(&self) -> ResourceStatus {
        self.info().status()
    }
}
