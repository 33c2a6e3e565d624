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

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU8, Ordering};

/// An open, string-based tag identifying a family of resources (e.g. `"texture"`).
///
/// The resource system does not ship a catalog of types: games declare their own,
/// usually as constants, and register one [`ResourceLoader`](super::ResourceLoader)
/// per tag.
///
/// ```
/// use tackle_core::resource::ResourceType;
///
/// const TEXTURE: ResourceType = ResourceType::new("texture");
/// assert_eq!(TEXTURE, ResourceType::from_name("texture"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(Cow<'static, str>);

impl ResourceType {
    /// Creates a type tag from a static name. Usable in `const` contexts.
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a type tag from a runtime name (e.g. read from a config file).
    pub fn from_name(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The lifecycle status of a [`Resource`](super::Resource).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceStatus {
    /// Created by a loader but not loaded yet, or explicitly unloaded.
    #[default]
    Unloaded = 0,
    /// `load()` is currently running.
    Loading = 1,
    /// `load()` succeeded; the resource is usable.
    Loaded = 2,
    /// `load()` reported a failure.
    Failed = 3,
}

impl ResourceStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ResourceStatus::Loading,
            2 => ResourceStatus::Loaded,
            3 => ResourceStatus::Failed,
            _ => ResourceStatus::Unloaded,
        }
    }
}

/// Identity and status block embedded by every [`Resource`](super::Resource).
///
/// The status lives in an atomic so it can be updated through a shared handle
/// (e.g. when the manager unloads a resource other holders still reference).
#[derive(Debug)]
pub struct ResourceInfo {
    name: String,
    path: String,
    resource_type: ResourceType,
    status: AtomicU8,
}

impl ResourceInfo {
    /// Creates an identity block in the [`ResourceStatus::Unloaded`] state.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        resource_type: ResourceType,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            resource_type,
            status: AtomicU8::new(ResourceStatus::Unloaded as u8),
        }
    }

    /// The human-readable name of the resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path identifying the resource.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The type tag of the resource.
    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    /// The current lifecycle status.
    pub fn status(&self) -> ResourceStatus {
        ResourceStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Updates the lifecycle status.
    ///
    /// The resource manager calls this around `load`/`unload`.
    pub fn set_status(&self, status: ResourceStatus) {
        self.status.store(status as u8, Ordering::Release);
    }
}
