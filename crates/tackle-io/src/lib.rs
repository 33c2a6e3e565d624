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

//! # Tackle IO
//!
//! The resource manager: it maps `(path, type)` requests to live resources
//! through registered [`ResourceLoader`](tackle_core::ResourceLoader)s, keeps
//! the path registry and its memory accounting, and runs a background worker
//! for asynchronous loads.

#![warn(missing_docs)]

pub mod config;
pub mod resource_manager;

pub use config::{PreloadEntry, ResourceManagerConfig, ResourceSystemConfig};
pub use resource_manager::{LoadResult, PreloadSummary, ResourceManager};
