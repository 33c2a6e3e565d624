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

use serde::Deserialize;

/// Default cache budget: 100 MiB.
pub const DEFAULT_CACHE_SIZE_LIMIT: usize = 100 * 1024 * 1024;

/// Default eviction target, as a percentage of the budget.
pub const DEFAULT_EVICTION_TARGET_PERCENT: u8 = 80;

/// Configuration of a [`ResourceCache`](super::ResourceCache).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of bytes the cache may hold.
    pub size_limit_bytes: usize,
    /// Once eviction starts, entries are removed until the cache holds at most
    /// this percentage of `size_limit_bytes`.
    pub eviction_target_percent: u8,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size_limit_bytes: DEFAULT_CACHE_SIZE_LIMIT,
            eviction_target_percent: DEFAULT_EVICTION_TARGET_PERCENT,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with the given budget and the default eviction target.
    pub fn with_limit(size_limit_bytes: usize) -> Self {
        Self {
            size_limit_bytes,
            ..Self::default()
        }
    }

    /// Returns the eviction target percentage, clamped to 100.
    pub(crate) fn effective_target_percent(&self) -> u8 {
        if self.eviction_target_percent > 100 {
            log::warn!(
                "Cache eviction target of {}% is above 100%, clamping",
                self.eviction_target_percent
            );
            100
        } else {
            self.eviction_target_percent
        }
    }
}
