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

use std::fmt;

/// A snapshot of the cache's counters and occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found their key.
    pub hits: u64,
    /// Lookups that did not find their key.
    pub misses: u64,
    /// Entries removed by the eviction policy.
    pub evictions: u64,
    /// Insertions refused because the entry could not fit.
    pub refusals: u64,
    /// Bytes currently held.
    pub current_size: usize,
    /// Configured budget in bytes.
    pub size_limit: usize,
    /// Number of entries currently held.
    pub entry_count: usize,
}

impl CacheStats {
    /// Ratio of hits over all lookups, between 0 and 1.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }

    fn format_bytes(bytes: usize) -> String {
        const KB: usize = 1024;
        const MB: usize = KB * 1024;
        const GB: usize = MB * 1024;

        if bytes >= GB {
            format!("{:.2} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.2} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.2} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entries: {}, memory: {}/{}, hits: {}, misses: {}, hit rate: {:.1}%, evictions: {}, refusals: {}",
            self.entry_count,
            Self::format_bytes(self.current_size),
            Self::format_bytes(self.size_limit),
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.evictions,
            self.refusals,
        )
    }
}
