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

use tackle_core::telemetry::MetricsError;
use tackle_telemetry::{CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry, ScopedMetricTimer};

const NAMESPACE: &str = "resources";

/// Metric handles updated by the resource manager.
///
/// Update failures are logged and never fail the operation being measured.
#[derive(Debug)]
pub(crate) struct ManagerMetrics {
    loads_total: CounterHandle,
    load_failures_total: CounterHandle,
    load_time_ms: HistogramHandle,
    memory_usage_bytes: GaugeHandle,
    resident_count: GaugeHandle,
}

impl ManagerMetrics {
    pub(crate) fn register(registry: &MetricsRegistry) -> Result<Self, MetricsError> {
        Ok(Self {
            loads_total: registry.register_counter(
                NAMESPACE,
                "loads_total",
                "Total number of resources loaded",
            )?,
            load_failures_total: registry.register_counter(
                NAMESPACE,
                "load_failures_total",
                "Total number of failed resource loads",
            )?,
            load_time_ms: registry.register_histogram(
                NAMESPACE,
                "load_time",
                "Time spent in loaders and resource load()",
                "ms",
                vec![1.0, 5.0, 16.0, 33.0, 100.0, 500.0],
            )?,
            memory_usage_bytes: registry.register_gauge(
                NAMESPACE,
                "memory_usage",
                "Bytes held by registered resources",
                "bytes",
            )?,
            resident_count: registry.register_gauge(
                NAMESPACE,
                "resident_count",
                "Number of registered resources",
                "count",
            )?,
        })
    }

    /// Starts timing a load; the sample is recorded when the timer is dropped.
    pub(crate) fn load_timer(&self) -> ScopedMetricTimer<'_> {
        ScopedMetricTimer::new(&self.load_time_ms)
    }

    pub(crate) fn record_outcome(&self, success: bool) {
        let counter = if success {
            &self.loads_total
        } else {
            &self.load_failures_total
        };
        if let Err(e) = counter.increment() {
            log::warn!("Failed to update {}: {}", counter.id(), e);
        }
    }

    pub(crate) fn record_residency(&self, memory_bytes: usize, count: usize) {
        if let Err(e) = self.memory_usage_bytes.set(memory_bytes as f64) {
            log::warn!("Failed to update {}: {}", self.memory_usage_bytes.id(), e);
        }
        if let Err(e) = self.resident_count.set(count as f64) {
            log::warn!("Failed to update {}: {}", self.resident_count.id(), e);
        }
    }
}
