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

//! Registry for managing metrics.

use crate::storage::{backend::MetricsBackend, memory_backend::InMemoryBackend};
use std::sync::Arc;
use tackle_core::telemetry::{Metric, MetricId, MetricType, MetricsError, MetricsResult};

/// Central registry for the metrics of the resource system
///
/// Registration hands back a typed handle bound to the metric ID; producers
/// keep the handle and update through it.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    backend: Arc<dyn MetricsBackend>,
}

impl MetricsRegistry {
    /// Create a new metrics registry with the default in-memory backend
    pub fn new() -> Self {
        Self {
            backend: Arc::new(InMemoryBackend::new()),
        }
    }

    /// Create a new metrics registry with a custom backend
    pub fn with_backend(backend: Arc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }

    /// Register a new counter metric
    pub fn register_counter(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> MetricsResult<CounterHandle> {
        let id = MetricId::new(namespace, name);
        self.backend
            .put_metric(Metric::new_counter(id.clone(), description))?;
        Ok(CounterHandle::new(id, self.backend.clone()))
    }

    /// Register a new gauge metric
    pub fn register_gauge(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> MetricsResult<GaugeHandle> {
        let id = MetricId::new(namespace, name);
        self.backend
            .put_metric(Metric::new_gauge(id.clone(), description, unit, 0.0))?;
        Ok(GaugeHandle::new(id, self.backend.clone()))
    }

    /// Register a new histogram metric
    pub fn register_histogram(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        buckets: Vec<f64>,
    ) -> MetricsResult<HistogramHandle> {
        let id = MetricId::new(namespace, name);
        self.backend
            .put_metric(Metric::new_histogram(id.clone(), description, unit, buckets))?;
        Ok(HistogramHandle::new(id, self.backend.clone()))
    }

    /// Get a metric by ID
    pub fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        self.backend.get_metric(id)
    }

    /// Check if a metric exists
    pub fn contains_metric(&self, id: &MetricId) -> bool {
        self.backend.contains_metric(id)
    }

    /// Get all metrics in a namespace, sorted by ID
    pub fn namespace_metrics(&self, namespace: &str) -> Vec<Metric> {
        let mut metrics = self
            .backend
            .list_all_metrics()
            .into_iter()
            .filter(|m| m.metadata.id.namespace == namespace)
            .collect::<Vec<_>>();
        metrics.sort_by(|a, b| a.metadata.id.cmp(&b.metadata.id));
        metrics
    }

    /// Get the total number of metrics
    pub fn metric_count(&self) -> usize {
        self.backend.metric_count()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for counter operations
#[derive(Debug, Clone)]
pub struct CounterHandle {
    id: MetricId,
    backend: Arc<dyn MetricsBackend>,
}

impl CounterHandle {
    fn new(id: MetricId, backend: Arc<dyn MetricsBackend>) -> Self {
        Self { id, backend }
    }

    /// Increment the counter by 1
    pub fn increment(&self) -> MetricsResult<u64> {
        self.backend.increment_counter(&self.id, 1)
    }

    /// Increment the counter by a specific amount
    pub fn increment_by(&self, amount: u64) -> MetricsResult<u64> {
        self.backend.increment_counter(&self.id, amount)
    }

    /// Get the current counter value
    pub fn get(&self) -> MetricsResult<u64> {
        let metric = self.backend.get_metric(&self.id)?;
        metric
            .value
            .as_counter()
            .ok_or_else(|| MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: metric.value.metric_type(),
            })
    }

    /// Get the metric ID
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle for gauge operations
#[derive(Debug, Clone)]
pub struct GaugeHandle {
    id: MetricId,
    backend: Arc<dyn MetricsBackend>,
}

impl GaugeHandle {
    fn new(id: MetricId, backend: Arc<dyn MetricsBackend>) -> Self {
        Self { id, backend }
    }

    /// Set the gauge to a specific value
    pub fn set(&self, value: f64) -> MetricsResult<()> {
        self.backend.set_gauge(&self.id, value)
    }

    /// Get the current gauge value
    pub fn get(&self) -> MetricsResult<f64> {
        let metric = self.backend.get_metric(&self.id)?;
        metric
            .value
            .as_gauge()
            .ok_or_else(|| MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: metric.value.metric_type(),
            })
    }

    /// Get the metric ID
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle for histogram operations
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    id: MetricId,
    backend: Arc<dyn MetricsBackend>,
}

impl HistogramHandle {
    fn new(id: MetricId, backend: Arc<dyn MetricsBackend>) -> Self {
        Self { id, backend }
    }

    /// Record a sample in the histogram
    pub fn observe(&self, value: f64) -> MetricsResult<()> {
        self.backend.record_histogram_sample(&self.id, value)
    }

    /// Get the metric ID
    pub fn id(&self) -> &MetricId {
        &self.id
    }

    /// Get the full histogram metric
    pub fn get_metric(&self) -> MetricsResult<Metric> {
        self.backend.get_metric(&self.id)
    }
}
