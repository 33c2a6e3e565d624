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

use tackle_core::telemetry::{Metric, MetricId, MetricType, MetricValue, MetricsError, MetricsResult};
use std::fmt::Debug;

/// Trait defining the interface for metrics storage backends
pub trait MetricsBackend: Send + Sync + Debug + 'static {
    /// Store or replace a metric
    fn put_metric(&self, metric: Metric) -> MetricsResult<()>;

    /// Retrieve a copy of a metric by ID
    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric>;

    /// Apply `update` to a stored metric while holding the storage lock
    fn update_metric(
        &self,
        id: &MetricId,
        update: &mut dyn FnMut(&mut Metric) -> MetricsResult<()>,
    ) -> MetricsResult<()>;

    /// Check if a metric exists
    fn contains_metric(&self, id: &MetricId) -> bool;

    /// Get all metrics (potentially expensive operation)
    fn list_all_metrics(&self) -> Vec<Metric>;

    /// Get the number of metrics stored
    fn metric_count(&self) -> usize;

    // Convenience methods for common operations

    /// Increment a counter by the given amount, returning the new value
    fn increment_counter(&self, id: &MetricId, delta: u64) -> MetricsResult<u64> {
        let mut result = 0;
        self.update_metric(id, &mut |metric| match metric.value {
            MetricValue::Counter(ref mut value) => {
                *value = value.saturating_add(delta);
                result = *value;
                metric.metadata.touch();
                Ok(())
            }
            ref other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: other.metric_type(),
            }),
        })?;
        Ok(result)
    }

    /// Set a gauge value
    fn set_gauge(&self, id: &MetricId, value: f64) -> MetricsResult<()> {
        self.update_metric(id, &mut |metric| match metric.value {
            MetricValue::Gauge(ref mut gauge) => {
                *gauge = value;
                metric.metadata.touch();
                Ok(())
            }
            ref other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: other.metric_type(),
            }),
        })
    }

    /// Add a sample to a histogram
    fn record_histogram_sample(&self, id: &MetricId, sample: f64) -> MetricsResult<()> {
        self.update_metric(id, &mut |metric| match metric.value {
            MetricValue::Histogram(ref mut histogram) => {
                histogram.record(sample);
                metric.metadata.touch();
                Ok(())
            }
            ref other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Histogram,
                found: other.metric_type(),
            }),
        })
    }
}
