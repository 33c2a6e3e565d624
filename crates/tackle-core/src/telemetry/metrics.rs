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

//! Abstract definitions for metrics.

use std::fmt::{self, Display};
use std::time::Instant;
use thiserror::Error;

/// A unique identifier for a metric, made of a namespace and a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId {
    /// The broad category of the metric (e.g., "resources").
    pub namespace: String,
    /// The specific name of the metric (e.g., "loads_total").
    pub name: String,
}

impl MetricId {
    /// Creates a new `MetricId` with a namespace and a name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// The fundamental type of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// A value that only ever increases (e.g., total loads).
    Counter,
    /// A value that can go up or down (e.g., current memory usage).
    Gauge,
    /// The distribution of a set of measurements.
    Histogram,
}

/// A bucketed summary of recorded samples.
///
/// `bucket_counts` has one more slot than `bucket_bounds`: the last slot counts
/// samples above the highest bound.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSummary {
    /// Number of samples recorded.
    pub count: u64,
    /// Sum of every sample recorded.
    pub sum: f64,
    /// Inclusive upper bounds of the buckets, ascending.
    pub bucket_bounds: Vec<f64>,
    /// Number of samples per bucket.
    pub bucket_counts: Vec<u64>,
}

impl HistogramSummary {
    /// Creates an empty summary over the given bucket bounds.
    pub fn new(mut bucket_bounds: Vec<f64>) -> Self {
        bucket_bounds.sort_by(f64::total_cmp);
        let bucket_counts = vec![0; bucket_bounds.len() + 1];
        Self {
            count: 0,
            sum: 0.0,
            bucket_bounds,
            bucket_counts,
        }
    }

    /// Records a single sample.
    pub fn record(&mut self, sample: f64) {
        let bucket = self
            .bucket_bounds
            .iter()
            .position(|bound| sample <= *bound)
            .unwrap_or(self.bucket_bounds.len());
        self.bucket_counts[bucket] += 1;
        self.count += 1;
        self.sum += sample;
    }

    /// Mean of the recorded samples, or `None` if nothing was recorded.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// The current value of a metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// A 64-bit unsigned integer for counters.
    Counter(u64),
    /// A 64-bit float for gauges.
    Gauge(f64),
    /// A bucketed distribution of samples.
    Histogram(HistogramSummary),
}

impl MetricValue {
    /// Returns the [`MetricType`] corresponding to this value.
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
            MetricValue::Histogram(_) => MetricType::Histogram,
        }
    }

    /// Returns the value as a `u64` if it is a `Counter`.
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            MetricValue::Counter(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is a `Gauge`.
    pub fn as_gauge(&self) -> Option<f64> {
        match self {
            MetricValue::Gauge(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the histogram summary if this is a `Histogram`.
    pub fn as_histogram(&self) -> Option<&HistogramSummary> {
        match self {
            MetricValue::Histogram(h) => Some(h),
            _ => None,
        }
    }
}

/// Descriptive, static metadata about a metric.
#[derive(Debug, Clone)]
pub struct MetricMetadata {
    /// The metric's unique identifier.
    pub id: MetricId,
    /// The type of the metric.
    pub metric_type: MetricType,
    /// A human-readable description of what the metric measures.
    pub description: String,
    /// The unit of measurement (e.g., "ms", "bytes").
    pub unit: String,
    /// When this metric was last updated.
    pub last_updated: Instant,
}

impl MetricMetadata {
    /// Creates new metadata for a metric.
    pub fn new(
        id: MetricId,
        metric_type: MetricType,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id,
            metric_type,
            description: description.into(),
            unit: unit.into(),
            last_updated: Instant::now(),
        }
    }

    /// Updates the `last_updated` timestamp to the current time.
    pub fn touch(&mut self) {
        self.last_updated = Instant::now();
    }
}

/// A complete metric entry, combining its value with its descriptive metadata.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The static, descriptive metadata for the metric.
    pub metadata: MetricMetadata,
    /// The current value of the metric.
    pub value: MetricValue,
}

impl Metric {
    /// Creates a new `Counter` metric starting at zero.
    pub fn new_counter(id: MetricId, description: impl Into<String>) -> Self {
        Self {
            metadata: MetricMetadata::new(id, MetricType::Counter, description, "count"),
            value: MetricValue::Counter(0),
        }
    }

    /// Creates a new `Gauge` metric.
    pub fn new_gauge(
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        initial_value: f64,
    ) -> Self {
        Self {
            metadata: MetricMetadata::new(id, MetricType::Gauge, description, unit),
            value: MetricValue::Gauge(initial_value),
        }
    }

    /// Creates a new, empty `Histogram` metric.
    pub fn new_histogram(
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        bucket_bounds: Vec<f64>,
    ) -> Self {
        Self {
            metadata: MetricMetadata::new(id, MetricType::Histogram, description, unit),
            value: MetricValue::Histogram(HistogramSummary::new(bucket_bounds)),
        }
    }
}

/// A specialized `Result` type for metric-related operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error that can occur within the metrics system.
#[derive(Debug, Clone, Error)]
pub enum MetricsError {
    /// The requested metric was not found in the registry.
    #[error("metric not found: {0}")]
    NotFound(MetricId),
    /// An operation was attempted on a metric of the wrong type.
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// The expected metric type for the operation.
        expected: MetricType,
        /// The actual metric type that was found.
        found: MetricType,
    },
    /// An error originating from the backend storage layer.
    #[error("storage error: {0}")]
    Storage(String),
}
