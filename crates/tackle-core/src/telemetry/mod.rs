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

//! Shared vocabulary for the metrics reported by the resource system.
//!
//! The types here describe *what* a metric is. Storage and registration live in
//! `tackle-telemetry`, and the resource manager is the main producer.

pub mod metrics;

pub use self::metrics::{
    HistogramSummary, Metric, MetricId, MetricMetadata, MetricType, MetricValue, MetricsError,
    MetricsResult,
};
