// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The metric sink the host aggregates and stores values with.

use async_trait::async_trait;
use futures::future::try_join_all;
use loom_metrics_helper_core::{MetricObservation, ObservationKind, Result};
use tracing::trace;

#[async_trait]
pub trait MetricSink: Send + Sync {
	/// Adds `amount` to the running total under `label`.
	async fn inc(&self, label: &str, amount: f64) -> Result<()>;

	/// Adds `amount` to the per-interval sum under `label`.
	async fn sum(&self, label: &str, amount: f64) -> Result<()>;

	/// Records `value` into the average under `label`.
	async fn avg(&self, label: &str, value: f64) -> Result<()>;

	async fn fire(&self, observation: &MetricObservation) -> Result<()> {
		match observation.kind {
			ObservationKind::Increment => self.inc(&observation.label, observation.value).await,
			ObservationKind::Sum => self.sum(&observation.label, observation.value).await,
			ObservationKind::Average => self.avg(&observation.label, observation.value).await,
		}
	}
}

/// Issues every observation at once and waits for all of them.
///
/// Fails with the first sink error; the remaining emissions are dropped.
pub async fn fire_all(sink: &dyn MetricSink, observations: &[MetricObservation]) -> Result<()> {
	for observation in observations {
		trace!(
			label = %observation.label,
			kind = %observation.kind,
			value = observation.value,
			"emitting metric"
		);
	}

	try_join_all(observations.iter().map(|o| sink.fire(o))).await?;
	Ok(())
}
