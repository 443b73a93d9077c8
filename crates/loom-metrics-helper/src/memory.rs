// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process user and metric store implementations.
//!
//! These back the local event bus for single-process hosts, replays and tests.
//! The metric store renders series the way the hosted metrics store does:
//! `inc` keeps the running total (`last`), `sum` and `avg` keep raw values.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use loom_metrics_helper_core::{MetricObservation, MetricsHelperError, Result, UserMetadata};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::event::UserContext;
use crate::sink::MetricSink;

/// A user whose metadata lives in memory, with `save` recording a snapshot.
pub struct MemoryUser {
	id: String,
	metadata: Mutex<UserMetadata>,
	saved: Mutex<Option<UserMetadata>>,
	save_count: AtomicUsize,
	fail_saves: AtomicBool,
}

impl MemoryUser {
	pub fn new(id: impl Into<String>) -> Self {
		Self::with_metadata(id, UserMetadata::new())
	}

	/// A returning user whose metadata was loaded from a previous save.
	pub fn with_metadata(id: impl Into<String>, metadata: UserMetadata) -> Self {
		Self {
			id: id.into(),
			metadata: Mutex::new(metadata),
			saved: Mutex::new(None),
			save_count: AtomicUsize::new(0),
			fail_saves: AtomicBool::new(false),
		}
	}

	pub fn save_count(&self) -> usize {
		self.save_count.load(Ordering::SeqCst)
	}

	/// What a restart would load: the metadata as of the last successful save.
	pub async fn saved_snapshot(&self) -> Option<UserMetadata> {
		self.saved.lock().await.clone()
	}

	pub fn set_fail_saves(&self, fail: bool) {
		self.fail_saves.store(fail, Ordering::SeqCst);
	}
}

#[async_trait]
impl UserContext for MemoryUser {
	fn id(&self) -> &str {
		&self.id
	}

	fn metadata(&self) -> &Mutex<UserMetadata> {
		&self.metadata
	}

	async fn save(&self) -> Result<()> {
		if self.fail_saves.load(Ordering::SeqCst) {
			return Err(MetricsHelperError::Persistence(format!(
				"save failed for user {}",
				self.id
			)));
		}
		let snapshot = self.metadata.lock().await.clone();
		*self.saved.lock().await = Some(snapshot);
		self.save_count.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

/// Aggregation a stored series is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
	Last,
	Sum,
	Avg,
}

/// Every value recorded under one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
	pub agg: Aggregation,
	pub values: Vec<f64>,
}

impl MetricSeries {
	fn new(agg: Aggregation) -> Self {
		Self {
			agg,
			values: Vec::new(),
		}
	}
}

#[derive(Default)]
struct StoreState {
	series: BTreeMap<String, MetricSeries>,
	observations: Vec<MetricObservation>,
}

/// A metric sink that keeps everything it is given.
#[derive(Default)]
pub struct MemoryMetricStore {
	state: Mutex<StoreState>,
	fail_emits: AtomicBool,
}

impl MemoryMetricStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn series(&self, label: &str) -> Option<MetricSeries> {
		self.state.lock().await.series.get(label).cloned()
	}

	pub async fn labels(&self) -> Vec<String> {
		self.state.lock().await.series.keys().cloned().collect()
	}

	/// Observations in the order the sink received them.
	pub async fn observations(&self) -> Vec<MetricObservation> {
		self.state.lock().await.observations.clone()
	}

	pub async fn is_empty(&self) -> bool {
		self.state.lock().await.observations.is_empty()
	}

	pub fn set_fail_emits(&self, fail: bool) {
		self.fail_emits.store(fail, Ordering::SeqCst);
	}

	async fn record(&self, observation: MetricObservation, agg: Aggregation) -> Result<()> {
		if self.fail_emits.load(Ordering::SeqCst) {
			return Err(MetricsHelperError::Sink(format!(
				"emit failed for {}",
				observation.label
			)));
		}

		let mut state = self.state.lock().await;
		let series = state
			.series
			.entry(observation.label.clone())
			.or_insert_with(|| MetricSeries::new(agg));
		let value = match agg {
			Aggregation::Last => series.values.last().copied().unwrap_or(0.0) + observation.value,
			Aggregation::Sum | Aggregation::Avg => observation.value,
		};
		series.values.push(value);
		state.observations.push(observation);
		Ok(())
	}
}

#[async_trait]
impl MetricSink for MemoryMetricStore {
	async fn inc(&self, label: &str, amount: f64) -> Result<()> {
		self
			.record(MetricObservation::inc(label, amount), Aggregation::Last)
			.await
	}

	async fn sum(&self, label: &str, amount: f64) -> Result<()> {
		self
			.record(MetricObservation::sum(label, amount), Aggregation::Sum)
			.await
	}

	async fn avg(&self, label: &str, value: f64) -> Result<()> {
		self
			.record(MetricObservation::avg(label, value), Aggregation::Avg)
			.await
	}
}
