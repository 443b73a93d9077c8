// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Values handed to the metric sink.

use serde::{Deserialize, Serialize};

/// How the sink should fold a value into the metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
	/// Add to a running total
	Increment,
	/// Add to a per-interval sum
	Sum,
	/// Average with other observations
	Average,
}

impl std::fmt::Display for ObservationKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ObservationKind::Increment => write!(f, "inc"),
			ObservationKind::Sum => write!(f, "sum"),
			ObservationKind::Average => write!(f, "avg"),
		}
	}
}

/// A single emission. Not retained once the sink accepts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricObservation {
	pub label: String,
	pub value: f64,
	pub kind: ObservationKind,
}

impl MetricObservation {
	pub fn new(label: impl Into<String>, value: f64, kind: ObservationKind) -> Self {
		Self {
			label: label.into(),
			value,
			kind,
		}
	}

	pub fn inc(label: impl Into<String>, amount: f64) -> Self {
		Self::new(label, amount, ObservationKind::Increment)
	}

	pub fn sum(label: impl Into<String>, amount: f64) -> Self {
		Self::new(label, amount, ObservationKind::Sum)
	}

	pub fn avg(label: impl Into<String>, value: f64) -> Self {
		Self::new(label, value, ObservationKind::Average)
	}
}
