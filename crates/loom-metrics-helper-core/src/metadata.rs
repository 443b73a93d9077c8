// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-user persisted scratch state for counters and timestamps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default namespace prefixed to every accumulator key.
pub const DEFAULT_METADATA_NAMESPACE: &str = "metrics_helper";

/// Recipes that keep state between events. Each gets its own key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccumulatorKind {
	SessionsUntilState,
	TimeBetweenStates,
}

impl AccumulatorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			AccumulatorKind::SessionsUntilState => "sessions_until_state",
			AccumulatorKind::TimeBetweenStates => "time_between_states",
		}
	}
}

/// Builds the private key for a metric: `<namespace>.<kind>.<label>`.
pub fn metadata_key(namespace: &str, kind: AccumulatorKind, label: &str) -> String {
	format!("{namespace}.{}.{label}", kind.as_str())
}

/// The user's metadata map. Owned and persisted by the host; absent keys read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserMetadata(BTreeMap<String, i64>);

impl UserMetadata {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<i64> {
		self.0.get(key).copied()
	}

	pub fn set(&mut self, key: impl Into<String>, value: i64) {
		self.0.insert(key.into(), value);
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	/// Adds one to the counter at `key`.
	pub fn increment(&mut self, key: &str) {
		let next = self.get(key).unwrap_or(0) + 1;
		self.set(key, next);
	}

	/// Returns the value at `key` and stores 0 in its place.
	pub fn reset_and_get(&mut self, key: &str) -> i64 {
		let previous = self.get(key).unwrap_or(0);
		self.set(key, 0);
		previous
	}

	/// Overwrites `key` with a timestamp (or any value).
	pub fn set_timestamp(&mut self, key: &str, value: i64) {
		self.set(key, value);
	}
}

impl FromIterator<(String, i64)> for UserMetadata {
	fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}
