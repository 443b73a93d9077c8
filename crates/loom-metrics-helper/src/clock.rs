// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wall-clock sources for elapsed-time metrics.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Source of the current time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
	fn now_ms(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now_ms(&self) -> i64 {
		Utc::now().timestamp_millis()
	}
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
	now_ms: AtomicI64,
}

impl ManualClock {
	pub fn new(start_ms: i64) -> Self {
		Self {
			now_ms: AtomicI64::new(start_ms),
		}
	}

	pub fn set(&self, now_ms: i64) {
		self.now_ms.store(now_ms, Ordering::SeqCst);
	}

	pub fn advance(&self, delta_ms: i64) {
		self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now_ms(&self) -> i64 {
		self.now_ms.load(Ordering::SeqCst)
	}
}
