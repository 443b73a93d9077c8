// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persisting wrappers around the metadata primitives.
//!
//! Each call mutates the user's metadata and then awaits [`UserContext::save`],
//! so the only window for losing an update is between the mutation and the
//! save. Callers rely on the host never running two handlers for the same user
//! at once; the metadata lock is released before saving.

use loom_metrics_helper_core::Result;
use tracing::trace;

use crate::event::UserContext;

pub struct Accumulator<'a> {
	user: &'a dyn UserContext,
}

impl<'a> Accumulator<'a> {
	pub fn new(user: &'a dyn UserContext) -> Self {
		Self { user }
	}

	pub async fn increment(&self, key: &str) -> Result<()> {
		self.user.metadata().lock().await.increment(key);
		trace!(user = self.user.id(), key, "incremented counter");
		self.user.save().await
	}

	pub async fn reset_and_get(&self, key: &str) -> Result<i64> {
		let previous = self.user.metadata().lock().await.reset_and_get(key);
		trace!(user = self.user.id(), key, previous, "reset counter");
		self.user.save().await?;
		Ok(previous)
	}

	pub async fn set_timestamp(&self, key: &str, value: i64) -> Result<()> {
		self.user.metadata().lock().await.set_timestamp(key, value);
		trace!(user = self.user.id(), key, value, "stored timestamp");
		self.user.save().await
	}
}
