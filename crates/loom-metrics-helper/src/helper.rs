// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The per-session registry applications build metrics with.

use std::sync::Arc;

use loom_metrics_helper_core::{Result, TriggerDescriptor, TriggerSpec};

use crate::clock::{Clock, SystemClock};
use crate::config::MetricsHelperConfig;
use crate::event::EventBus;
use crate::recipes::{self, RecipeContext, Registration};
use crate::sink::MetricSink;

/// Attaches metric recipes to an event bus.
///
/// Every recipe call validates its triggers first, subscribes, and hands back
/// the helper so calls can be chained:
///
/// ```ignore
/// helper
/// 	.total_unique_users(Some("uniqueUsers"))?
/// 	.total_state_actions(("states:start", "exit"), Some("exits"))?
/// 	.sessions_until_state("states:end", None)?;
/// ```
pub struct MetricsHelper {
	ctx: RecipeContext,
	registrations: Vec<Registration>,
}

impl MetricsHelper {
	pub fn new(bus: Arc<dyn EventBus>, sink: Arc<dyn MetricSink>) -> Self {
		Self {
			ctx: RecipeContext {
				bus,
				sink,
				clock: Arc::new(SystemClock),
				config: MetricsHelperConfig::default(),
			},
			registrations: Vec::new(),
		}
	}

	pub fn with_config(mut self, config: MetricsHelperConfig) -> Self {
		self.ctx.config = config;
		self
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.ctx.clock = clock;
		self
	}

	pub fn config(&self) -> &MetricsHelperConfig {
		&self.ctx.config
	}

	/// Subscriptions made so far, in order.
	pub fn registrations(&self) -> &[Registration] {
		&self.registrations
	}

	fn validate(&self, trigger: impl Into<TriggerDescriptor>) -> Result<TriggerSpec> {
		trigger.into().validate(self.ctx.config.action_matching)
	}

	fn record(&mut self, registrations: Vec<Registration>) -> &mut Self {
		self.registrations.extend(registrations);
		self
	}

	pub fn total_unique_users(&mut self, label: Option<&str>) -> Result<&mut Self> {
		let regs = recipes::total_unique_users(&self.ctx, label)?;
		Ok(self.record(regs))
	}

	pub fn total_sessions(&mut self, label: Option<&str>) -> Result<&mut Self> {
		let regs = recipes::total_sessions(&self.ctx, label)?;
		Ok(self.record(regs))
	}

	pub fn total_state_actions(
		&mut self,
		trigger: impl Into<TriggerDescriptor>,
		label: Option<&str>,
	) -> Result<&mut Self> {
		let trigger = self.validate(trigger)?;
		let regs = recipes::total_state_actions(&self.ctx, &trigger, label)?;
		Ok(self.record(regs))
	}

	pub fn sessions_until_state(
		&mut self,
		trigger: impl Into<TriggerDescriptor>,
		label: Option<&str>,
	) -> Result<&mut Self> {
		let trigger = self.validate(trigger)?;
		let regs = recipes::sessions_until_state(&self.ctx, &trigger, label)?;
		Ok(self.record(regs))
	}

	pub fn time_between_states(
		&mut self,
		from: impl Into<TriggerDescriptor>,
		to: impl Into<TriggerDescriptor>,
		label: Option<&str>,
	) -> Result<&mut Self> {
		let from = self.validate(from)?;
		let to = self.validate(to)?;
		let regs = recipes::time_between_states(&self.ctx, &from, &to, label)?;
		Ok(self.record(regs))
	}

	/// Wires the recipes named in `metrics` (key, label) onto a start/end pair.
	pub fn tracker<I, K, V>(
		&mut self,
		start: impl Into<TriggerDescriptor>,
		end: impl Into<TriggerDescriptor>,
		metrics: I,
	) -> Result<&mut Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let start = self.validate(start)?;
		let end = self.validate(end)?;
		let regs = recipes::tracker(&self.ctx, &start, &end, metrics)?;
		Ok(self.record(regs))
	}

	/// Wires the recipes named in `metrics` (key, label) onto one trigger.
	pub fn trigger<I, K, V>(
		&mut self,
		trigger: impl Into<TriggerDescriptor>,
		metrics: I,
	) -> Result<&mut Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let trigger = self.validate(trigger)?;
		let regs = recipes::trigger(&self.ctx, &trigger, metrics)?;
		Ok(self.record(regs))
	}
}
