// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The recipe catalogue.
//!
//! Each recipe subscribes one or more handlers to the event bus and returns
//! immediately. Handlers update the firing user's metadata through an
//! [`Accumulator`] (which saves before returning) and then emit through the
//! sink, waiting on all emissions together.

use std::sync::Arc;

use async_trait::async_trait;
use loom_metrics_helper_core::{
	build_label_capped, metadata_key, transient_label, truncate_label, AccumulatorKind,
	MetricObservation, Result, TriggerSpec,
};
use tracing::{debug, instrument};

use crate::accumulator::Accumulator;
use crate::clock::Clock;
use crate::config::MetricsHelperConfig;
use crate::event::{EventBus, EventHandler, EventName, LifecycleEvent};
use crate::sink::{fire_all, MetricSink};

pub const DEFAULT_UNIQUE_USERS_LABEL: &str = "unique_users";
pub const DEFAULT_SESSIONS_LABEL: &str = "total_sessions";
pub const TOTAL_ACTION_PREFIX: &str = "total_action";
pub const SESSIONS_UNTIL_PREFIX: &str = "sessions_until";
pub const TIME_BETWEEN_PREFIX: &str = "time_between";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeKind {
	TotalUniqueUsers,
	TotalSessions,
	TotalStateActions,
	SessionsUntilState,
	TimeBetweenStates,
}

impl RecipeKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			RecipeKind::TotalUniqueUsers => "total_unique_users",
			RecipeKind::TotalSessions => "total_sessions",
			RecipeKind::TotalStateActions => "total_state_actions",
			RecipeKind::SessionsUntilState => "sessions_until_state",
			RecipeKind::TimeBetweenStates => "time_between_states",
		}
	}

	/// Recipes a composite map key can name.
	pub fn from_composite_key(key: &str) -> Option<Self> {
		match key {
			"total_state_actions" => Some(RecipeKind::TotalStateActions),
			"sessions_until_state" => Some(RecipeKind::SessionsUntilState),
			"time_between_states" => Some(RecipeKind::TimeBetweenStates),
			_ => None,
		}
	}
}

impl std::fmt::Display for RecipeKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// One subscription made by a recipe. Never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
	pub recipe: RecipeKind,
	pub label: String,
	pub event: EventName,
}

/// Everything a recipe needs to subscribe and emit.
#[derive(Clone)]
pub struct RecipeContext {
	pub bus: Arc<dyn EventBus>,
	pub sink: Arc<dyn MetricSink>,
	pub clock: Arc<dyn Clock>,
	pub config: MetricsHelperConfig,
}

impl RecipeContext {
	fn label_for(&self, prefix: &str, trigger: &TriggerSpec) -> String {
		build_label_capped(
			prefix,
			trigger.action,
			&trigger.state,
			self.config.max_label_len,
		)
	}

	fn key_for(&self, kind: AccumulatorKind, label: &str) -> String {
		metadata_key(&self.config.metadata_namespace, kind, label)
	}

	fn subscribe(
		&self,
		recipe: RecipeKind,
		label: &str,
		event: EventName,
		handler: Arc<dyn EventHandler>,
	) -> Result<Registration> {
		self.bus.on(event, handler)?;
		debug!(recipe = %recipe, label, event = %event, "registered metric recipe");
		Ok(Registration {
			recipe,
			label: label.to_string(),
			event,
		})
	}
}

fn fired_on(trigger: &TriggerSpec, event: &LifecycleEvent) -> bool {
	event
		.state_name()
		.is_some_and(|name| trigger.matches_state(name))
}

/// `inc` on the label plus `sum` on its transient companion, optionally filtered by state.
struct TotalCount {
	sink: Arc<dyn MetricSink>,
	label: String,
	transient: String,
	filter: Option<TriggerSpec>,
}

#[async_trait]
impl EventHandler for TotalCount {
	#[instrument(skip_all, fields(label = %self.label))]
	async fn handle(&self, event: &LifecycleEvent) -> Result<()> {
		if let Some(trigger) = &self.filter {
			if !fired_on(trigger, event) {
				return Ok(());
			}
		}

		fire_all(
			self.sink.as_ref(),
			&[
				MetricObservation::inc(&self.label, 1.0),
				MetricObservation::sum(&self.transient, 1.0),
			],
		)
		.await
	}
}

/// Counts every session start into a metadata counter.
struct SessionCounter {
	key: String,
}

#[async_trait]
impl EventHandler for SessionCounter {
	async fn handle(&self, event: &LifecycleEvent) -> Result<()> {
		Accumulator::new(event.user.as_ref())
			.increment(&self.key)
			.await
	}
}

/// Emits and clears the session counter when the trigger fires.
struct SessionsUntilState {
	sink: Arc<dyn MetricSink>,
	label: String,
	key: String,
	trigger: TriggerSpec,
}

#[async_trait]
impl EventHandler for SessionsUntilState {
	#[instrument(skip_all, fields(label = %self.label))]
	async fn handle(&self, event: &LifecycleEvent) -> Result<()> {
		if !fired_on(&self.trigger, event) {
			return Ok(());
		}

		let sessions = Accumulator::new(event.user.as_ref())
			.reset_and_get(&self.key)
			.await?;
		fire_all(
			self.sink.as_ref(),
			&[MetricObservation::avg(&self.label, sessions as f64)],
		)
		.await
	}
}

/// Stamps the current time when the "from" trigger fires.
struct StateTimestamp {
	clock: Arc<dyn Clock>,
	key: String,
	trigger: TriggerSpec,
}

#[async_trait]
impl EventHandler for StateTimestamp {
	async fn handle(&self, event: &LifecycleEvent) -> Result<()> {
		if !fired_on(&self.trigger, event) {
			return Ok(());
		}

		Accumulator::new(event.user.as_ref())
			.set_timestamp(&self.key, self.clock.now_ms())
			.await
	}
}

/// Emits time since the stamp when the "to" trigger fires.
///
/// Without a prior stamp the start reads as 0, so the value is the full epoch
/// time in milliseconds.
struct TimeBetweenStates {
	sink: Arc<dyn MetricSink>,
	clock: Arc<dyn Clock>,
	label: String,
	key: String,
	trigger: TriggerSpec,
}

#[async_trait]
impl EventHandler for TimeBetweenStates {
	#[instrument(skip_all, fields(label = %self.label))]
	async fn handle(&self, event: &LifecycleEvent) -> Result<()> {
		if !fired_on(&self.trigger, event) {
			return Ok(());
		}

		let now = self.clock.now_ms();
		let started = Accumulator::new(event.user.as_ref())
			.reset_and_get(&self.key)
			.await?;
		fire_all(
			self.sink.as_ref(),
			&[MetricObservation::avg(&self.label, (now - started) as f64)],
		)
		.await
	}
}

fn total_count(
	ctx: &RecipeContext,
	recipe: RecipeKind,
	label: String,
	event: EventName,
	filter: Option<TriggerSpec>,
) -> Result<Vec<Registration>> {
	let handler = Arc::new(TotalCount {
		sink: Arc::clone(&ctx.sink),
		transient: transient_label(&label),
		label: label.clone(),
		filter,
	});
	Ok(vec![ctx.subscribe(recipe, &label, event, handler)?])
}

/// Counts users seen for the first time. Default label `unique_users`.
pub fn total_unique_users(ctx: &RecipeContext, label: Option<&str>) -> Result<Vec<Registration>> {
	let label = label.unwrap_or(DEFAULT_UNIQUE_USERS_LABEL).to_string();
	total_count(
		ctx,
		RecipeKind::TotalUniqueUsers,
		label,
		EventName::UserNew,
		None,
	)
}

/// Counts new sessions; resumes do not count. Default label `total_sessions`.
pub fn total_sessions(ctx: &RecipeContext, label: Option<&str>) -> Result<Vec<Registration>> {
	let label = label.unwrap_or(DEFAULT_SESSIONS_LABEL).to_string();
	total_count(
		ctx,
		RecipeKind::TotalSessions,
		label,
		EventName::SessionNew,
		None,
	)
}

/// Counts the trigger's action on its state.
pub fn total_state_actions(
	ctx: &RecipeContext,
	trigger: &TriggerSpec,
	label: Option<&str>,
) -> Result<Vec<Registration>> {
	let label = label
		.map(str::to_string)
		.unwrap_or_else(|| ctx.label_for(TOTAL_ACTION_PREFIX, trigger));
	total_count(
		ctx,
		RecipeKind::TotalStateActions,
		label,
		EventName::State(trigger.action),
		Some(trigger.clone()),
	)
}

/// Averages the number of sessions started before the trigger fires, counting
/// the session it fires in.
pub fn sessions_until_state(
	ctx: &RecipeContext,
	trigger: &TriggerSpec,
	label: Option<&str>,
) -> Result<Vec<Registration>> {
	let label = label
		.map(str::to_string)
		.unwrap_or_else(|| ctx.label_for(SESSIONS_UNTIL_PREFIX, trigger));
	let key = ctx.key_for(AccumulatorKind::SessionsUntilState, &label);

	let counter = Arc::new(SessionCounter { key: key.clone() });
	let emitter = Arc::new(SessionsUntilState {
		sink: Arc::clone(&ctx.sink),
		label: label.clone(),
		key,
		trigger: trigger.clone(),
	});

	Ok(vec![
		ctx.subscribe(
			RecipeKind::SessionsUntilState,
			&label,
			EventName::SessionNew,
			counter,
		)?,
		ctx.subscribe(
			RecipeKind::SessionsUntilState,
			&label,
			EventName::State(trigger.action),
			emitter,
		)?,
	])
}

/// Default label for a pair of triggers, e.g. `time_between_enter_a_enter_b`.
pub fn time_between_label(from: &TriggerSpec, to: &TriggerSpec, max_len: usize) -> String {
	let head = build_label_capped(TIME_BETWEEN_PREFIX, from.action, &from.state, max_len);
	let tail = build_label_capped("", to.action, &to.state, max_len);
	truncate_label(&format!("{head}{tail}"), max_len)
}

/// Averages milliseconds from the `from` trigger to the `to` trigger.
pub fn time_between_states(
	ctx: &RecipeContext,
	from: &TriggerSpec,
	to: &TriggerSpec,
	label: Option<&str>,
) -> Result<Vec<Registration>> {
	let label = label
		.map(str::to_string)
		.unwrap_or_else(|| time_between_label(from, to, ctx.config.max_label_len));
	let key = ctx.key_for(AccumulatorKind::TimeBetweenStates, &label);

	let stamp = Arc::new(StateTimestamp {
		clock: Arc::clone(&ctx.clock),
		key: key.clone(),
		trigger: from.clone(),
	});
	let emitter = Arc::new(TimeBetweenStates {
		sink: Arc::clone(&ctx.sink),
		clock: Arc::clone(&ctx.clock),
		label: label.clone(),
		key,
		trigger: to.clone(),
	});

	Ok(vec![
		ctx.subscribe(
			RecipeKind::TimeBetweenStates,
			&label,
			EventName::State(from.action),
			stamp,
		)?,
		ctx.subscribe(
			RecipeKind::TimeBetweenStates,
			&label,
			EventName::State(to.action),
			emitter,
		)?,
	])
}

/// Wires two-trigger recipes named in `metrics`. Only `time_between_states`
/// is recognized; other keys are skipped.
pub fn tracker<I, K, V>(
	ctx: &RecipeContext,
	start: &TriggerSpec,
	end: &TriggerSpec,
	metrics: I,
) -> Result<Vec<Registration>>
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	let mut registrations = Vec::new();
	for (key, label) in metrics {
		if RecipeKind::from_composite_key(key.as_ref()) == Some(RecipeKind::TimeBetweenStates) {
			registrations.extend(time_between_states(ctx, start, end, Some(label.as_ref()))?);
		}
	}
	Ok(registrations)
}

/// Wires single-trigger recipes named in `metrics`: `sessions_until_state`
/// and `total_state_actions`. Other keys are skipped.
pub fn trigger<I, K, V>(
	ctx: &RecipeContext,
	trigger: &TriggerSpec,
	metrics: I,
) -> Result<Vec<Registration>>
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	let mut registrations = Vec::new();
	for (key, label) in metrics {
		let label = Some(label.as_ref());
		match RecipeKind::from_composite_key(key.as_ref()) {
			Some(RecipeKind::SessionsUntilState) => {
				registrations.extend(sessions_until_state(ctx, trigger, label)?)
			}
			Some(RecipeKind::TotalStateActions) => {
				registrations.extend(total_state_actions(ctx, trigger, label)?)
			}
			_ => {}
		}
	}
	Ok(registrations)
}
