// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Derived metrics for Loom application lifecycle events.
//!
//! Applications build a [`MetricsHelper`] per interaction session and attach
//! recipes to it. Recipes subscribe to host events (`user:new`,
//! `session:new`, `state:<action>`), keep counters and timestamps in the
//! firing user's persisted metadata, and emit through the host's metric sink.
//!
//! # Recipes
//!
//! - **total_unique_users** / **total_sessions**: running totals plus a
//!   `.transient` sum companion
//! - **total_state_actions**: the same for one action on one state
//! - **sessions_until_state**: average sessions started before reaching a state
//! - **time_between_states**: average milliseconds between two triggers
//! - **tracker** / **trigger**: wire several recipes from a (key, label) map
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use loom_metrics_helper::{LocalEventBus, MemoryMetricStore, MetricsHelper};
//!
//! let bus = Arc::new(LocalEventBus::new());
//! let store = Arc::new(MemoryMetricStore::new());
//!
//! let mut helper = MetricsHelper::new(bus.clone(), store.clone());
//! helper
//! 	.total_unique_users(Some("uniqueUsers"))?
//! 	.trigger("states:end", [("sessions_until_state", "sessions_to_end")])?
//! 	.time_between_states("states:start", "states:end", Some("start_to_end"))?;
//! ```
//!
//! The host must deliver events for one user one at a time; handlers rely on
//! it to treat read-and-reset of metadata as atomic.

pub mod accumulator;
pub mod bus;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod helper;
pub mod memory;
pub mod recipes;
pub mod sink;

pub use accumulator::Accumulator;
pub use bus::LocalEventBus;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
	load_config, load_from_sources, ConfigSource, DefaultsSource, EnvSource, MetricsHelperConfig,
	MetricsHelperConfigLayer, Precedence, TomlSource,
};
pub use error::{ConfigError, MetricsHelperError, Result};
pub use event::{EventBus, EventHandler, EventName, LifecycleEvent, UserContext};
pub use helper::MetricsHelper;
pub use memory::{Aggregation, MemoryMetricStore, MemoryUser, MetricSeries};
pub use recipes::{RecipeContext, RecipeKind, Registration};
pub use sink::{fire_all, MetricSink};

// Re-export core types for convenience
pub use loom_metrics_helper_core::{
	build_label, validate_action, ActionKind, ActionMatching, MetricObservation, ObservationKind,
	TriggerDescriptor, TriggerSpec, UserMetadata,
};
