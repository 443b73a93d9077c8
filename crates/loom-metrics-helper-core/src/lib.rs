// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for lifecycle-triggered metrics.
//!
//! This crate holds the synchronous pieces shared by the engine and by hosts:
//! - [`ActionKind`] and [`validate_action`] for trigger actions
//! - [`TriggerDescriptor`] / [`TriggerSpec`] for the state + action pairs recipes observe
//! - [`build_label`] and friends for deterministic metric labels
//! - [`UserMetadata`], the per-user scratch map counters and timestamps live in
//! - [`MetricObservation`], the value handed to a metric sink

pub mod action;
pub mod error;
pub mod label;
pub mod metadata;
pub mod observation;
pub mod trigger;

pub use action::{validate_action, ActionKind, ActionMatching};
pub use error::{MetricsHelperError, Result};
pub use label::{
	build_label, build_label_capped, sanitize_state, transient_label, truncate_label, MAX_LABEL_LEN,
	TRANSIENT_SUFFIX,
};
pub use metadata::{metadata_key, AccumulatorKind, UserMetadata, DEFAULT_METADATA_NAMESPACE};
pub use observation::{MetricObservation, ObservationKind};
pub use trigger::{TriggerDescriptor, TriggerSpec};
