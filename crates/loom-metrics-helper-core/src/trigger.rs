// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Trigger descriptors: which state, and which action on it.

use serde::{Deserialize, Serialize};

use crate::action::{validate_action, ActionKind, ActionMatching};
use crate::error::Result;

/// An unvalidated trigger as supplied by application code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
	/// Host state name, e.g. `states:start`
	pub state: String,
	/// Raw action; `None` means enter
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
}

impl TriggerDescriptor {
	pub fn new(state: impl Into<String>) -> Self {
		Self {
			state: state.into(),
			action: None,
		}
	}

	pub fn with_action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	/// Normalizes the action, failing with `InvalidStateAction` if it is unknown.
	pub fn validate(&self, matching: ActionMatching) -> Result<TriggerSpec> {
		let action = validate_action(self.action.as_deref(), matching)?;
		Ok(TriggerSpec {
			state: self.state.clone(),
			action,
		})
	}
}

impl From<&str> for TriggerDescriptor {
	fn from(state: &str) -> Self {
		Self::new(state)
	}
}

impl From<String> for TriggerDescriptor {
	fn from(state: String) -> Self {
		Self::new(state)
	}
}

impl From<(&str, &str)> for TriggerDescriptor {
	fn from((state, action): (&str, &str)) -> Self {
		Self::new(state).with_action(action)
	}
}

impl From<TriggerSpec> for TriggerDescriptor {
	fn from(spec: TriggerSpec) -> Self {
		Self::new(spec.state).with_action(spec.action.as_str())
	}
}

/// A validated trigger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerSpec {
	pub state: String,
	pub action: ActionKind,
}

impl TriggerSpec {
	pub fn new(state: impl Into<String>, action: ActionKind) -> Self {
		Self {
			state: state.into(),
			action,
		}
	}

	/// True when an event fired on `state_name` belongs to this trigger.
	pub fn matches_state(&self, state_name: &str) -> bool {
		self.state == state_name
	}
}

impl std::fmt::Display for TriggerSpec {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}@{}", self.action, self.state)
	}
}
