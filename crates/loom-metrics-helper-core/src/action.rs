// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! State actions and their validation.

use serde::{Deserialize, Serialize};

use crate::error::{MetricsHelperError, Result};

/// A lifecycle point on a host state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
	/// The user entered the state
	#[default]
	Enter,
	/// The user left the state
	Exit,
	/// The state received user input
	Input,
	/// A session was resumed on the state
	Resume,
	/// The state was displayed
	Show,
}

impl ActionKind {
	/// All actions, in matching priority order.
	pub const ALL: [ActionKind; 5] = [
		ActionKind::Enter,
		ActionKind::Exit,
		ActionKind::Input,
		ActionKind::Resume,
		ActionKind::Show,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			ActionKind::Enter => "enter",
			ActionKind::Exit => "exit",
			ActionKind::Input => "input",
			ActionKind::Resume => "resume",
			ActionKind::Show => "show",
		}
	}
}

impl std::fmt::Display for ActionKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl std::str::FromStr for ActionKind {
	type Err = MetricsHelperError;

	/// Exact, case-insensitive parse.
	fn from_str(s: &str) -> Result<Self> {
		let lower = s.to_lowercase();
		ActionKind::ALL
			.into_iter()
			.find(|kind| kind.as_str() == lower)
			.ok_or_else(|| MetricsHelperError::InvalidStateAction(s.to_string()))
	}
}

/// How raw action strings are matched against [`ActionKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMatching {
	/// Accept any string containing an action name, e.g. `reentering` is `enter`.
	#[default]
	Substring,
	/// Accept only the action names themselves.
	Exact,
}

impl std::fmt::Display for ActionMatching {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ActionMatching::Substring => write!(f, "substring"),
			ActionMatching::Exact => write!(f, "exact"),
		}
	}
}

impl std::str::FromStr for ActionMatching {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"substring" => Ok(ActionMatching::Substring),
			"exact" => Ok(ActionMatching::Exact),
			other => Err(format!("unknown action matching mode: {other}")),
		}
	}
}

/// Validates and normalizes a raw action.
///
/// A missing or empty action means [`ActionKind::Enter`]. Under
/// [`ActionMatching::Substring`] the leftmost action name found in the
/// lowercased input wins; at equal positions [`ActionKind::ALL`] order decides.
pub fn validate_action(raw: Option<&str>, matching: ActionMatching) -> Result<ActionKind> {
	let raw = match raw {
		Some(raw) if !raw.is_empty() => raw,
		_ => return Ok(ActionKind::Enter),
	};

	match matching {
		ActionMatching::Exact => raw.parse(),
		ActionMatching::Substring => find_leftmost(&raw.to_lowercase())
			.ok_or_else(|| MetricsHelperError::InvalidStateAction(raw.to_string())),
	}
}

fn find_leftmost(haystack: &str) -> Option<ActionKind> {
	haystack.char_indices().find_map(|(idx, _)| {
		let rest = &haystack[idx..];
		ActionKind::ALL
			.into_iter()
			.find(|kind| rest.starts_with(kind.as_str()))
	})
}
