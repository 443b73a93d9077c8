// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Metric label construction.

use crate::action::ActionKind;

/// Longest label synthesized from a trigger.
pub const MAX_LABEL_LEN: usize = 100;

/// Suffix of the companion sum metric emitted next to every total.
pub const TRANSIENT_SUFFIX: &str = ".transient";

/// Replaces every character outside `[a-zA-Z0-9._]` with `_`.
pub fn sanitize_state(state: &str) -> String {
	state
		.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
				c
			} else {
				'_'
			}
		})
		.collect()
}

/// Truncates to at most `max_len` characters.
pub fn truncate_label(label: &str, max_len: usize) -> String {
	label.chars().take(max_len).collect()
}

/// Builds `<prefix>_<action>_<state>` capped at [`MAX_LABEL_LEN`].
///
/// An empty prefix still gets its separator, so the result starts with `_`.
pub fn build_label(prefix: &str, action: ActionKind, state: &str) -> String {
	build_label_capped(prefix, action, state, MAX_LABEL_LEN)
}

pub fn build_label_capped(prefix: &str, action: ActionKind, state: &str, max_len: usize) -> String {
	let state = sanitize_state(state);
	let joined = [prefix, action.as_str(), state.as_str()].join("_");
	truncate_label(&joined, max_len)
}

pub fn transient_label(label: &str) -> String {
	format!("{label}{TRANSIENT_SUFFIX}")
}
