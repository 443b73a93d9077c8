// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for lifecycle metrics.

use thiserror::Error;

/// Errors raised while registering or running metric recipes.
#[derive(Debug, Error)]
pub enum MetricsHelperError {
	/// A trigger named an action outside enter/exit/input/resume/show.
	#[error("Invalid state action {0}")]
	InvalidStateAction(String),

	/// The user persistence collaborator failed to save metadata.
	#[error("persistence error: {0}")]
	Persistence(String),

	/// The metric sink rejected an emission.
	#[error("metric sink error: {0}")]
	Sink(String),

	/// The host event bus refused a subscription or failed a dispatch.
	#[error("event bus error: {0}")]
	EventBus(String),
}

impl MetricsHelperError {
	/// Returns true for errors raised at registration time rather than by a collaborator.
	pub fn is_validation(&self) -> bool {
		matches!(self, MetricsHelperError::InvalidStateAction(_))
	}
}

/// Result type alias for metrics helper operations.
pub type Result<T> = std::result::Result<T, MetricsHelperError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_invalid_action_message() {
		let err = MetricsHelperError::InvalidStateAction("foo".to_string());
		assert_eq!(err.to_string(), "Invalid state action foo");
		assert!(err.is_validation());
	}

	#[test]
	fn test_collaborator_errors_are_not_validation() {
		assert!(!MetricsHelperError::Persistence("disk".to_string()).is_validation());
		assert!(!MetricsHelperError::Sink("down".to_string()).is_validation());
		assert!(!MetricsHelperError::EventBus("closed".to_string()).is_validation());
	}
}
