// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host lifecycle events and the collaborators that deliver them.

use std::sync::Arc;

use async_trait::async_trait;
use loom_metrics_helper_core::{ActionKind, MetricsHelperError, Result, UserMetadata};
use tokio::sync::Mutex;

/// Name a handler subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
	/// `user:new`, a user seen for the first time
	UserNew,
	/// `session:new`, a fresh session (not a resume)
	SessionNew,
	/// `state:<action>`
	State(ActionKind),
}

impl std::fmt::Display for EventName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			EventName::UserNew => write!(f, "user:new"),
			EventName::SessionNew => write!(f, "session:new"),
			EventName::State(action) => write!(f, "state:{action}"),
		}
	}
}

impl std::str::FromStr for EventName {
	type Err = MetricsHelperError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"user:new" => Ok(EventName::UserNew),
			"session:new" => Ok(EventName::SessionNew),
			_ => match s.strip_prefix("state:") {
				Some(action) => Ok(EventName::State(action.parse()?)),
				None => Err(MetricsHelperError::EventBus(format!("unknown event {s}"))),
			},
		}
	}
}

/// The user an event belongs to, with their persisted metadata.
#[async_trait]
pub trait UserContext: Send + Sync {
	fn id(&self) -> &str;

	/// The user's metadata. Mutations are not durable until [`UserContext::save`] resolves.
	fn metadata(&self) -> &Mutex<UserMetadata>;

	async fn save(&self) -> Result<()>;
}

/// A fired event as seen by handlers.
#[derive(Clone)]
pub struct LifecycleEvent {
	pub name: EventName,
	/// Set for `state:*` events
	pub state: Option<String>,
	pub user: Arc<dyn UserContext>,
}

impl LifecycleEvent {
	pub fn user_new(user: Arc<dyn UserContext>) -> Self {
		Self {
			name: EventName::UserNew,
			state: None,
			user,
		}
	}

	pub fn session_new(user: Arc<dyn UserContext>) -> Self {
		Self {
			name: EventName::SessionNew,
			state: None,
			user,
		}
	}

	pub fn state(action: ActionKind, state: impl Into<String>, user: Arc<dyn UserContext>) -> Self {
		Self {
			name: EventName::State(action),
			state: Some(state.into()),
			user,
		}
	}

	pub fn state_name(&self) -> Option<&str> {
		self.state.as_deref()
	}
}

impl std::fmt::Debug for LifecycleEvent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LifecycleEvent")
			.field("name", &self.name)
			.field("state", &self.state)
			.field("user", &self.user.id())
			.finish()
	}
}

/// A callback subscribed to one event name.
#[async_trait]
pub trait EventHandler: Send + Sync {
	/// Runs to completion, including persistence and emission, before the host
	/// delivers the next event for the same user.
	async fn handle(&self, event: &LifecycleEvent) -> Result<()>;
}

/// The host's event bus. Subscriptions last as long as the bus.
pub trait EventBus: Send + Sync {
	fn on(&self, name: EventName, handler: Arc<dyn EventHandler>) -> Result<()>;
}
