// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! An in-process event bus.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use loom_metrics_helper_core::{MetricsHelperError, Result};
use tracing::debug;

use crate::event::{EventBus, EventHandler, EventName, LifecycleEvent};

/// Dispatches each event to its handlers one at a time, in subscription order.
#[derive(Default)]
pub struct LocalEventBus {
	handlers: RwLock<HashMap<EventName, Vec<Arc<dyn EventHandler>>>>,
}

impl LocalEventBus {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn handler_count(&self, name: EventName) -> usize {
		self
			.handlers
			.read()
			.map(|handlers| handlers.get(&name).map_or(0, Vec::len))
			.unwrap_or(0)
	}

	/// Runs every handler for `event.name`, stopping at the first failure.
	pub async fn emit(&self, event: &LifecycleEvent) -> Result<()> {
		let handlers = self
			.handlers
			.read()
			.map_err(|_| MetricsHelperError::EventBus("handler registry poisoned".to_string()))?
			.get(&event.name)
			.cloned()
			.unwrap_or_default();

		debug!(
			event = %event.name,
			user = event.user.id(),
			handlers = handlers.len(),
			"dispatching event"
		);

		for handler in handlers {
			handler.handle(event).await?;
		}
		Ok(())
	}
}

impl EventBus for LocalEventBus {
	fn on(&self, name: EventName, handler: Arc<dyn EventHandler>) -> Result<()> {
		self
			.handlers
			.write()
			.map_err(|_| MetricsHelperError::EventBus("handler registry poisoned".to_string()))?
			.entry(name)
			.or_default()
			.push(handler);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryUser;
	use async_trait::async_trait;
	use loom_metrics_helper_core::ActionKind;
	use tokio::sync::Mutex;

	struct RecordingHandler {
		tag: &'static str,
		seen: Arc<Mutex<Vec<String>>>,
		fail: bool,
	}

	#[async_trait]
	impl EventHandler for RecordingHandler {
		async fn handle(&self, event: &LifecycleEvent) -> Result<()> {
			self
				.seen
				.lock()
				.await
				.push(format!("{}:{}", self.tag, event.name));
			if self.fail {
				return Err(MetricsHelperError::Sink("boom".to_string()));
			}
			Ok(())
		}
	}

	fn handler(tag: &'static str, seen: &Arc<Mutex<Vec<String>>>, fail: bool) -> Arc<dyn EventHandler> {
		Arc::new(RecordingHandler {
			tag,
			seen: Arc::clone(seen),
			fail,
		})
	}

	#[tokio::test]
	async fn test_emit_runs_handlers_in_subscription_order() {
		let bus = LocalEventBus::new();
		let seen = Arc::new(Mutex::new(Vec::new()));
		bus.on(EventName::SessionNew, handler("a", &seen, false)).unwrap();
		bus.on(EventName::SessionNew, handler("b", &seen, false)).unwrap();
		bus.on(EventName::UserNew, handler("c", &seen, false)).unwrap();

		let user: Arc<dyn crate::event::UserContext> = Arc::new(MemoryUser::new("u"));
		bus.emit(&LifecycleEvent::session_new(user)).await.unwrap();

		assert_eq!(
			*seen.lock().await,
			vec!["a:session:new".to_string(), "b:session:new".to_string()]
		);
		assert_eq!(bus.handler_count(EventName::SessionNew), 2);
		assert_eq!(bus.handler_count(EventName::State(ActionKind::Show)), 0);
	}

	#[tokio::test]
	async fn test_emit_stops_on_first_error() {
		let bus = LocalEventBus::new();
		let seen = Arc::new(Mutex::new(Vec::new()));
		bus.on(EventName::UserNew, handler("a", &seen, true)).unwrap();
		bus.on(EventName::UserNew, handler("b", &seen, false)).unwrap();

		let user: Arc<dyn crate::event::UserContext> = Arc::new(MemoryUser::new("u"));
		let result = bus.emit(&LifecycleEvent::user_new(user)).await;

		assert!(matches!(result, Err(MetricsHelperError::Sink(_))));
		assert_eq!(*seen.lock().await, vec!["a:user:new".to_string()]);
	}
}
