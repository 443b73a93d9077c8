// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::Arc;

use loom_metrics_helper::{
	ActionKind, Aggregation, LifecycleEvent, LocalEventBus, ManualClock, MemoryMetricStore,
	MemoryUser, MetricSeries, MetricsHelper, MetricsHelperError, ObservationKind, UserContext,
};

const START: &str = "states:test";
const END: &str = "states:test2";

/// A two-state app: `states:test` takes input and moves to `states:test2`,
/// which ends the session. The next session starts on `states:test` again.
struct Host {
	bus: Arc<LocalEventBus>,
	users: HashMap<String, Arc<MemoryUser>>,
	current: HashMap<String, String>,
}

impl Host {
	fn new(bus: Arc<LocalEventBus>) -> Self {
		Self {
			bus,
			users: HashMap::new(),
			current: HashMap::new(),
		}
	}

	/// Seeds a returning user sitting on `state`.
	fn existing_user(&mut self, addr: &str, state: &str) {
		self.users
			.insert(addr.to_string(), Arc::new(MemoryUser::new(addr)));
		self.current.insert(addr.to_string(), state.to_string());
	}

	fn user(&self, addr: &str) -> Arc<dyn UserContext> {
		self.users[addr].clone()
	}

	async fn fire(&self, event: LifecycleEvent) {
		self.bus.emit(&event).await.unwrap();
	}

	async fn new_session(&mut self, addr: &str) {
		if !self.users.contains_key(addr) {
			self.users
				.insert(addr.to_string(), Arc::new(MemoryUser::new(addr)));
			self.fire(LifecycleEvent::user_new(self.user(addr))).await;
		}
		self.fire(LifecycleEvent::session_new(self.user(addr))).await;

		let state = self
			.current
			.entry(addr.to_string())
			.or_insert_with(|| START.to_string())
			.clone();
		self.fire(LifecycleEvent::state(ActionKind::Enter, state, self.user(addr)))
			.await;
	}

	async fn resume(&mut self, addr: &str) {
		let state = self.current[addr].clone();
		self.fire(LifecycleEvent::state(ActionKind::Resume, state, self.user(addr)))
			.await;
	}

	async fn input(&mut self, addr: &str) {
		let state = self.current[addr].clone();
		self.fire(LifecycleEvent::state(ActionKind::Input, state.clone(), self.user(addr)))
			.await;
		self.fire(LifecycleEvent::state(ActionKind::Exit, state.clone(), self.user(addr)))
			.await;

		let next = if state == START { END } else { START };
		self.fire(LifecycleEvent::state(ActionKind::Enter, next, self.user(addr)))
			.await;

		if next == END {
			self.current.insert(addr.to_string(), START.to_string());
		} else {
			self.current.insert(addr.to_string(), next.to_string());
		}
	}
}

fn setup() -> (Host, MetricsHelper, Arc<MemoryMetricStore>, Arc<ManualClock>) {
	let bus = Arc::new(LocalEventBus::new());
	let store = Arc::new(MemoryMetricStore::new());
	let clock = Arc::new(ManualClock::new(1_700_000_000_000));
	let helper = MetricsHelper::new(bus.clone(), store.clone()).with_clock(clock.clone());
	(Host::new(bus), helper, store, clock)
}

fn last(values: &[f64]) -> MetricSeries {
	MetricSeries {
		agg: Aggregation::Last,
		values: values.to_vec(),
	}
}

fn avg(values: &[f64]) -> MetricSeries {
	MetricSeries {
		agg: Aggregation::Avg,
		values: values.to_vec(),
	}
}

#[tokio::test]
async fn new_users_fire_both_unique_user_metrics() {
	let (mut host, mut helper, store, _) = setup();
	helper
		.total_unique_users(Some("uniqueUsers"))
		.unwrap()
		.total_unique_users(None)
		.unwrap();

	host.new_session("+271234").await;
	host.new_session("+274321").await;

	assert_eq!(store.series("uniqueUsers").await.unwrap(), last(&[1.0, 2.0]));
	assert_eq!(store.series("unique_users").await.unwrap(), last(&[1.0, 2.0]));
	assert_eq!(
		store.series("uniqueUsers.transient").await.unwrap().values,
		vec![1.0, 1.0]
	);
}

#[tokio::test]
async fn existing_users_do_not_count_as_unique() {
	let (mut host, mut helper, store, _) = setup();
	helper.total_unique_users(Some("uniqueUsers")).unwrap();

	host.existing_user("+271234", START);
	host.new_session("+271234").await;

	assert!(store.series("uniqueUsers").await.is_none());
}

#[tokio::test]
async fn sessions_count_new_sessions_only() {
	let (mut host, mut helper, store, _) = setup();
	helper
		.total_sessions(Some("sessions"))
		.unwrap()
		.total_sessions(None)
		.unwrap();

	host.new_session("+271234").await;
	host.new_session("+271234").await;
	host.resume("+271234").await;

	assert_eq!(store.series("sessions").await.unwrap(), last(&[1.0, 2.0]));
	assert_eq!(store.series("total_sessions").await.unwrap(), last(&[1.0, 2.0]));
}

#[tokio::test]
async fn resume_alone_fires_nothing() {
	let (mut host, mut helper, store, _) = setup();
	helper
		.total_sessions(Some("sessions"))
		.unwrap()
		.sessions_until_state(END, Some("until_end"))
		.unwrap();

	host.existing_user("+271234", START);
	host.resume("+271234").await;

	assert!(store.is_empty().await);
	let meta = host.users["+271234"].metadata().lock().await.clone();
	assert!(meta.is_empty());
}

#[tokio::test]
async fn state_actions_count_exits_and_entries() {
	let (mut host, mut helper, store, _) = setup();
	helper
		.total_state_actions((START, "exit"), Some("exits"))
		.unwrap()
		.total_state_actions(START, None)
		.unwrap();

	host.new_session("+271234").await;
	host.input("+271234").await;
	host.new_session("+271234").await;

	assert_eq!(store.series("exits").await.unwrap(), last(&[1.0]));
	assert_eq!(
		store
			.series("total_action_enter_states_test")
			.await
			.unwrap(),
		last(&[1.0, 2.0])
	);
}

#[tokio::test]
async fn bad_state_action_is_rejected() {
	let (_, mut helper, _, _) = setup();
	let err = helper
		.total_state_actions((START, "foo"), Some("bad"))
		.err()
		.unwrap();

	assert!(matches!(err, MetricsHelperError::InvalidStateAction(_)));
	assert_eq!(err.to_string(), "Invalid state action foo");
}

#[tokio::test]
async fn sessions_until_state_fires_on_reaching_state() {
	let (mut host, mut helper, store, _) = setup();
	helper
		.sessions_until_state(END, Some("sessions_until"))
		.unwrap()
		.sessions_until_state(END, None)
		.unwrap();

	host.new_session("+271234").await;
	host.input("+271234").await;
	host.new_session("+271234").await;
	host.input("+271234").await;

	assert_eq!(store.series("sessions_until").await.unwrap(), avg(&[1.0, 1.0]));
	assert_eq!(
		store
			.series("sessions_until_enter_states_test2")
			.await
			.unwrap(),
		avg(&[1.0, 1.0])
	);
}

#[tokio::test]
async fn sessions_until_state_counts_multiple_sessions() {
	let (mut host, mut helper, store, _) = setup();
	helper
		.sessions_until_state(END, Some("sessions_until"))
		.unwrap();

	host.new_session("+271234").await;
	host.new_session("+271234").await;
	host.new_session("+271234").await;
	host.input("+271234").await;
	host.new_session("+271234").await;
	host.input("+271234").await;

	assert_eq!(store.series("sessions_until").await.unwrap(), avg(&[3.0, 1.0]));
}

#[tokio::test]
async fn sessions_until_state_survives_restart() {
	let (mut host, mut helper, _, _) = setup();
	helper.sessions_until_state(END, Some("L")).unwrap();

	host.new_session("+271234").await;
	let snapshot = host.users["+271234"].saved_snapshot().await.unwrap();

	let (mut host, mut helper, store, _) = setup();
	helper.sessions_until_state(END, Some("L")).unwrap();
	host.users.insert(
		"+271234".to_string(),
		Arc::new(MemoryUser::with_metadata("+271234", snapshot)),
	);
	host.current
		.insert("+271234".to_string(), START.to_string());

	host.new_session("+271234").await;
	host.input("+271234").await;

	assert_eq!(store.series("L").await.unwrap(), avg(&[2.0]));
}

#[tokio::test]
async fn time_between_states_averages_elapsed_time() {
	let (mut host, mut helper, store, clock) = setup();
	helper
		.time_between_states(START, END, Some("T"))
		.unwrap();

	host.new_session("+271234").await;
	clock.advance(4_200);
	host.input("+271234").await;

	let series = store.series("T").await.unwrap();
	assert_eq!(series, avg(&[4_200.0]));
}

#[tokio::test]
async fn tracker_wires_time_between_states() {
	let (mut host, mut helper, store, clock) = setup();
	helper
		.tracker(
			START,
			END,
			[("time_between_states", "start_to_end"), ("unknown", "x")],
		)
		.unwrap();

	host.new_session("+271234").await;
	clock.advance(10);
	host.input("+271234").await;

	assert_eq!(store.series("start_to_end").await.unwrap(), avg(&[10.0]));
	assert_eq!(store.labels().await, vec!["start_to_end"]);
}

#[tokio::test]
async fn trigger_wires_independent_recipes() {
	let (mut host, mut helper, store, _) = setup();
	helper
		.trigger(
			END,
			[("sessions_until_state", "X"), ("total_state_actions", "Y")],
		)
		.unwrap();

	host.new_session("+271234").await;
	host.input("+271234").await;

	assert_eq!(store.series("X").await.unwrap(), avg(&[1.0]));
	assert_eq!(store.series("Y").await.unwrap(), last(&[1.0]));
	assert_eq!(store.series("Y.transient").await.unwrap().values, vec![1.0]);

	let kinds: Vec<_> = store.observations().await.iter().map(|o| o.kind).collect();
	assert!(kinds.contains(&ObservationKind::Average));
	assert!(kinds.contains(&ObservationKind::Increment));
	assert!(kinds.contains(&ObservationKind::Sum));
}

#[tokio::test]
async fn metrics_for_different_users_are_independent() {
	let (mut host, mut helper, store, _) = setup();
	helper.sessions_until_state(END, Some("L")).unwrap();

	host.new_session("+27a").await;
	host.new_session("+27a").await;
	host.new_session("+27b").await;
	host.input("+27b").await;
	host.input("+27a").await;

	assert_eq!(store.series("L").await.unwrap(), avg(&[1.0, 2.0]));
}
