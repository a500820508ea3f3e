//! End-to-end behavior of the contacts model through the public API.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use roster_model::{ContactKey, ContactRecord, ContactSource, ContactsModel, MemorySource, ModelEvent, WorkQueue};

struct Harness {
	queue: Rc<WorkQueue>,
	source: Rc<MemorySource>,
	model: ContactsModel,
	events: Rc<RefCell<Vec<ModelEvent>>>,
}

impl Harness {
	fn new(records: impl IntoIterator<Item = ContactRecord>) -> Self {
		let queue = Rc::new(WorkQueue::new());
		let source = MemorySource::with_contacts(queue.clone(), records);
		let model = ContactsModel::new(queue.clone());
		let events = Rc::new(RefCell::new(Vec::new()));
		let sink = events.clone();
		model.subscribe(move |event| sink.borrow_mut().push(*event));
		Self { queue, source, model, events }
	}

	fn bind(&self) {
		self.model.set_source(Some(self.source.clone() as Rc<dyn ContactSource>));
	}

	fn keys(&self) -> Vec<i64> {
		self.model.keys().into_iter().map(ContactKey::get).collect()
	}

	fn take_events(&self) -> Vec<ModelEvent> {
		std::mem::take(&mut *self.events.borrow_mut())
	}
}

#[test]
fn scenario_two_contacts_sorted_by_name() {
	let harness = Harness::new([ContactRecord::new(7, "Bob", "Z"), ContactRecord::new(3, "Ann", "A")]);
	harness.bind();
	assert_eq!(harness.keys(), [3, 7]);
}

#[test]
fn scenario_duplicate_names_keep_source_order() {
	let harness = Harness::new([ContactRecord::new(1, "Sam", "K"), ContactRecord::new(2, "Sam", "K")]);
	harness.bind();
	assert_eq!(harness.keys(), [1, 2]);
}

#[test]
fn scenario_unbinding_clears_rows() {
	let harness = Harness::new([ContactRecord::new(7, "Bob", "Z"), ContactRecord::new(3, "Ann", "A")]);
	harness.bind();
	harness.take_events();

	harness.model.set_source(None);

	assert_eq!(harness.model.count(), 0);
	assert!(harness.take_events().contains(&ModelEvent::Reset));
}

#[test]
fn scenario_recheck_without_login_never_fetches() {
	let harness = Harness::new([ContactRecord::new(1, "Ann", "A")]);
	harness.bind();

	harness.model.recheck();
	harness.queue.run_pending();

	assert_eq!(harness.source.fetch_requests(), 0);
}

#[test]
fn login_flow_fetches_and_settles() {
	let harness = Harness::new([ContactRecord::new(10, "Cached", "Contact")]);
	harness.source.stage_remote([
		ContactRecord::new(20, "Zoe", "Y"),
		ContactRecord::new(21, "Abe", "L"),
		ContactRecord::new(10, "Cached", "Contact"),
	]);
	harness.bind();
	assert_eq!(harness.keys(), [10]);
	assert!(harness.model.is_initializing());
	harness.take_events();

	harness.source.set_authenticated(true);
	assert!(harness.take_events().is_empty());

	harness.queue.run_pending();

	assert_eq!(harness.source.fetch_requests(), 1);
	assert_eq!(harness.keys(), [21, 10, 20]);
	assert!(!harness.model.is_initializing());
	assert_eq!(
		harness.take_events(),
		[
			ModelEvent::Reset,
			ModelEvent::Inserted { first: 0, last: 0 },
			ModelEvent::Inserted { first: 1, last: 1 },
			ModelEvent::Inserted { first: 2, last: 2 },
			ModelEvent::InitializingChanged,
		]
	);
}

#[test]
fn lost_fetch_leaves_model_initializing() {
	let harness = Harness::new([ContactRecord::new(1, "Ann", "A")]);
	harness.source.set_authenticated(true);
	harness.bind();

	harness.queue.run_pending();

	assert_eq!(harness.source.fetch_requests(), 1);
	assert!(harness.model.is_initializing());
}

#[test]
fn explicit_refresh_reports_initializing_until_next_pass() {
	let harness = Harness::new([ContactRecord::new(1, "Ann", "A")]);
	harness.bind();
	harness.source.upsert(ContactRecord::new(2, "Bob", "B"));
	assert!(!harness.model.is_initializing());

	harness.model.refresh();
	assert!(harness.model.is_initializing());

	harness.source.remove(ContactKey(1));
	assert!(!harness.model.is_initializing());
	assert_eq!(harness.keys(), [2]);
}
