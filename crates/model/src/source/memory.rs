//! In-memory [`ContactSource`] for hosts without a network client, the CLI
//! and tests.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::{ContactSource, SourceEvent};
use crate::notifier::{Notifier, SubscriptionId};
use crate::types::{ContactKey, ContactRecord};
use crate::work_queue::WorkQueue;

#[derive(Debug, Default)]
struct MemoryState {
	authenticated: bool,
	contacts: IndexMap<ContactKey, ContactRecord>,
	remote: Option<Vec<ContactRecord>>,
	fetch_requests: usize,
}

/// Contact set kept in insertion order.
///
/// Local mutations publish [`SourceEvent::ContactsChanged`] immediately. A
/// fetch is simulated by posting a task on the shared [`WorkQueue`] that swaps
/// in the contact set staged with [`MemorySource::stage_remote`].
pub struct MemorySource {
	me: Weak<Self>,
	queue: Rc<WorkQueue>,
	events: Notifier<SourceEvent>,
	state: RefCell<MemoryState>,
}

impl fmt::Debug for MemorySource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemorySource")
			.field("state", &self.state.borrow())
			.field("subscribers", &self.events.len())
			.finish()
	}
}

impl MemorySource {
	pub fn new(queue: Rc<WorkQueue>) -> Rc<Self> {
		Rc::new_cyclic(|me| Self {
			me: me.clone(),
			queue,
			events: Notifier::new(),
			state: RefCell::default(),
		})
	}

	/// Creates a source pre-populated with `records`, without publishing.
	pub fn with_contacts(queue: Rc<WorkQueue>, records: impl IntoIterator<Item = ContactRecord>) -> Rc<Self> {
		let source = Self::new(queue);
		source.state.borrow_mut().contacts = records.into_iter().map(|record| (record.key, record)).collect();
		source
	}

	pub fn set_authenticated(&self, authenticated: bool) {
		let previous = std::mem::replace(&mut self.state.borrow_mut().authenticated, authenticated);
		if previous != authenticated {
			tracing::debug!(authenticated, "memory_source.session");
			self.events.emit(&SourceEvent::SessionAuthenticatedChanged);
		}
	}

	/// Inserts or replaces one record. A replaced record keeps its position.
	pub fn upsert(&self, record: ContactRecord) {
		self.state.borrow_mut().contacts.insert(record.key, record);
		self.publish_contacts();
	}

	pub fn remove(&self, key: ContactKey) -> Option<ContactRecord> {
		let removed = self.state.borrow_mut().contacts.shift_remove(&key);
		if removed.is_some() {
			self.publish_contacts();
		}
		removed
	}

	/// Replaces the whole contact set.
	pub fn replace_all(&self, records: impl IntoIterator<Item = ContactRecord>) {
		self.state.borrow_mut().contacts = records.into_iter().map(|record| (record.key, record)).collect();
		self.publish_contacts();
	}

	/// Stages the contact set the next completed fetch delivers.
	pub fn stage_remote(&self, records: impl IntoIterator<Item = ContactRecord>) {
		self.state.borrow_mut().remote = Some(records.into_iter().collect());
	}

	pub fn has_staged_remote(&self) -> bool {
		self.state.borrow().remote.is_some()
	}

	/// Number of fetches requested since creation.
	pub fn fetch_requests(&self) -> usize {
		self.state.borrow().fetch_requests
	}

	pub fn subscriber_count(&self) -> usize {
		self.events.len()
	}

	pub fn len(&self) -> usize {
		self.state.borrow().contacts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.borrow().contacts.is_empty()
	}

	fn publish_contacts(&self) {
		self.events.emit(&SourceEvent::ContactsChanged);
	}

	fn complete_fetch(&self) {
		let Some(remote) = self.state.borrow_mut().remote.take() else {
			tracing::debug!("memory_source.fetch: nothing staged, request dropped");
			return;
		};
		tracing::debug!(contacts = remote.len(), "memory_source.fetch: delivered");
		self.replace_all(remote);
	}
}

impl ContactSource for MemorySource {
	fn subscribe(&self, event: SourceEvent, callback: Box<dyn Fn()>) -> SubscriptionId {
		self.events.subscribe(move |fired| {
			if *fired == event {
				callback();
			}
		})
	}

	fn unsubscribe(&self, id: SubscriptionId) -> bool {
		self.events.unsubscribe(id)
	}

	fn is_authenticated(&self) -> bool {
		self.state.borrow().authenticated
	}

	fn contact_keys(&self) -> Vec<ContactKey> {
		self.state.borrow().contacts.keys().copied().collect()
	}

	fn record(&self, key: ContactKey) -> Option<ContactRecord> {
		self.state.borrow().contacts.get(&key).cloned()
	}

	fn request_contacts_fetch(&self) {
		let requests = {
			let mut state = self.state.borrow_mut();
			state.fetch_requests += 1;
			state.fetch_requests
		};
		tracing::debug!(requests, "memory_source.fetch: requested");
		let me = self.me.clone();
		self.queue.post("memory_source.fetch", move || {
			if let Some(source) = me.upgrade() {
				source.complete_fetch();
			}
		});
	}
}
