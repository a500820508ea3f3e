//! Sorted contacts list model.
//!
//! [`ContactsModel`] mirrors a [`ContactSource`] as a list of keys ordered by
//! display name. Every sync pass is published as one [`ModelEvent::Reset`]
//! followed by one [`ModelEvent::Inserted`] per row, in row order, so
//! position-keyed observers can replay the list without diffing.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashSet;
use smallvec::{SmallVec, smallvec};

use crate::error::{ModelError, Result};
use crate::notifier::{Notifier, SubscriptionId};
use crate::source::{ContactSource, SourceEvent};
use crate::types::{ContactKey, ContactRecord};
use crate::work_queue::WorkQueue;

mod sync;


pub use sync::sorted_keys;

/// Notifications published to model observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEvent {
	/// The bound source was replaced or cleared.
	SourceChanged,
	/// [`ContactsModel::is_initializing`] was written.
	InitializingChanged,
	/// All rows were removed.
	Reset,
	/// Rows `first..=last` were inserted. Sync passes insert one row at a time.
	Inserted { first: usize, last: usize },
}

/// Named per-row fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
	/// The full contact record for the row's key.
	Item,
}

impl Role {
	pub const ALL: [Role; 1] = [Role::Item];

	pub const fn name(self) -> &'static str {
		match self {
			Role::Item => "item",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|role| role.name() == name)
	}
}

static ROLE_NAMES: [(Role, &str); 1] = [(Role::Item, Role::Item.name())];

/// Value of one [`Role`] for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowData {
	Item(ContactRecord),
}

struct SourceBinding {
	source: Weak<dyn ContactSource>,
	subscriptions: SmallVec<[SubscriptionId; 2]>,
}

impl SourceBinding {
	fn is(&self, other: &Rc<dyn ContactSource>) -> bool {
		std::ptr::addr_eq(self.source.as_ptr(), Rc::as_ptr(other))
	}

	fn disconnect(self) {
		let Some(source) = self.source.upgrade() else {
			return;
		};
		for id in self.subscriptions {
			source.unsubscribe(id);
		}
	}
}

#[derive(Default)]
struct ModelState {
	binding: Option<SourceBinding>,
	contacts: Vec<ContactKey>,
	members: FxHashSet<ContactKey>,
	initializing: bool,
	passes: u64,
	/// Bumped whenever the rows are rebuilt or the binding changes.
	epoch: u64,
	/// Bumped whenever the binding changes.
	binding_epoch: u64,
}

impl ModelState {
	/// Clears the rows for a new pass and returns the pass epoch.
	fn begin_pass(&mut self) -> u64 {
		self.clear_rows();
		self.epoch = self.epoch.wrapping_add(1);
		self.epoch
	}

	fn take_binding(&mut self) -> Option<SourceBinding> {
		self.epoch = self.epoch.wrapping_add(1);
		self.binding_epoch = self.binding_epoch.wrapping_add(1);
		self.binding.take()
	}

	fn clear_rows(&mut self) {
		self.contacts.clear();
		self.members.clear();
	}

	/// Appends `key` unless already present. Returns the new row.
	fn push_row(&mut self, key: ContactKey) -> Option<usize> {
		if !self.members.insert(key) {
			return None;
		}
		self.contacts.push(key);
		Some(self.contacts.len() - 1)
	}
}

struct ModelInner {
	queue: Rc<WorkQueue>,
	events: Notifier<ModelEvent>,
	state: RefCell<ModelState>,
}

impl Drop for ModelInner {
	fn drop(&mut self) {
		if let Some(binding) = self.state.get_mut().binding.take() {
			binding.disconnect();
		}
	}
}

/// Sorted, de-duplicated projection of a contact source.
///
/// Cheap to clone; clones share the same list. Source callbacks only hold weak
/// references, so dropping the last clone disconnects from the source.
#[derive(Clone)]
pub struct ContactsModel {
	inner: Rc<ModelInner>,
}

impl fmt::Debug for ContactsModel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.borrow();
		f.debug_struct("ContactsModel")
			.field("bound", &state.binding.is_some())
			.field("contacts", &state.contacts)
			.field("initializing", &state.initializing)
			.field("passes", &state.passes)
			.finish()
	}
}

impl ContactsModel {
	/// Creates an empty, unbound model that defers session rechecks onto `queue`.
	pub fn new(queue: Rc<WorkQueue>) -> Self {
		Self {
			inner: Rc::new(ModelInner {
				queue,
				events: Notifier::new(),
				state: RefCell::default(),
			}),
		}
	}

	fn upgrade(weak: &Weak<ModelInner>) -> Option<Self> {
		weak.upgrade().map(|inner| Self { inner })
	}

	/// Live bound source. A source that has been dropped reads as unbound.
	pub fn source(&self) -> Option<Rc<dyn ContactSource>> {
		self.inner.state.borrow().binding.as_ref()?.source.upgrade()
	}

	/// Rebinds the model to `source`, or unbinds it with `None`.
	///
	/// Passing the currently bound source again does nothing. Otherwise the old
	/// source is disconnected, existing rows are dropped, the new source is
	/// connected and refreshed, and [`ModelEvent::SourceChanged`] is emitted.
	pub fn set_source(&self, source: Option<Rc<dyn ContactSource>>) {
		let unchanged = match (self.inner.state.borrow().binding.as_ref(), source.as_ref()) {
			(None, None) => true,
			(Some(binding), Some(source)) => binding.is(source),
			_ => false,
		};
		if unchanged {
			return;
		}

		let previous = self.inner.state.borrow_mut().take_binding();
		if let Some(previous) = previous {
			previous.disconnect();
		}
		self.reset_rows_if_populated();

		match &source {
			Some(source) => {
				let subscriptions = self.connect(source);
				self.inner.state.borrow_mut().binding = Some(SourceBinding {
					source: Rc::downgrade(source),
					subscriptions,
				});
				tracing::debug!("contacts_model.bind");
			}
			None => {
				tracing::debug!("contacts_model.unbind");
				self.settle_initializing();
			}
		}

		self.refresh();
		self.emit(ModelEvent::SourceChanged);
	}

	/// Unbinds the current source.
	pub fn clear_source(&self) {
		self.set_source(None);
	}

	fn connect(&self, source: &Rc<dyn ContactSource>) -> SmallVec<[SubscriptionId; 2]> {
		let weak = Rc::downgrade(&self.inner);
		let contacts = source.subscribe(
			SourceEvent::ContactsChanged,
			Box::new(move || {
				if let Some(model) = Self::upgrade(&weak) {
					model.contacts_changed();
				}
			}),
		);

		let weak = Rc::downgrade(&self.inner);
		let session = source.subscribe(
			SourceEvent::SessionAuthenticatedChanged,
			Box::new(move || {
				if let Some(model) = Self::upgrade(&weak) {
					model.schedule_recheck();
				}
			}),
		);

		smallvec![contacts, session]
	}

	/// Posts a recheck onto the work queue instead of running it inside the
	/// source's session transition. The recheck is dropped if the model was
	/// rebound before the queue ran it.
	fn schedule_recheck(&self) {
		let weak = Rc::downgrade(&self.inner);
		let binding_epoch = self.inner.state.borrow().binding_epoch;
		self.inner.queue.post("contacts_model.recheck", move || {
			let Some(model) = Self::upgrade(&weak) else {
				return;
			};
			if model.inner.state.borrow().binding_epoch != binding_epoch {
				tracing::trace!("contacts_model.recheck: binding changed, skipped");
				return;
			}
			model.recheck();
		});
	}

	/// Re-syncs from the source and requests a fresh fetch.
	///
	/// Leaves [`ContactsModel::is_initializing`] set until the next sync pass.
	pub fn refresh(&self) {
		if self.source().is_none() {
			return;
		}
		let binding_epoch = self.inner.state.borrow().binding_epoch;

		self.contacts_changed();
		if self.inner.state.borrow().binding_epoch != binding_epoch {
			return;
		}
		self.recheck();

		self.inner.state.borrow_mut().initializing = true;
		self.emit(ModelEvent::InitializingChanged);
	}

	/// Requests a contacts fetch when the source is bound and authenticated.
	pub fn recheck(&self) {
		let Some(source) = self.source() else {
			return;
		};
		if !source.is_authenticated() {
			tracing::trace!("contacts_model.recheck: session not authenticated");
			return;
		}
		tracing::debug!("contacts_model.recheck: requesting contacts fetch");
		source.request_contacts_fetch();
	}

	fn contacts_changed(&self) {
		if let Err(err) = self.sync() {
			tracing::error!(error = %err, "contacts_model.sync failed");
		}
	}

	pub fn count(&self) -> usize {
		self.inner.state.borrow().contacts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.count() == 0
	}

	pub fn key_at(&self, row: usize) -> Option<ContactKey> {
		self.inner.state.borrow().contacts.get(row).copied()
	}

	/// Snapshot of all keys in row order.
	pub fn keys(&self) -> Vec<ContactKey> {
		self.inner.state.borrow().contacts.clone()
	}

	/// Row of `key`, if present.
	pub fn row_of(&self, key: ContactKey) -> Option<usize> {
		let state = self.inner.state.borrow();
		if !state.members.contains(&key) {
			return None;
		}
		state.contacts.iter().position(|candidate| *candidate == key)
	}

	/// Resolves the record for `row` through the bound source.
	pub fn item_at(&self, row: usize) -> Result<ContactRecord> {
		let source = self.source().ok_or(ModelError::NoSource)?;
		let key = self.key_at(row).ok_or_else(|| ModelError::RowOutOfRange { row, count: self.count() })?;
		source.record(key).ok_or(ModelError::MissingRecord { key })
	}

	pub fn data(&self, row: usize, role: Role) -> Result<RowData> {
		match role {
			Role::Item => self.item_at(row).map(RowData::Item),
		}
	}

	/// Role table exposed to list bindings.
	pub fn role_names(&self) -> &'static [(Role, &'static str)] {
		&ROLE_NAMES
	}

	pub fn is_initializing(&self) -> bool {
		self.inner.state.borrow().initializing
	}

	/// Number of completed sync passes.
	pub fn passes(&self) -> u64 {
		self.inner.state.borrow().passes
	}

	pub fn subscribe(&self, observer: impl Fn(&ModelEvent) + 'static) -> SubscriptionId {
		self.inner.events.subscribe(observer)
	}

	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		self.inner.events.unsubscribe(id)
	}

	fn emit(&self, event: ModelEvent) {
		self.inner.events.emit(&event);
	}

	fn reset_rows_if_populated(&self) {
		let cleared = {
			let mut state = self.inner.state.borrow_mut();
			let populated = !state.contacts.is_empty();
			state.clear_rows();
			populated
		};
		if cleared {
			self.emit(ModelEvent::Reset);
		}
	}

	fn settle_initializing(&self) {
		let was = std::mem::replace(&mut self.inner.state.borrow_mut().initializing, false);
		if was {
			self.emit(ModelEvent::InitializingChanged);
		}
	}
}
