//! Single-threaded subscriber lists.
//!
//! A [`Notifier`] fans one event out to every live subscriber. Emission works
//! on a snapshot of the subscriber list, so callbacks may subscribe,
//! unsubscribe or emit again without tripping a `RefCell` borrow.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use slab::Slab;
use smallvec::SmallVec;

/// Handle returned by [`Notifier::subscribe`].
///
/// Slots are reused after removal; the generation keeps a stale handle from
/// removing whoever took the slot next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
	slot: usize,
	generation: u64,
}

struct Subscriber<E> {
	generation: u64,
	callback: Rc<dyn Fn(&E)>,
}

pub struct Notifier<E> {
	slots: RefCell<Slab<Subscriber<E>>>,
	generation_next: Cell<u64>,
}

impl<E> Default for Notifier<E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E> fmt::Debug for Notifier<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Notifier").field("subscribers", &self.len()).finish()
	}
}

impl<E> Notifier<E> {
	pub fn new() -> Self {
		Self {
			slots: RefCell::new(Slab::new()),
			generation_next: Cell::new(0),
		}
	}

	/// Registers a callback and returns the handle that removes it.
	pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> SubscriptionId {
		let generation = self.generation_next.get();
		self.generation_next.set(generation.wrapping_add(1));
		let slot = self.slots.borrow_mut().insert(Subscriber {
			generation,
			callback: Rc::new(callback),
		});
		tracing::trace!(slot, generation, "notifier.subscribe");
		SubscriptionId { slot, generation }
	}

	/// Removes a subscriber. Returns false for unknown or already removed handles.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut slots = self.slots.borrow_mut();
		match slots.get(id.slot) {
			Some(subscriber) if subscriber.generation == id.generation => {
				slots.remove(id.slot);
				tracing::trace!(slot = id.slot, generation = id.generation, "notifier.unsubscribe");
				true
			}
			_ => false,
		}
	}

	pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
		self.slots.borrow().get(id.slot).is_some_and(|subscriber| subscriber.generation == id.generation)
	}

	/// Delivers `event` to subscribers in subscription order.
	///
	/// Subscribers added during emission are not called for this event.
	/// Subscribers removed during emission are skipped if not yet reached.
	pub fn emit(&self, event: &E) {
		let mut snapshot: SmallVec<[(SubscriptionId, Rc<dyn Fn(&E)>); 4]> = self
			.slots
			.borrow()
			.iter()
			.map(|(slot, subscriber)| {
				(
					SubscriptionId {
						slot,
						generation: subscriber.generation,
					},
					subscriber.callback.clone(),
				)
			})
			.collect();
		snapshot.sort_unstable_by_key(|(id, _)| id.generation);

		for (id, callback) in snapshot {
			if self.is_subscribed(id) {
				callback(event);
			}
		}
	}

	pub fn len(&self) -> usize {
		self.slots.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.borrow().is_empty()
	}
}
