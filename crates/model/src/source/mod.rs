//! Contract consumed from the upstream messaging client.
//!
//! The model never owns its source. It holds a `Weak<dyn ContactSource>` and
//! talks to it only through this trait.

use crate::notifier::SubscriptionId;
use crate::types::{ContactKey, ContactRecord};

pub mod memory;


/// Events a source publishes to its subscribers. Neither carries a payload;
/// subscribers re-read whatever state they need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceEvent {
	/// The contact set may have changed.
	ContactsChanged,
	/// The session's authenticated state flipped.
	SessionAuthenticatedChanged,
}

/// Upstream contact provider.
pub trait ContactSource {
	/// Registers `callback` for one event kind.
	fn subscribe(&self, event: SourceEvent, callback: Box<dyn Fn()>) -> SubscriptionId;

	/// Drops a subscription made with [`ContactSource::subscribe`].
	fn unsubscribe(&self, id: SubscriptionId) -> bool;

	fn is_authenticated(&self) -> bool;

	/// Snapshot of every known key. Iteration order is up to the source but
	/// must not change while nothing is mutated.
	fn contact_keys(&self) -> Vec<ContactKey>;

	fn record(&self, key: ContactKey) -> Option<ContactRecord>;

	/// Asks the client to fetch contacts from the network.
	///
	/// Fire-and-forget: success shows up later as
	/// [`SourceEvent::ContactsChanged`], failure is not reported at all.
	fn request_contacts_fetch(&self);
}
