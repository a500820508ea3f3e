//! Sorted contact projection.
//!
//! Keeps an ordered, de-duplicated list of contact keys in step with an
//! external [`ContactSource`], sorted by display name, and reports every
//! rebuild to observers as positional row notifications.
//!
//! Everything here is single-threaded: the model, the source and the
//! [`WorkQueue`] that carries deferred callbacks all live on the host's event
//! thread.

pub mod error;
pub mod model;
pub mod notifier;
pub mod source;
pub mod types;
pub mod work_queue;

pub use error::{ModelError, Result};
pub use model::{ContactsModel, ModelEvent, Role, RowData};
pub use notifier::{Notifier, SubscriptionId};
pub use source::memory::MemorySource;
pub use source::{ContactSource, SourceEvent};
pub use types::{ContactKey, ContactRecord};
pub use work_queue::WorkQueue;
