//! Error types for contacts model lookups and sync passes.

use thiserror::Error;

use crate::types::ContactKey;

/// Errors surfaced by [`ContactsModel`](crate::ContactsModel).
///
/// A missing source is only an error for row lookups; commands such as
/// `refresh` and `recheck` silently do nothing without one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
	/// No live contact source is bound.
	#[error("no contact source is bound")]
	NoSource,

	/// A row index past the end of the projection.
	#[error("row {row} is out of range (count {count})")]
	RowOutOfRange {
		/// Requested row.
		row: usize,
		/// Row count at the time of the lookup.
		count: usize,
	},

	/// The source listed a key but could not resolve its record.
	#[error("contact source has no record for key {key}")]
	MissingRecord {
		/// Key the source failed to resolve.
		key: ContactKey,
	},
}

/// Result type for contacts model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
