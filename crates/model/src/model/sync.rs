//! The sync pass: snapshot, sort, reset, re-insert.

use std::cmp::Ordering;

use super::{ContactsModel, ModelEvent};
use crate::error::{ModelError, Result};
use crate::source::ContactSource;
use crate::types::ContactKey;

struct SortEntry {
	sort_key: String,
	index: usize,
	key: ContactKey,
}

impl SortEntry {
	fn cmp_order(&self, other: &Self) -> Ordering {
		self.sort_key.cmp(&other.sort_key).then(self.index.cmp(&other.index))
	}
}

/// Orders `snapshot` by each record's sort key.
///
/// Equal sort keys keep their snapshot order. Duplicate keys in the snapshot
/// are passed through. Fails on the first key the source cannot resolve.
pub fn sorted_keys(source: &dyn ContactSource, snapshot: &[ContactKey]) -> Result<Vec<ContactKey>> {
	let mut entries = Vec::with_capacity(snapshot.len());
	for (index, &key) in snapshot.iter().enumerate() {
		let record = source.record(key).ok_or(ModelError::MissingRecord { key })?;
		entries.push(SortEntry {
			sort_key: record.sort_key(),
			index,
			key,
		});
	}
	entries.sort_unstable_by(SortEntry::cmp_order);
	Ok(entries.into_iter().map(|entry| entry.key).collect())
}

impl ContactsModel {
	/// Rebuilds the list from the bound source. Returns the number of rows.
	///
	/// Publishes exactly one [`ModelEvent::Reset`], then one
	/// [`ModelEvent::Inserted`] per row in ascending row order, then
	/// [`ModelEvent::InitializingChanged`] after clearing the flag. Each row is
	/// already stored when its insert notification goes out, and no borrow is
	/// held, so observers may read the model.
	///
	/// Without a source this does nothing. If the source lists a key it cannot
	/// resolve, the pass fails with [`ModelError::MissingRecord`] before the
	/// list is touched.
	///
	/// An observer that starts another pass or rebinds the model while this
	/// pass is publishing stops this pass: it inserts no further rows and
	/// leaves the initializing flag to the newer pass.
	pub fn sync(&self) -> Result<usize> {
		let Some(source) = self.source() else {
			return Ok(0);
		};

		let snapshot = source.contact_keys();
		let sorted = sorted_keys(source.as_ref(), &snapshot)?;

		let epoch = self.inner.state.borrow_mut().begin_pass();
		self.emit(ModelEvent::Reset);
		if self.superseded(epoch) {
			return Ok(self.count());
		}

		let mut skipped = 0usize;
		for key in sorted {
			let row = self.inner.state.borrow_mut().push_row(key);
			match row {
				Some(row) => self.emit(ModelEvent::Inserted { first: row, last: row }),
				None => skipped += 1,
			}
			if self.superseded(epoch) {
				tracing::debug!("contacts_model.sync: superseded by an observer, stopping");
				return Ok(self.count());
			}
		}

		let rows = {
			let mut state = self.inner.state.borrow_mut();
			state.initializing = false;
			state.passes += 1;
			state.contacts.len()
		};
		tracing::debug!(snapshot = snapshot.len(), rows, skipped, "contacts_model.sync");
		self.emit(ModelEvent::InitializingChanged);

		Ok(rows)
	}

	/// True once the rows were rebuilt or rebound after `epoch` was taken.
	fn superseded(&self, epoch: u64) -> bool {
		self.inner.state.borrow().epoch != epoch
	}
}
