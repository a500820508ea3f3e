//! Drives the contacts model through a fixture's session.

use std::cell::RefCell;
use std::rc::Rc;

use roster_model::{ContactRecord, ContactSource, ContactsModel, MemorySource, ModelEvent, Result, WorkQueue};
use tracing::info;

use crate::fixture::Fixture;

/// Final state of one replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
	/// Rows in model order.
	pub rows: Vec<ContactRecord>,
	/// Every notification the model published.
	pub events: Vec<ModelEvent>,
	pub initializing: bool,
	pub fetch_requests: usize,
	/// Deferred tasks executed across all queue pumps.
	pub tasks_run: usize,
}

/// Binds a model to an in-memory source built from `fixture`, pumps the work
/// queue, optionally logs in and pumps again, then reads back every row.
pub fn replay(fixture: &Fixture) -> Result<Replay> {
	let queue = Rc::new(WorkQueue::new());
	let source = MemorySource::with_contacts(queue.clone(), fixture.contacts.iter().cloned());
	source.set_authenticated(fixture.session.authenticated);
	if let Some(remote) = &fixture.remote {
		source.stage_remote(remote.iter().cloned());
	}

	let model = ContactsModel::new(queue.clone());
	let events = Rc::new(RefCell::new(Vec::new()));
	let sink = events.clone();
	model.subscribe(move |event| sink.borrow_mut().push(*event));

	model.set_source(Some(source.clone() as Rc<dyn ContactSource>));
	info!(rows = model.count(), "bound cached roster");
	let mut tasks_run = queue.run_pending();

	if fixture.session.login_after_start && !source.is_authenticated() {
		info!("logging in");
		source.set_authenticated(true);
		tasks_run += queue.run_pending();
	}

	let rows = (0..model.count()).map(|row| model.item_at(row)).collect::<Result<Vec<_>>>()?;
	info!(rows = rows.len(), initializing = model.is_initializing(), "replay finished");

	let events = events.borrow().clone();
	Ok(Replay {
		rows,
		events,
		initializing: model.is_initializing(),
		fetch_requests: source.fetch_requests(),
		tasks_run,
	})
}

#[cfg(test)]
mod tests {
	use std::path::Path;

	use pretty_assertions::assert_eq;
	use roster_model::ModelEvent;

	use super::replay;
	use crate::fixture::Fixture;

	fn keys(rows: &[roster_model::ContactRecord]) -> Vec<i64> {
		rows.iter().map(|record| record.key.get()).collect()
	}

	#[test]
	fn sample_logs_in_and_adopts_remote_roster() {
		let fixture = Fixture::parse(include_str!("../fixtures/sample.toml"), Path::new("sample.toml")).expect("sample parses");

		let replay = replay(&fixture).expect("replay succeeds");

		assert_eq!(keys(&replay.rows), [3, 7, 12, 11]);
		assert_eq!(replay.fetch_requests, 1);
		assert_eq!(replay.tasks_run, 2);
		assert!(!replay.initializing);
		assert_eq!(replay.events.last(), Some(&ModelEvent::InitializingChanged));
		let resets = replay.events.iter().filter(|event| **event == ModelEvent::Reset).count();
		assert_eq!(resets, 2);
	}

	#[test]
	fn offline_session_keeps_cached_roster() {
		let fixture = Fixture::parse(
			"[[contacts]]\nkey = 2\nfirst_name = \"Zed\"\nlast_name = \"Q\"\n\n[[contacts]]\nkey = 1\nfirst_name = \"Amy\"\nlast_name = \"Q\"\n",
			Path::new("offline.toml"),
		)
		.expect("fixture parses");

		let replay = replay(&fixture).expect("replay succeeds");

		assert_eq!(keys(&replay.rows), [1, 2]);
		assert_eq!(replay.fetch_requests, 0);
		assert!(replay.initializing);
		assert_eq!(replay.events.last(), Some(&ModelEvent::SourceChanged));
	}
}
