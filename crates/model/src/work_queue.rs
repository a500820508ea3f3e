//! Deferred task queue for the host's event thread.
//!
//! Callbacks that must not run inside the call stack that triggered them are
//! posted here and executed when the host pumps the queue.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

/// Deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

struct QueuedTask {
	label: &'static str,
	seq: u64,
	task: Task,
}

/// FIFO queue of deferred tasks.
///
/// Shared as `Rc<WorkQueue>` between the host, models and sources. No borrow
/// is held while a task runs, so tasks may post further work.
#[derive(Default)]
pub struct WorkQueue {
	seq_next: Cell<u64>,
	queue: RefCell<VecDeque<QueuedTask>>,
}

impl fmt::Debug for WorkQueue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WorkQueue")
			.field("seq_next", &self.seq_next.get())
			.field("pending", &self.pending_labels())
			.finish()
	}
}

impl WorkQueue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Enqueues one task and returns its sequence number.
	pub fn post(&self, label: &'static str, task: impl FnOnce() + 'static) -> u64 {
		let seq = self.seq_next.get();
		self.seq_next.set(seq.wrapping_add(1));
		self.queue.borrow_mut().push_back(QueuedTask {
			label,
			seq,
			task: Box::new(task),
		});
		tracing::trace!(label, seq, "work_queue.post");
		seq
	}

	/// Runs the oldest queued task. Returns false when the queue was empty.
	pub fn run_next(&self) -> bool {
		let Some(item) = self.queue.borrow_mut().pop_front() else {
			return false;
		};
		tracing::trace!(label = item.label, seq = item.seq, "work_queue.run");
		(item.task)();
		true
	}

	/// Runs tasks until the queue is empty, including tasks posted meanwhile.
	pub fn run_pending(&self) -> usize {
		let mut ran = 0;
		while self.run_next() {
			ran += 1;
		}
		ran
	}

	/// Labels of queued tasks in FIFO order.
	pub fn pending_labels(&self) -> Vec<&'static str> {
		self.queue.borrow().iter().map(|item| item.label).collect()
	}

	pub fn len(&self) -> usize {
		self.queue.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.queue.borrow().is_empty()
	}
}
