//! Shared lifecycle-counting helper for the integration tests.

use cambium::{many, Component};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct Counters {
	pub attached: Rc<Cell<i32>>,
	pub detached: Rc<Cell<i32>>,
	pub updated: Rc<Cell<i32>>,
}

impl Counters {
	pub fn live(&self) -> i32 {
		self.attached.get() - self.detached.get()
	}
}

/// A transparent component that renders its children unchanged while
/// counting its own lifecycle transitions into `counters`.
pub fn tracker(counters: &Counters) -> Component {
	let attached = counters.attached.clone();
	let detached = counters.detached.clone();
	let updated = counters.updated.clone();
	Component::new("tracker", move |cx| {
		let attached = attached.clone();
		let detached = detached.clone();
		let updated = updated.clone();
		cx.on_attached(move |_| attached.set(attached.get() + 1));
		cx.on_detached(move |_| detached.set(detached.get() + 1));
		cx.on_updated(move |_| updated.set(updated.get() + 1));
		match cx.children() {
			[only] => only.clone(),
			children => many(children.to_vec()),
		}
	})
}

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
