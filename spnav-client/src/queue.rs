use std::collections::VecDeque;

use spnav_protocol::Event;

/// FIFO of events read off the socket but not yet delivered.
#[derive(Debug, Default)]
pub struct EventQueue {
	events: VecDeque<Event>,
}

impl EventQueue {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, event: Event) {
		self.events.push_back(event);
	}

	pub fn pop(&mut self) -> Option<Event> {
		self.events.pop_front()
	}

	pub fn len(&self) -> usize {
		self.events.len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty()
	}

	/// Moves every event of `other` to the back of this queue, keeping order.
	pub fn append(&mut self, other: &mut EventQueue) {
		self.events.append(&mut other.events);
	}

	pub fn clear(&mut self) {
		self.events.clear();
	}

	pub fn iter(&self) -> impl Iterator<Item = &Event> {
		self.events.iter()
	}
}

impl Extend<Event> for EventQueue {
	fn extend<T: IntoIterator<Item = Event>>(&mut self, iter: T) {
		self.events.extend(iter);
	}
}
