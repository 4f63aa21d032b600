use std::os::fd::RawFd;

use spnav_protocol::{Event, Record, RequestKind};

use crate::relay::ClientMessage;
use crate::{EventFilter, SpnavError};

/// Capability set shared by the socket and window relay transports.
///
/// Request/response calls default to [`SpnavError::Unsupported`] so a
/// transport that cannot carry them fails without touching the wire.
pub trait Transport {
	fn name(&self) -> &'static str;

	/// Descriptor to multiplex on in the application's own event loop.
	fn fd(&self) -> RawFd;

	/// Negotiated protocol version, 0 when no request/response is possible.
	fn protocol(&self) -> u32 {
		0
	}

	fn set_sensitivity(&mut self, sens: f64) -> Result<(), SpnavError>;

	/// Returns a pending event without blocking.
	fn poll_event(&mut self) -> Result<Option<Event>, SpnavError>;

	/// Blocks until an event arrives.
	fn wait_event(&mut self) -> Result<Event, SpnavError>;

	/// Drops every pending event matching `filter`, returning how many went.
	fn remove_events(&mut self, filter: EventFilter) -> Result<usize, SpnavError>;

	fn request(&mut self, _request: Record) -> Result<Record, SpnavError> {
		Err(SpnavError::Unsupported("request/response"))
	}

	/// Issues a query whose answer is a chunked string.
	fn request_string(&mut self, _kind: RequestKind) -> Result<Vec<u8>, SpnavError> {
		Err(SpnavError::Unsupported("string queries"))
	}

	fn send_string(&mut self, _kind: RequestKind, _value: &[u8]) -> Result<(), SpnavError> {
		Err(SpnavError::Unsupported("string requests"))
	}

	/// Points the daemon at another application window.
	fn set_window(&mut self, _window: u32) -> Result<(), SpnavError> {
		Err(SpnavError::Unsupported("window registration"))
	}

	/// Decodes a client message the application pulled off its own queue.
	fn translate_message(&self, _message: &ClientMessage) -> Option<Event> {
		None
	}

	fn close(self: Box<Self>) -> Result<(), SpnavError>;
}
