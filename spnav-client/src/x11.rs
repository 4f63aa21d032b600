use std::os::fd::{AsRawFd, RawFd};
use std::rc::Rc;

use crate::SpnavError;
use crate::relay::{AtomId, ClientMessage, EventStash, WindowEvent, WindowId, WindowSystem};

/// [`WindowSystem`] on top of the application's xcb connection.
///
/// Client messages are delivered to the connection owning the window, so the
/// relay shares the application's connection rather than opening its own.
/// An application running its own event loop on that connection reads through
/// [`XcbDisplay::poll_for_event`] on a clone, which first hands back the
/// events `remove_events` had to take off the connection.
#[derive(Clone)]
pub struct XcbDisplay {
	conn: Rc<xcb::Connection>,
	root: WindowId,
	pending: EventStash<xcb::GenericEvent>,
}

fn x_error(err: xcb::GenericError) -> SpnavError {
	SpnavError::X11 {
		code: err.error_code(),
	}
}

fn client_message(event: &xcb::GenericEvent) -> Option<ClientMessage> {
	if event.response_type() & !0x80 != xcb::CLIENT_MESSAGE {
		return None;
	}
	let event: &xcb::ClientMessageEvent = unsafe { xcb::cast_event(event) };
	let mut data = [0i16; 10];
	for (slot, value) in data.iter_mut().zip(event.data().data16()) {
		*slot = *value as i16;
	}
	Some(ClientMessage {
		window: event.window(),
		message_type: event.type_(),
		format: event.format(),
		data,
	})
}

fn to_window_event(event: &xcb::GenericEvent) -> WindowEvent {
	client_message(event).map_or(WindowEvent::Other, WindowEvent::Client)
}

impl XcbDisplay {
	pub fn new(conn: Rc<xcb::Connection>, screen_num: i32) -> Result<Self, SpnavError> {
		let root = conn
			.get_setup()
			.roots()
			.nth(screen_num as usize)
			.map(|screen| screen.root())
			.ok_or(SpnavError::InvalidArgument("no such screen"))?;
		Ok(Self {
			conn,
			root,
			pending: EventStash::new(),
		})
	}

	/// Opens a connection of its own. Only useful when the window was also
	/// created on it.
	pub fn connect() -> Result<Self, SpnavError> {
		let (conn, screen_num) = xcb::Connection::connect(None)
			.map_err(|err| SpnavError::Io(std::io::Error::other(format!("{err:?}"))))?;
		Self::new(Rc::new(conn), screen_num)
	}

	pub fn connection(&self) -> &Rc<xcb::Connection> {
		&self.conn
	}

	/// Next event for the application, set-aside events first.
	pub fn poll_for_event(&self) -> Option<xcb::GenericEvent> {
		self.pending.pop().or_else(|| self.conn.poll_for_event())
	}

	/// Blocking counterpart of [`XcbDisplay::poll_for_event`].
	pub fn wait_for_event(&self) -> Option<xcb::GenericEvent> {
		self.pending.pop().or_else(|| self.conn.wait_for_event())
	}
}

impl WindowSystem for XcbDisplay {
	fn connection_fd(&self) -> RawFd {
		self.conn.as_raw_fd()
	}

	fn root_window(&self) -> WindowId {
		self.root
	}

	fn lookup_atom(&self, name: &str) -> Result<Option<AtomId>, SpnavError> {
		let atom = xcb::intern_atom(&self.conn, true, name)
			.get_reply()
			.map_err(x_error)?
			.atom();
		Ok((atom != xcb::ATOM_NONE).then_some(atom))
	}

	fn window_property(&self, window: WindowId, property: AtomId) -> Result<Option<u32>, SpnavError> {
		let reply = xcb::get_property(&self.conn, false, window, property, xcb::ATOM_ANY, 0, 1)
			.get_reply()
			.map_err(x_error)?;
		if reply.format() != 32 {
			return Ok(None);
		}
		Ok(reply.value::<u32>().first().copied())
	}

	fn window_name(&self, window: WindowId) -> Result<Option<String>, SpnavError> {
		let reply = xcb::get_property(
			&self.conn,
			false,
			window,
			xcb::ATOM_WM_NAME,
			xcb::ATOM_ANY,
			0,
			64,
		)
		.get_reply();
		match reply {
			Ok(reply) if reply.format() == 8 => Ok(Some(
				String::from_utf8_lossy(reply.value::<u8>()).into_owned(),
			)),
			Ok(_) => Ok(None),
			// The window may already be gone.
			Err(err) if err.error_code() == crate::relay::BAD_WINDOW => Ok(None),
			Err(err) => Err(x_error(err)),
		}
	}

	fn send_client_message(
		&mut self,
		destination: WindowId,
		message: &ClientMessage,
	) -> Result<(), SpnavError> {
		let mut data = [0u16; 10];
		for (slot, value) in data.iter_mut().zip(message.data) {
			*slot = value as u16;
		}
		let event = xcb::ClientMessageEvent::new(
			message.format,
			message.window,
			message.message_type,
			xcb::ClientMessageData::from_data16(data),
		);
		xcb::send_event_checked(&self.conn, false, destination, 0, &event)
			.request_check()
			.map_err(x_error)
	}

	fn poll_event(&mut self) -> Result<Option<WindowEvent>, SpnavError> {
		Ok(self.poll_for_event().map(|event| to_window_event(&event)))
	}

	fn wait_event(&mut self) -> Result<WindowEvent, SpnavError> {
		match self.wait_for_event() {
			Some(event) => Ok(to_window_event(&event)),
			None => Err(SpnavError::Io(std::io::Error::new(
				std::io::ErrorKind::ConnectionAborted,
				"X connection lost",
			))),
		}
	}

	fn check_message(
		&mut self,
		accept: &mut dyn FnMut(&ClientMessage) -> bool,
	) -> Result<Option<ClientMessage>, SpnavError> {
		let conn = &self.conn;
		Ok(self
			.pending
			.check(|| conn.poll_for_event(), client_message, accept))
	}
}
