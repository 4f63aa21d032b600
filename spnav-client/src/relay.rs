//! Window system relay transport.
//!
//! Daemons compatible with the Magellan X11 protocol publish their control
//! window in the `CommandEvent` property of the root window. Clients register
//! by sending that window a format-16 client message, and receive motion and
//! button input as client messages addressed to their own window.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::os::fd::RawFd;
use std::rc::Rc;

use spnav_protocol::{Event, EventKind};

use crate::transport::Transport;
use crate::{EventFilter, SpnavError};

pub type WindowId = u32;
pub type AtomId = u32;

pub const DAEMON_WINDOW_NAME: &str = "Magellan Window";
pub const CMD_APP_WINDOW: i16 = 27695;
pub const CMD_APP_SENS: i16 = 27696;
/// X protocol error code of `BadWindow`.
pub const BAD_WINDOW: u8 = 3;

/// A format-16 client message as seen by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMessage {
	pub window: WindowId,
	pub message_type: AtomId,
	pub format: u8,
	pub data: [i16; 10],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
	Client(ClientMessage),
	/// Anything that is not a client message.
	Other,
}

/// The slice of an X server connection the relay needs.
pub trait WindowSystem {
	fn connection_fd(&self) -> RawFd;

	fn root_window(&self) -> WindowId;

	/// Looks an atom up without creating it.
	fn lookup_atom(&self, name: &str) -> Result<Option<AtomId>, SpnavError>;

	/// First 32-bit item of `property` on `window`.
	fn window_property(&self, window: WindowId, property: AtomId)
	-> Result<Option<u32>, SpnavError>;

	fn window_name(&self, window: WindowId) -> Result<Option<String>, SpnavError>;

	/// Sends `message` to `destination` and waits for the server to process
	/// it. X errors come back as [`SpnavError::X11`].
	fn send_client_message(
		&mut self,
		destination: WindowId,
		message: &ClientMessage,
	) -> Result<(), SpnavError>;

	fn poll_event(&mut self) -> Result<Option<WindowEvent>, SpnavError>;

	fn wait_event(&mut self) -> Result<WindowEvent, SpnavError>;

	/// Removes and returns the first queued client message accepted by
	/// `accept`, without blocking. Other queued events must stay available
	/// to the application.
	fn check_message(
		&mut self,
		accept: &mut dyn FnMut(&ClientMessage) -> bool,
	) -> Result<Option<ClientMessage>, SpnavError>;
}

/// Events taken off a connection shared with the application while looking
/// for daemon messages. Clones share the same queue, so the application keeps
/// one and reads its events back from it before polling the connection.
pub struct EventStash<E>(Rc<RefCell<VecDeque<E>>>);

impl<E> Clone for EventStash<E> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<E> Default for EventStash<E> {
	fn default() -> Self {
		Self(Rc::default())
	}
}

impl<E> std::fmt::Debug for EventStash<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventStash")
			.field("len", &self.len())
			.finish()
	}
}

impl<E> EventStash<E> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn pop(&self) -> Option<E> {
		self.0.borrow_mut().pop_front()
	}

	pub fn len(&self) -> usize {
		self.0.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Moves everything `incoming` yields into the stash, then removes and
	/// returns the first client message accepted by `accept`. Every other
	/// event stays stashed in arrival order.
	pub fn check(
		&self,
		mut incoming: impl FnMut() -> Option<E>,
		as_message: impl Fn(&E) -> Option<ClientMessage>,
		accept: &mut dyn FnMut(&ClientMessage) -> bool,
	) -> Option<ClientMessage> {
		let mut queue = self.0.borrow_mut();
		while let Some(event) = incoming() {
			queue.push_back(event);
		}
		let (i, message) = queue
			.iter()
			.enumerate()
			.find_map(|(i, event)| as_message(event).filter(|m| accept(m)).map(|m| (i, m)))?;
		queue.remove(i);
		Some(message)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayAtoms {
	pub motion: AtomId,
	pub button_press: AtomId,
	pub button_release: AtomId,
	pub command: AtomId,
}

impl RelayAtoms {
	/// Resolves the daemon atoms. They only exist once a daemon has created
	/// them, so a missing one means no daemon is running.
	pub fn resolve(display: &impl WindowSystem) -> Result<Self, SpnavError> {
		let lookup = |name| {
			display
				.lookup_atom(name)?
				.filter(|atom| *atom != 0)
				.ok_or(SpnavError::DaemonNotRunning)
		};
		Ok(Self {
			motion: lookup("MotionEvent")?,
			button_press: lookup("ButtonPressEvent")?,
			button_release: lookup("ButtonReleaseEvent")?,
			command: lookup("CommandEvent")?,
		})
	}

	fn kind_of(&self, message_type: AtomId) -> Option<EventKind> {
		if message_type == self.motion {
			Some(EventKind::Motion)
		} else if message_type == self.button_press || message_type == self.button_release {
			Some(EventKind::Button)
		} else {
			None
		}
	}

	/// Decodes a daemon client message. Only motion and button input travel
	/// over the relay.
	pub fn decode(&self, message: &ClientMessage) -> Option<Event> {
		let s = &message.data;
		match self.kind_of(message.message_type)? {
			EventKind::Motion => Some(Event::Motion {
				x: s[2] as i32,
				y: s[3] as i32,
				z: s[4] as i32,
				rx: s[5] as i32,
				ry: s[6] as i32,
				rz: s[7] as i32,
				period: s[8] as u32,
			}),
			_ => Some(Event::Button {
				press: message.message_type == self.button_press,
				bnum: s[2] as i32,
			}),
		}
	}
}

/// Transport relaying input through the X server.
pub struct RelayTransport<W: WindowSystem> {
	display: W,
	atoms: RelayAtoms,
	app_window: WindowId,
}

impl<W: WindowSystem> RelayTransport<W> {
	#[tracing::instrument(level = "debug", skip(display))]
	pub fn open(display: W, window: WindowId) -> Result<Self, SpnavError> {
		let atoms = RelayAtoms::resolve(&display)?;
		let mut transport = Self {
			display,
			atoms,
			app_window: window,
		};
		transport.register_window(window)?;
		tracing::debug!(window, "registered with the daemon window");
		Ok(transport)
	}

	pub fn atoms(&self) -> &RelayAtoms {
		&self.atoms
	}

	pub fn display(&self) -> &W {
		&self.display
	}

	pub fn app_window(&self) -> WindowId {
		self.app_window
	}

	/// The daemon control window, checked by title so a stale property left
	/// behind by a dead daemon is not trusted.
	fn daemon_window(&self) -> Result<WindowId, SpnavError> {
		let root = self.display.root_window();
		let window = self
			.display
			.window_property(root, self.atoms.command)?
			.filter(|window| *window != 0)
			.ok_or(SpnavError::DaemonNotRunning)?;
		match self.display.window_name(window)? {
			Some(name) if name == DAEMON_WINDOW_NAME => Ok(window),
			name => {
				tracing::debug!(window, ?name, "command window is not a daemon window");
				Err(SpnavError::DaemonNotRunning)
			}
		}
	}

	fn send_command(&mut self, window: WindowId, data: [i16; 3]) -> Result<(), SpnavError> {
		let daemon = self.daemon_window()?;
		let mut message = ClientMessage {
			window,
			message_type: self.atoms.command,
			format: 16,
			data: [0; 10],
		};
		message.data[..3].copy_from_slice(&data);
		match self.display.send_client_message(daemon, &message) {
			Err(SpnavError::X11 { code: BAD_WINDOW }) => {
				tracing::debug!(daemon, "daemon window went away while sending a command");
				Ok(())
			}
			Err(SpnavError::X11 { code }) => {
				tracing::warn!(code, "unexpected X error while talking to the daemon");
				Err(SpnavError::X11 { code })
			}
			other => other,
		}
	}

	fn register_window(&mut self, window: WindowId) -> Result<(), SpnavError> {
		self.send_command(
			window,
			[(window >> 16) as u16 as i16, (window & 0xffff) as u16 as i16, CMD_APP_WINDOW],
		)
	}
}

impl<W: WindowSystem> Transport for RelayTransport<W> {
	fn name(&self) -> &'static str {
		"x11 relay"
	}

	fn fd(&self) -> RawFd {
		self.display.connection_fd()
	}

	fn set_sensitivity(&mut self, sens: f64) -> Result<(), SpnavError> {
		let bits = (sens as f32).to_bits();
		self.send_command(
			self.app_window,
			[(bits & 0xffff) as u16 as i16, (bits >> 16) as u16 as i16, CMD_APP_SENS],
		)
	}

	fn poll_event(&mut self) -> Result<Option<Event>, SpnavError> {
		Ok(match self.display.poll_event()? {
			Some(WindowEvent::Client(message)) => self.atoms.decode(&message),
			_ => None,
		})
	}

	fn wait_event(&mut self) -> Result<Event, SpnavError> {
		loop {
			if let WindowEvent::Client(message) = self.display.wait_event()? {
				if let Some(event) = self.atoms.decode(&message) {
					return Ok(event);
				}
			}
		}
	}

	fn remove_events(&mut self, filter: EventFilter) -> Result<usize, SpnavError> {
		let atoms = self.atoms;
		let mut accept = |message: &ClientMessage| match (atoms.kind_of(message.message_type), filter) {
			(None, _) => false,
			(Some(_), EventFilter::Any) => true,
			(Some(kind), EventFilter::Kind(wanted)) => kind == wanted,
		};
		let mut removed = 0;
		while self.display.check_message(&mut accept)?.is_some() {
			removed += 1;
		}
		Ok(removed)
	}

	fn set_window(&mut self, window: u32) -> Result<(), SpnavError> {
		self.register_window(window)?;
		self.app_window = window;
		Ok(())
	}

	fn translate_message(&self, message: &ClientMessage) -> Option<Event> {
		self.atoms.decode(message)
	}

	fn close(mut self: Box<Self>) -> Result<(), SpnavError> {
		let root = self.display.root_window();
		tracing::debug!(root, "handing input back to the root window");
		self.register_window(root)
	}
}

#[cfg(test)]
pub(crate) mod fake {
	use std::collections::HashMap;

	use super::*;

	pub const ROOT: WindowId = 0x100;
	pub const DAEMON: WindowId = 0x2a00001;

	/// In-memory X server holding just enough state for the relay.
	#[derive(Debug, Default)]
	pub struct FakeDisplay {
		pub atoms: HashMap<String, AtomId>,
		pub properties: HashMap<(WindowId, AtomId), u32>,
		pub names: HashMap<WindowId, String>,
		/// Events still on the connection.
		pub queue: VecDeque<WindowEvent>,
		pub stash: EventStash<WindowEvent>,
		pub sent: Rc<RefCell<Vec<(WindowId, ClientMessage)>>>,
		pub send_error: Option<u8>,
	}

	impl FakeDisplay {
		/// A display with a running daemon.
		pub fn with_daemon() -> Self {
			let mut display = Self::default();
			for (i, name) in ["MotionEvent", "ButtonPressEvent", "ButtonReleaseEvent", "CommandEvent"]
				.into_iter()
				.enumerate()
			{
				display.atoms.insert(name.to_string(), 300 + i as AtomId);
			}
			display.properties.insert((ROOT, 303), DAEMON);
			display
				.names
				.insert(DAEMON, DAEMON_WINDOW_NAME.to_string());
			display
		}

		pub fn message(&self, atom: &str, data: &[i16]) -> WindowEvent {
			let mut message = ClientMessage {
				window: 0x500,
				message_type: self.atoms[atom],
				format: 16,
				data: [0; 10],
			};
			message.data[..data.len()].copy_from_slice(data);
			WindowEvent::Client(message)
		}
	}

	impl WindowSystem for FakeDisplay {
		fn connection_fd(&self) -> RawFd {
			7
		}

		fn root_window(&self) -> WindowId {
			ROOT
		}

		fn lookup_atom(&self, name: &str) -> Result<Option<AtomId>, SpnavError> {
			Ok(self.atoms.get(name).copied())
		}

		fn window_property(
			&self,
			window: WindowId,
			property: AtomId,
		) -> Result<Option<u32>, SpnavError> {
			Ok(self.properties.get(&(window, property)).copied())
		}

		fn window_name(&self, window: WindowId) -> Result<Option<String>, SpnavError> {
			Ok(self.names.get(&window).cloned())
		}

		fn send_client_message(
			&mut self,
			destination: WindowId,
			message: &ClientMessage,
		) -> Result<(), SpnavError> {
			if let Some(code) = self.send_error {
				return Err(SpnavError::X11 { code });
			}
			self.sent.borrow_mut().push((destination, *message));
			Ok(())
		}

		fn poll_event(&mut self) -> Result<Option<WindowEvent>, SpnavError> {
			Ok(self.stash.pop().or_else(|| self.queue.pop_front()))
		}

		fn wait_event(&mut self) -> Result<WindowEvent, SpnavError> {
			self.poll_event()?
				.ok_or(SpnavError::Unexpected("fake display would block"))
		}

		fn check_message(
			&mut self,
			accept: &mut dyn FnMut(&ClientMessage) -> bool,
		) -> Result<Option<ClientMessage>, SpnavError> {
			let queue = &mut self.queue;
			Ok(self.stash.check(
				|| queue.pop_front(),
				|event| match event {
					WindowEvent::Client(message) => Some(*message),
					WindowEvent::Other => None,
				},
				accept,
			))
		}
	}
}
