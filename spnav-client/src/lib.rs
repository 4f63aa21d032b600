//! Client side of the spacenav 6dof input protocol.
//!
//! A [`SpnavClient`] owns at most one transport: the daemon's unix socket
//! ([`SocketTransport`]) or the X11 client-message relay
//! ([`RelayTransport`]). Events come out as [`Event`] values; [`Pose`] turns
//! motion deltas into an absolute position and orientation.

mod c_bindings;
pub mod cfg;
mod config;
mod error;
mod events;
pub mod magellan;
pub mod pose;
mod queue;
pub mod relay;
mod socket;
mod transport;
#[cfg(feature = "x11")]
pub mod x11;

pub use cfg::{ButtonAction, DeviceType, InvertAxes, LedMode};
pub use config::{SpnavConfig, parse_socket_path};
pub use error::SpnavError;
pub use events::{EventFilter, EventMask};
pub use pose::{Mat4, Pose, Quat};
pub use queue::EventQueue;
pub use relay::{ClientMessage, EventStash, RelayTransport, WindowSystem};
pub use socket::SocketTransport;
pub use spnav_protocol::{DeviceOp, Event, EventKind};
pub use transport::Transport;

use std::os::fd::RawFd;

use spnav_protocol::{Record, RequestKind, copy_truncated};

/// Caller-owned session with the input daemon.
#[derive(Default)]
pub struct SpnavClient {
	transport: Option<Box<dyn Transport>>,
}

impl std::fmt::Debug for SpnavClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SpnavClient")
			.field("transport", &self.transport.as_ref().map(|t| t.name()))
			.finish()
	}
}

impl SpnavClient {
	const DEFAULT_BUTTONS: u32 = 2;
	const DEFAULT_AXES: u32 = 6;

	pub fn new() -> Self {
		Self::default()
	}

	/// Connects to the daemon socket, honouring `SPNAV_SOCKET` and
	/// `/etc/spnavrc`.
	pub fn open(&mut self) -> Result<(), SpnavError> {
		self.open_with(&SpnavConfig::from_env())
	}

	pub fn open_with(&mut self, config: &SpnavConfig) -> Result<(), SpnavError> {
		self.ensure_closed()?;
		let transport = SocketTransport::open(config)?;
		self.install(Box::new(transport));
		Ok(())
	}

	/// Registers `window` with a Magellan compatible daemon through the
	/// window system.
	pub fn open_relay<W: WindowSystem + 'static>(
		&mut self,
		display: W,
		window: u32,
	) -> Result<(), SpnavError> {
		self.ensure_closed()?;
		let transport = RelayTransport::open(display, window)?;
		self.install(Box::new(transport));
		Ok(())
	}

	/// Relay over the application's xcb connection. The returned display
	/// shares the relay's set-aside events; read application events through
	/// it instead of the bare connection.
	#[cfg(feature = "x11")]
	pub fn open_x11(
		&mut self,
		conn: std::rc::Rc<xcb::Connection>,
		screen_num: i32,
		window: u32,
	) -> Result<x11::XcbDisplay, SpnavError> {
		self.ensure_closed()?;
		let display = x11::XcbDisplay::new(conn, screen_num)?;
		self.open_relay(display.clone(), window)?;
		Ok(display)
	}

	/// Installs an already opened transport.
	pub fn open_transport(&mut self, transport: Box<dyn Transport>) -> Result<(), SpnavError> {
		self.ensure_closed()?;
		self.install(transport);
		Ok(())
	}

	fn ensure_closed(&self) -> Result<(), SpnavError> {
		if self.transport.is_some() {
			return Err(SpnavError::AlreadyOpen);
		}
		Ok(())
	}

	fn install(&mut self, transport: Box<dyn Transport>) {
		tracing::debug!(
			transport = transport.name(),
			protocol = transport.protocol(),
			"session opened"
		);
		self.transport = Some(transport);
	}

	pub fn close(&mut self) -> Result<(), SpnavError> {
		let transport = self.transport.take().ok_or(SpnavError::NotOpen)?;
		tracing::debug!(transport = transport.name(), "session closed");
		transport.close()
	}

	pub fn is_open(&self) -> bool {
		self.transport.is_some()
	}

	fn transport(&self) -> Result<&dyn Transport, SpnavError> {
		self.transport.as_deref().ok_or(SpnavError::NotOpen)
	}

	fn transport_mut(&mut self) -> Result<&mut (dyn Transport + 'static), SpnavError> {
		self.transport.as_deref_mut().ok_or(SpnavError::NotOpen)
	}

	pub fn fd(&self) -> Result<RawFd, SpnavError> {
		Ok(self.transport()?.fd())
	}

	pub fn protocol(&self) -> Result<u32, SpnavError> {
		Ok(self.transport()?.protocol())
	}

	/// Per-client sensitivity multiplier.
	pub fn sensitivity(&mut self, sens: f64) -> Result<(), SpnavError> {
		self.transport_mut()?.set_sensitivity(sens)
	}

	pub fn poll_event(&mut self) -> Result<Option<Event>, SpnavError> {
		self.transport_mut()?.poll_event()
	}

	pub fn wait_event(&mut self) -> Result<Event, SpnavError> {
		self.transport_mut()?.wait_event()
	}

	/// Drops pending events matching `filter` and returns how many were
	/// dropped. Other events stay queued in their original order.
	pub fn remove_events(&mut self, filter: EventFilter) -> Result<usize, SpnavError> {
		self.transport_mut()?.remove_events(filter)
	}

	/// Redirects relay input to another window.
	pub fn set_window(&mut self, window: u32) -> Result<(), SpnavError> {
		self.transport_mut()?.set_window(window)
	}

	/// Decodes a client message taken from the application's own X event
	/// loop. `None` if it is not daemon input or no relay is open.
	pub fn x11_event(&self, message: &ClientMessage) -> Option<Event> {
		self.transport.as_ref()?.translate_message(message)
	}

	pub(crate) fn call(&mut self, kind: RequestKind, data: [i32; 7]) -> Result<Record, SpnavError> {
		let response = self.transport_mut()?.request(Record::with_data(kind, data))?;
		tracing::trace!(request = kind.name(), status = response.status(), "request done");
		Ok(response)
	}

	pub(crate) fn query_string(&mut self, kind: RequestKind) -> Result<Vec<u8>, SpnavError> {
		self.transport_mut()?.request_string(kind)
	}

	pub(crate) fn query_string_into(
		&mut self,
		kind: RequestKind,
		buf: &mut [u8],
	) -> Result<usize, SpnavError> {
		let value = self.query_string(kind)?;
		Ok(copy_truncated(&value, buf))
	}

	pub(crate) fn send_string(&mut self, kind: RequestKind, value: &str) -> Result<(), SpnavError> {
		self.transport_mut()?.send_string(kind, value.as_bytes())
	}

	/// Name shown by the daemon for this client.
	pub fn client_name(&mut self, name: &str) -> Result<(), SpnavError> {
		self.send_string(RequestKind::SetName, name)
	}

	/// Chooses which event classes the daemon sends to this client.
	pub fn evmask(&mut self, mask: EventMask) -> Result<(), SpnavError> {
		self.call(RequestKind::SetEvmask, [mask.bits() as i32, 0, 0, 0, 0, 0, 0])?;
		Ok(())
	}

	pub fn get_evmask(&mut self) -> Result<EventMask, SpnavError> {
		let response = self.call(RequestKind::GetEvmask, [0; 7])?;
		Ok(EventMask::from_bits_retain(response.data[0] as u32))
	}

	pub fn dev_name(&mut self) -> Result<String, SpnavError> {
		let bytes = self.query_string(RequestKind::DevName)?;
		Ok(String::from_utf8_lossy(&bytes).into_owned())
	}

	/// Copies the device name into `buf`, truncating and NUL terminating it.
	/// Returns the untruncated length.
	pub fn dev_name_into(&mut self, buf: &mut [u8]) -> Result<usize, SpnavError> {
		self.query_string_into(RequestKind::DevName, buf)
	}

	pub fn dev_path(&mut self) -> Result<String, SpnavError> {
		let bytes = self.query_string(RequestKind::DevPath)?;
		Ok(String::from_utf8_lossy(&bytes).into_owned())
	}

	pub fn dev_path_into(&mut self, buf: &mut [u8]) -> Result<usize, SpnavError> {
		self.query_string_into(RequestKind::DevPath, buf)
	}

	/// Number of device buttons, 2 if the daemon can't tell.
	pub fn dev_buttons(&mut self) -> u32 {
		self.query_count(RequestKind::DevButtons, Self::DEFAULT_BUTTONS)
	}

	/// Number of device axes, 6 if the daemon can't tell.
	pub fn dev_axes(&mut self) -> u32 {
		self.query_count(RequestKind::DevAxes, Self::DEFAULT_AXES)
	}

	fn query_count(&mut self, kind: RequestKind, default: u32) -> u32 {
		match self.call(kind, [0; 7]) {
			Ok(response) => u32::try_from(response.data[0]).unwrap_or(default),
			Err(err) => {
				tracing::debug!(request = kind.name(), %err, "using default count");
				default
			}
		}
	}

	/// USB vendor and product id of the device.
	pub fn dev_usbid(&mut self) -> Result<(u32, u32), SpnavError> {
		let response = self.call(RequestKind::DevUsbId, [0; 7])?;
		Ok((response.data[0] as u32, response.data[1] as u32))
	}

	pub fn dev_type(&mut self) -> Result<DeviceType, SpnavError> {
		let response = self.call(RequestKind::DevType, [0; 7])?;
		Ok(DeviceType(response.data[0]))
	}
}

impl Drop for SpnavClient {
	fn drop(&mut self) {
		if let Some(transport) = self.transport.take() {
			if let Err(err) = transport.close() {
				tracing::debug!(%err, "error closing transport on drop");
			}
		}
	}
}
