use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use spnav_protocol::unix_socket_utils::{
	connect_stream, discard_pending, recv_exact_timeout, send_all, wait_readable,
};
use spnav_protocol::{
	Event, ProtocolError, Record, RequestKind, StringAssembler, encode_string, handshake_word,
	record::read_words,
};

use crate::queue::EventQueue;
use crate::transport::Transport;
use crate::{EventFilter, SpnavConfig, SpnavError};

/// Transport over the daemon's unix stream socket.
#[derive(Debug)]
pub struct SocketTransport {
	stream: UnixStream,
	protocol: u32,
	queue: EventQueue,
	request_timeout: Duration,
}

impl SocketTransport {
	/// Connects to the first reachable candidate socket and negotiates the
	/// protocol version.
	#[tracing::instrument(level = "debug", skip(config))]
	pub fn open(config: &SpnavConfig) -> Result<Self, SpnavError> {
		let mut last_err = None;
		for path in config.socket_candidates() {
			match connect_stream(&path) {
				Ok(stream) => {
					tracing::debug!(path = %path.display(), "connected to daemon");
					return Self::from_stream(stream, config);
				}
				Err(err) => {
					tracing::debug!(path = %path.display(), %err, "daemon socket unavailable");
					last_err = Some(err);
				}
			}
		}
		Err(SpnavError::Connect(
			last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotFound)),
		))
	}

	/// Runs the version handshake on an already connected stream.
	pub fn from_stream(stream: UnixStream, config: &SpnavConfig) -> Result<Self, SpnavError> {
		let mut transport = Self {
			stream,
			protocol: 0,
			queue: EventQueue::new(),
			request_timeout: config.request_timeout(),
		};
		transport.handshake(config.handshake_timeout())?;
		Ok(transport)
	}

	fn handshake(&mut self, timeout: Duration) -> Result<(), SpnavError> {
		send_all(&self.stream, &handshake_word().to_ne_bytes())?;
		let mut reply = [0u8; 4];
		match recv_exact_timeout(&self.stream, &mut reply, timeout) {
			Ok(()) => {
				self.protocol = (i32::from_ne_bytes(reply) & 0xff) as u32;
				tracing::debug!(protocol = self.protocol, "daemon accepted protocol");
			}
			Err(ProtocolError::Timeout) => {
				// Old daemons read the handshake word as a sensitivity value.
				tracing::debug!("no handshake reply, assuming protocol 0");
				self.protocol = 0;
				self.send_legacy_sensitivity(1.0)?;
			}
			Err(err) => return Err(err.into()),
		}
		Ok(())
	}

	fn send_legacy_sensitivity(&self, sens: f32) -> Result<(), SpnavError> {
		send_all(&self.stream, &sens.to_ne_bytes())?;
		Ok(())
	}

	fn require_protocol(&self, what: &'static str) -> Result<(), SpnavError> {
		if self.protocol < 1 {
			return Err(SpnavError::Unsupported(what));
		}
		Ok(())
	}

	/// Reads one record if the socket has data, skipping non-events.
	fn read_pending(&mut self) -> Result<Option<Event>, SpnavError> {
		while wait_readable(&self.stream, Some(Duration::ZERO))? {
			if let Some(event) = self.read_one()? {
				return Ok(Some(event));
			}
		}
		Ok(None)
	}

	fn read_one(&mut self) -> Result<Option<Event>, SpnavError> {
		let words = read_words(&self.stream)?;
		let event = Event::from_words(&words);
		if event.is_none() {
			tracing::warn!(code = words[0], "skipping record that is not an event");
		}
		Ok(event)
	}

	pub fn queued(&self) -> usize {
		self.queue.len()
	}
}

impl Transport for SocketTransport {
	fn name(&self) -> &'static str {
		"socket"
	}

	fn fd(&self) -> RawFd {
		self.stream.as_raw_fd()
	}

	fn protocol(&self) -> u32 {
		self.protocol
	}

	fn set_sensitivity(&mut self, sens: f64) -> Result<(), SpnavError> {
		if self.protocol == 0 {
			return self.send_legacy_sensitivity(sens as f32);
		}
		let mut request = Record::request(RequestKind::SetSens);
		request.set_data_f32(0, sens as f32);
		self.request(request)?;
		Ok(())
	}

	fn poll_event(&mut self) -> Result<Option<Event>, SpnavError> {
		if let Some(event) = self.queue.pop() {
			return Ok(Some(event));
		}
		self.read_pending()
	}

	fn wait_event(&mut self) -> Result<Event, SpnavError> {
		if let Some(event) = self.queue.pop() {
			return Ok(event);
		}
		loop {
			if let Some(event) = self.read_one()? {
				return Ok(event);
			}
		}
	}

	fn remove_events(&mut self, filter: EventFilter) -> Result<usize, SpnavError> {
		let mut kept = EventQueue::new();
		let mut removed = 0;
		let outcome = loop {
			match self.poll_event() {
				Ok(Some(event)) if filter.matches(&event) => removed += 1,
				Ok(Some(event)) => kept.push(event),
				Ok(None) => break Ok(removed),
				Err(err) => break Err(err),
			}
		};
		// Whatever is left in the queue came after the kept events.
		kept.append(&mut self.queue);
		self.queue = kept;
		tracing::trace!(?filter, removed, queued = self.queue.len(), "removed events");
		outcome
	}

	fn request(&mut self, mut request: Record) -> Result<Record, SpnavError> {
		self.require_protocol("request/response")?;
		let stale = discard_pending(&self.stream)?;
		if stale > 0 {
			tracing::trace!(stale, "discarded unread bytes before request");
		}
		request.kind |= spnav_protocol::REQ_TAG;
		request.encode_and_send(&self.stream)?;
		let response = Record::read_with_timeout(&self.stream, self.request_timeout)?;
		response.check_response_to(&request)?;
		Ok(response)
	}

	fn request_string(&mut self, kind: RequestKind) -> Result<Vec<u8>, SpnavError> {
		let request = Record::request(kind);
		let mut record = self.request(request)?;
		let mut assembler = StringAssembler::new();
		while !assembler.push(&record)? {
			record = Record::read_with_timeout(&self.stream, self.request_timeout)?;
			record.check_response_to(&request)?;
		}
		tracing::trace!(request = kind.name(), len = assembler.total_len(), "string reply complete");
		Ok(assembler.into_bytes()?)
	}

	fn send_string(&mut self, kind: RequestKind, value: &[u8]) -> Result<(), SpnavError> {
		self.require_protocol("string requests")?;
		for record in encode_string(kind.tagged(), value)? {
			record.encode_and_send(&self.stream)?;
		}
		Ok(())
	}

	fn close(self: Box<Self>) -> Result<(), SpnavError> {
		tracing::debug!(dropped = self.queue.len(), "closing daemon socket");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::{Read, Write};
	use std::thread;

	fn config() -> SpnavConfig {
		SpnavConfig::default()
			.without_config_file()
			.set_handshake_timeout(Duration::from_secs(2))
			.set_request_timeout(Duration::from_millis(200))
	}

	/// Answers the handshake with version 1 and hands back the daemon side.
	fn connected_v1() -> (SocketTransport, UnixStream) {
		let (ours, mut daemon) = UnixStream::pair().unwrap();
		let peer = thread::spawn(move || {
			let mut word = [0u8; 4];
			daemon.read_exact(&mut word).unwrap();
			daemon.write_all(&word).unwrap();
			daemon
		});
		let transport = SocketTransport::from_stream(ours, &config()).unwrap();
		(transport, peer.join().unwrap())
	}

	fn send_event(daemon: &mut UnixStream, event: Event) {
		daemon
			.write_all(&spnav_protocol::record::encode_words(&event.to_words()))
			.unwrap();
	}

	fn motion() -> Event {
		Event::Motion {
			x: 1,
			y: 2,
			z: 3,
			rx: 0,
			ry: 0,
			rz: 0,
			period: 16,
		}
	}

	fn button(bnum: i32) -> Event {
		Event::Button { press: true, bnum }
	}

	#[test]
	fn handshake_reads_version_from_low_byte() {
		let (transport, _daemon) = connected_v1();
		assert_eq!(transport.protocol(), 1);
	}

	#[test]
	fn poll_returns_none_when_idle() {
		let (mut transport, _daemon) = connected_v1();
		assert_eq!(transport.poll_event().unwrap(), None);
	}

	#[test]
	fn undecodable_records_are_skipped() {
		let (mut transport, mut daemon) = connected_v1();
		daemon
			.write_all(&spnav_protocol::record::encode_words(&[42, 0, 0, 0, 0, 0, 0, 0]))
			.unwrap();
		send_event(&mut daemon, button(4));
		assert_eq!(transport.wait_event().unwrap(), button(4));
	}

	#[test]
	fn remove_motion_keeps_buttons_in_order() {
		let (mut transport, mut daemon) = connected_v1();
		for event in [motion(), button(0), motion(), motion(), button(1)] {
			send_event(&mut daemon, event);
		}
		let filter = EventFilter::Kind(spnav_protocol::EventKind::Motion);
		assert_eq!(transport.remove_events(filter).unwrap(), 3);
		assert_eq!(transport.queued(), 2);
		assert_eq!(transport.poll_event().unwrap(), Some(button(0)));
		assert_eq!(transport.poll_event().unwrap(), Some(button(1)));
		assert_eq!(transport.poll_event().unwrap(), None);
	}

	#[test]
	fn remove_any_empties_everything() {
		let (mut transport, mut daemon) = connected_v1();
		for event in [motion(), button(0), Event::RawAxis { idx: 1, value: 5 }] {
			send_event(&mut daemon, event);
		}
		assert_eq!(transport.remove_events(EventFilter::Any).unwrap(), 3);
		assert_eq!(transport.poll_event().unwrap(), None);
	}

	#[test]
	fn request_times_out_without_reply() {
		let (mut transport, _daemon) = connected_v1();
		let err = transport
			.request(Record::request(RequestKind::GetCfgGrab))
			.unwrap_err();
		assert!(matches!(err, SpnavError::Protocol(ProtocolError::Timeout)));
	}
}
