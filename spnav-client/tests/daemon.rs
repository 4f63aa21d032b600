//! Drives the socket transport against a scripted daemon listening on a unix
//! socket in a temporary directory.

use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use spnav_client::{
	DeviceType, Event, EventFilter, InvertAxes, LedMode, SpnavClient, SpnavConfig, SpnavError,
};
use spnav_protocol::{
	ProtocolError, RECORD_SIZE, Record, RequestKind, StringAssembler, encode_string,
	handshake_word, record::encode_words,
};
use tempfile::TempDir;

struct FakeDaemon<T> {
	_dir: TempDir,
	path: PathBuf,
	thread: JoinHandle<T>,
}

impl<T: Send + 'static> FakeDaemon<T> {
	fn spawn(script: impl FnOnce(UnixStream) -> T + Send + 'static) -> Self {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("spnav.sock");
		let listener = UnixListener::bind(&path).unwrap();
		let thread = thread::spawn(move || {
			let (stream, _) = listener.accept().unwrap();
			script(stream)
		});
		Self {
			_dir: dir,
			path,
			thread,
		}
	}

	fn config(&self) -> SpnavConfig {
		SpnavConfig::default()
			.without_config_file()
			.set_socket_path(&self.path)
			.set_handshake_timeout(Duration::from_secs(2))
			.set_request_timeout(Duration::from_secs(2))
	}

	fn join(self) -> T {
		self.thread.join().unwrap()
	}
}

/// Reads the version request and accepts it, sending `extra` in the same
/// write.
fn accept_v1(stream: &mut UnixStream, extra: &[u8]) {
	let mut word = [0u8; 4];
	stream.read_exact(&mut word).unwrap();
	assert_eq!(i32::from_ne_bytes(word), handshake_word());
	let mut reply = word.to_vec();
	reply.extend_from_slice(extra);
	stream.write_all(&reply).unwrap();
}

/// Answers requests until the client hangs up, returning what it received.
fn serve(mut stream: UnixStream, mut answer: impl FnMut(&Record) -> Vec<Record>) -> Vec<Record> {
	let mut seen = Vec::new();
	loop {
		let mut buf = [0u8; RECORD_SIZE];
		if stream.read_exact(&mut buf).is_err() {
			break;
		}
		let request = Record::from_bytes(&buf);
		for response in answer(&request) {
			stream.write_all(&response.to_bytes()).unwrap();
		}
		seen.push(request);
	}
	seen
}

fn reply(request: &Record, data: [i32; 7]) -> Vec<Record> {
	vec![Record {
		kind: request.kind,
		data,
	}]
}

fn is(request: &Record, kind: RequestKind) -> bool {
	request.kind == kind.tagged()
}

fn event_bytes(events: &[Event]) -> Vec<u8> {
	events
		.iter()
		.flat_map(|event| encode_words(&event.to_words()))
		.collect()
}

fn motion(x: i32) -> Event {
	Event::Motion {
		x,
		y: 0,
		z: 0,
		rx: 0,
		ry: 0,
		rz: 0,
		period: 16,
	}
}

const DEVICE_NAME: &str = "3Dconnexion SpaceNavigator";

#[test]
fn v1_session_answers_device_queries() {
	let daemon = FakeDaemon::spawn(|mut stream| {
		accept_v1(&mut stream, &[]);
		serve(stream, |request| {
			if is(request, RequestKind::DevName) {
				encode_string(request.kind, DEVICE_NAME.as_bytes()).unwrap()
			} else if is(request, RequestKind::DevAxes) {
				reply(request, [6, 0, 0, 0, 0, 0, 0])
			} else if is(request, RequestKind::DevButtons) {
				reply(request, [0, 0, 0, 0, 0, 0, -1])
			} else if is(request, RequestKind::DevType) {
				reply(request, [0x206, 0, 0, 0, 0, 0, 0])
			} else if is(request, RequestKind::DevUsbId) {
				reply(request, [0x46d, 0xc626, 0, 0, 0, 0, 0])
			} else {
				reply(request, [0; 7])
			}
		})
	});

	let mut client = SpnavClient::new();
	client.open_with(&daemon.config()).unwrap();
	assert_eq!(client.protocol().unwrap(), 1);
	assert_eq!(client.dev_name().unwrap(), DEVICE_NAME);

	let mut small = [0xffu8; 8];
	assert_eq!(client.dev_name_into(&mut small).unwrap(), DEVICE_NAME.len());
	assert_eq!(&small, b"3Dconne\0");

	assert_eq!(client.dev_axes(), 6);
	// The daemon reports failure, so the default applies.
	assert_eq!(client.dev_buttons(), 2);
	assert_eq!(client.dev_type().unwrap(), DeviceType::SNAV);
	assert_eq!(client.dev_usbid().unwrap(), (0x46d, 0xc626));
	client.close().unwrap();

	let seen = daemon.join();
	assert_eq!(seen.len(), 6);
	assert!(seen.iter().all(Record::is_tagged));
}

#[test]
fn legacy_daemon_gets_a_sensitivity_reset() {
	let daemon = FakeDaemon::spawn(|mut stream| {
		let mut head = [0u8; 12];
		stream.read_exact(&mut head).unwrap();
		stream.write_all(&event_bytes(&[motion(42)])).unwrap();
		let mut rest = Vec::new();
		stream.read_to_end(&mut rest).unwrap();
		(head, rest)
	});

	let config = daemon
		.config()
		.set_handshake_timeout(Duration::from_millis(100));
	let mut client = SpnavClient::new();
	client.open_with(&config).unwrap();
	assert_eq!(client.protocol().unwrap(), 0);

	assert!(matches!(
		client.evmask(spnav_client::EventMask::ALL),
		Err(SpnavError::Unsupported(_))
	));
	assert!(matches!(client.cfg_get_sens(), Err(SpnavError::Unsupported(_))));
	assert!(matches!(
		client.client_name("legacy"),
		Err(SpnavError::Unsupported(_))
	));
	client.sensitivity(2.5).unwrap();
	assert_eq!(client.wait_event().unwrap(), motion(42));
	client.close().unwrap();

	let (head, rest) = daemon.join();
	assert_eq!(&head[..4], &handshake_word().to_ne_bytes());
	assert_eq!(&head[4..8], &1.0f32.to_ne_bytes());
	assert_eq!(&head[8..], &2.5f32.to_ne_bytes());
	// Unsupported calls never reached the wire.
	assert!(rest.is_empty());
}

#[test]
fn second_open_is_refused_and_keeps_the_session() {
	let daemon = FakeDaemon::spawn(|mut stream| {
		accept_v1(&mut stream, &[]);
		serve(stream, |request| reply(request, [6, 0, 0, 0, 0, 0, 0]))
	});

	let mut client = SpnavClient::new();
	client.open_with(&daemon.config()).unwrap();
	let fd = client.fd().unwrap();
	assert!(matches!(
		client.open_with(&daemon.config()),
		Err(SpnavError::AlreadyOpen)
	));
	assert_eq!(client.fd().unwrap(), fd);
	assert_eq!(client.dev_axes(), 6);
	drop(client);

	assert_eq!(daemon.join().len(), 1);
}

#[test]
fn mismatched_tags_and_failure_status_are_errors() {
	let daemon = FakeDaemon::spawn(|mut stream| {
		accept_v1(&mut stream, &[]);
		serve(stream, |request| {
			if is(request, RequestKind::GetCfgSens) {
				vec![Record {
					kind: RequestKind::GetCfgGrab.tagged(),
					data: [0; 7],
				}]
			} else {
				reply(request, [0, 0, 0, 0, 0, 0, -1])
			}
		})
	});

	let mut client = SpnavClient::new();
	client.open_with(&daemon.config()).unwrap();
	assert!(matches!(
		client.cfg_get_sens(),
		Err(SpnavError::Protocol(ProtocolError::TagMismatch { .. }))
	));
	assert!(matches!(
		client.cfg_get_led(),
		Err(SpnavError::Protocol(ProtocolError::Status(-1)))
	));
	client.close().unwrap();
	daemon.join();
}

#[test]
fn strings_cross_chunk_boundaries() {
	let lengths = [23usize, 24, 25];
	let daemon = FakeDaemon::spawn(move |mut stream| {
		accept_v1(&mut stream, &[]);
		let mut next = lengths.iter();
		serve(stream, move |request| {
			if is(request, RequestKind::DevPath) {
				let len = *next.next().unwrap();
				let path: Vec<u8> = (0..len).map(|i| b'a' + (i % 26) as u8).collect();
				encode_string(request.kind, &path).unwrap()
			} else {
				// String requests get no answer.
				Vec::new()
			}
		})
	});

	let mut client = SpnavClient::new();
	client.open_with(&daemon.config()).unwrap();
	for len in lengths {
		let path = client.dev_path().unwrap();
		assert_eq!(path.len(), len);
		assert!(path.starts_with("abcdefghijklmnopqrstuvw"));
	}

	let serial = "/dev/serial/by-id/usb-3Dconnexion_SpaceBall_5000-if00";
	client.cfg_set_serial(serial).unwrap();
	client.client_name("integration").unwrap();
	client.close().unwrap();

	let seen = daemon.join();
	let mut serial_sent = StringAssembler::new();
	for record in seen.iter().filter(|r| is(r, RequestKind::SetCfgSerialDevice)) {
		serial_sent.push(record).unwrap();
	}
	assert_eq!(serial_sent.into_string().unwrap(), serial);

	let mut name_sent = StringAssembler::new();
	let name_records: Vec<_> = seen.iter().filter(|r| is(r, RequestKind::SetName)).collect();
	assert_eq!(name_records.len(), 1);
	assert!(name_sent.push(name_records[0]).unwrap());
	assert_eq!(name_sent.into_string().unwrap(), "integration");
}

#[test]
fn remove_events_keeps_other_kinds_in_order() {
	let first = Event::Button {
		press: true,
		bnum: 1,
	};
	let second = Event::Button {
		press: false,
		bnum: 1,
	};
	let burst = event_bytes(&[motion(1), first, motion(2), motion(3), second]);
	let daemon = FakeDaemon::spawn(move |mut stream| {
		accept_v1(&mut stream, &burst);
		let mut rest = Vec::new();
		stream.read_to_end(&mut rest).ok();
	});

	let mut client = SpnavClient::new();
	client.open_with(&daemon.config()).unwrap();
	assert_eq!(client.remove_motion_events().unwrap(), 3);
	assert_eq!(client.poll_event().unwrap(), Some(first));
	assert_eq!(client.poll_event().unwrap(), Some(second));
	assert_eq!(client.poll_event().unwrap(), None);
	assert_eq!(client.remove_events(EventFilter::Any).unwrap(), 0);
	client.close().unwrap();
	daemon.join();
}

#[test]
fn late_reply_is_flushed_before_the_next_request() {
	let daemon = FakeDaemon::spawn(|mut stream| {
		accept_v1(&mut stream, &[]);
		let mut buf = [0u8; RECORD_SIZE];
		stream.read_exact(&mut buf).unwrap();
		let grab = Record::from_bytes(&buf);
		assert!(is(&grab, RequestKind::GetCfgGrab));
		// The answer and a duplicate of it land in one write.
		let mut bytes = Vec::new();
		for data in [[1, 0, 0, 0, 0, 0, 0], [0; 7]] {
			bytes.extend_from_slice(&reply(&grab, data)[0].to_bytes());
		}
		stream.write_all(&bytes).unwrap();
		serve(stream, |request| {
			if is(request, RequestKind::GetCfgLed) {
				reply(request, [1, 0, 0, 0, 0, 0, 0])
			} else {
				reply(request, [0; 7])
			}
		})
	});

	let mut client = SpnavClient::new();
	client.open_with(&daemon.config()).unwrap();
	assert!(client.cfg_get_grab().unwrap());
	// Let the duplicate settle in the socket buffer.
	thread::sleep(Duration::from_millis(50));
	assert_eq!(client.cfg_get_led().unwrap(), LedMode::On);
	client.close().unwrap();

	let seen = daemon.join();
	assert_eq!(seen.len(), 1);
	assert!(is(&seen[0], RequestKind::GetCfgLed));
}

#[test]
fn config_requests_carry_their_payloads() {
	let daemon = FakeDaemon::spawn(|mut stream| {
		accept_v1(&mut stream, &[]);
		serve(stream, |request| {
			if is(request, RequestKind::GetCfgInvert) {
				reply(request, [0, 1, 0, 0, 0, 1, 0])
			} else if is(request, RequestKind::GetCfgDeadzone) {
				reply(request, [request.data[0], 12, 0, 0, 0, 0, 0])
			} else if is(request, RequestKind::GetCfgSens) {
				reply(request, [1.5f32.to_bits() as i32, 0, 0, 0, 0, 0, 0])
			} else if is(request, RequestKind::GetCfgLed) {
				reply(request, [2, 0, 0, 0, 0, 0, 0])
			} else {
				reply(request, [0; 7])
			}
		})
	});

	let mut client = SpnavClient::new();
	client.open_with(&daemon.config()).unwrap();
	client
		.cfg_set_invert(InvertAxes::TX | InvertAxes::TZ | InvertAxes::RZ)
		.unwrap();
	assert_eq!(
		client.cfg_get_invert().unwrap(),
		InvertAxes::TY | InvertAxes::RZ
	);
	assert_eq!(client.cfg_get_deadzone(3).unwrap(), 12);
	assert_eq!(client.cfg_get_sens().unwrap(), 1.5);
	assert_eq!(client.cfg_get_led().unwrap(), LedMode::Auto);
	client.cfg_set_led(LedMode::On).unwrap();
	client.cfg_set_axis_sens([1.0, 1.0, 1.0, 0.5, 0.5, 0.5]).unwrap();
	client.cfg_save().unwrap();
	client.close().unwrap();

	let seen = daemon.join();
	let find = |kind: RequestKind| *seen.iter().find(|r| is(r, kind)).unwrap();
	assert_eq!(find(RequestKind::SetCfgInvert).data, [1, 0, 1, 0, 0, 1, 0]);
	assert_eq!(find(RequestKind::GetCfgDeadzone).data[0], 3);
	assert_eq!(find(RequestKind::SetCfgLed).data[0], 1);
	assert_eq!(
		find(RequestKind::SetCfgAxisSens).data[3],
		0.5f32.to_bits() as i32
	);
	assert_eq!(seen.last().unwrap().kind, RequestKind::CfgSave.tagged());
}
