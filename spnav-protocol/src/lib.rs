//! Wire protocol shared between spacenav clients and the daemon.
//!
//! Everything on the unix socket is a fixed 32 byte record in host byte
//! order: either an unsolicited event (eight `i32` words, see [`Event`]) or a
//! tagged request/response ([`Record`]).

pub mod event;
pub mod record;
pub mod request;
pub mod strings;
pub mod unix_socket_utils;

pub use event::{DeviceOp, Event, EventKind, RawEventCode};
pub use record::{RECORD_SIZE, Record};
pub use request::RequestKind;
pub use strings::{StringAssembler, copy_truncated, encode_string};

use thiserror::Error;

/// Highest protocol version this implementation speaks.
pub const PROTOCOL_VERSION: u32 = 1;
/// Marker OR'd into the kind of every tagged request.
pub const REQ_TAG: i32 = 0x7faa0000;
/// Index of the status word in plain responses.
pub const STATUS_SLOT: usize = 6;

pub const DEFAULT_SOCKET_PATH: &str = "/var/run/spnav.sock";
pub const DEFAULT_CONFIG_FILE: &str = "/etc/spnavrc";
pub const SOCKET_ENV_VAR: &str = "SPNAV_SOCKET";

/// The 4-byte word sent right after connecting to negotiate the protocol.
pub const fn handshake_word() -> i32 {
	REQ_TAG | RequestKind::ChangeProto.code() | PROTOCOL_VERSION as i32
}

#[derive(Debug, Error)]
pub enum ProtocolError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
	#[error("nix error: {0}")]
	Nix(#[from] nix::Error),
	#[error("peer closed the connection")]
	UnexpectedEof,
	#[error("short write: {written} of {expected} bytes")]
	Truncated { written: usize, expected: usize },
	#[error("timed out waiting for the daemon")]
	Timeout,
	#[error("response tag {found:#x} does not match request {expected:#x}")]
	TagMismatch { expected: i32, found: i32 },
	#[error("daemon reported failure status {0}")]
	Status(i32),
	#[error("malformed string transfer: {0}")]
	InvalidString(&'static str),
	#[error("string of {0} bytes does not fit the length field")]
	StringTooLong(usize),
}
