use spnav_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpnavError {
	#[error("a transport is already open on this handle")]
	AlreadyOpen,
	#[error("no transport is open")]
	NotOpen,
	#[error("could not connect to the daemon socket: {0}")]
	Connect(std::io::Error),
	#[error("{0} is not supported by the current transport")]
	Unsupported(&'static str),
	#[error("the input daemon is not running")]
	DaemonNotRunning,
	#[error("X error {code}")]
	X11 { code: u8 },
	#[error("invalid argument: {0}")]
	InvalidArgument(&'static str),
	#[error("unexpected reply: {0}")]
	Unexpected(&'static str),
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
