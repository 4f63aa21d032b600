use std::io::IoSlice;
use std::os::fd::{AsFd, AsRawFd};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::sys::socket::{MsgFlags, recv, sendmsg};

use crate::ProtocolError;

/// Connects a blocking stream socket to the daemon at `path`.
pub fn connect_stream(path: impl AsRef<Path>) -> std::io::Result<UnixStream> {
	UnixStream::connect(path)
}

/// Writes all of `bytes`, resuming after short writes, without raising
/// SIGPIPE.
pub fn send_all(stream: &impl AsFd, bytes: &[u8]) -> Result<(), ProtocolError> {
	let fd = stream.as_fd().as_raw_fd();
	let mut written = 0;
	while written < bytes.len() {
		let iov = [IoSlice::new(&bytes[written..])];
		match sendmsg::<()>(fd, &iov, &[], MsgFlags::MSG_NOSIGNAL, None) {
			Ok(0) => {
				return Err(ProtocolError::Truncated {
					written,
					expected: bytes.len(),
				});
			}
			Ok(n) => written += n,
			Err(Errno::EINTR) => continue,
			Err(errno) => return Err(errno.into()),
		}
	}
	Ok(())
}

/// Blocks until `buf` is completely filled.
pub fn recv_exact(stream: &impl AsFd, buf: &mut [u8]) -> Result<(), ProtocolError> {
	let fd = stream.as_fd().as_raw_fd();
	let mut filled = 0;
	while filled < buf.len() {
		match recv(fd, &mut buf[filled..], MsgFlags::empty()) {
			Ok(0) => return Err(ProtocolError::UnexpectedEof),
			Ok(n) => filled += n,
			Err(Errno::EINTR) => continue,
			Err(errno) => return Err(errno.into()),
		}
	}
	Ok(())
}

/// Waits until the socket has data (or hangs up). `None` waits forever,
/// `Some(Duration::ZERO)` just polls.
pub fn wait_readable(stream: &impl AsFd, timeout: Option<Duration>) -> Result<bool, ProtocolError> {
	let deadline = timeout.map(|timeout| Instant::now() + timeout);
	loop {
		let poll_timeout = match deadline {
			None => PollTimeout::NONE,
			Some(deadline) => PollTimeout::from(poll_millis(
				deadline.saturating_duration_since(Instant::now()),
			)),
		};
		let mut fds = [PollFd::new(stream.as_fd(), PollFlags::POLLIN)];
		match poll(&mut fds, poll_timeout) {
			Ok(0) => match deadline {
				// A single poll covers at most u16::MAX ms.
				Some(deadline) if Instant::now() < deadline => continue,
				_ => return Ok(false),
			},
			Ok(_) => return Ok(true),
			Err(Errno::EINTR) => continue,
			Err(errno) => return Err(errno.into()),
		}
	}
}

/// Milliseconds for one poll call, rounded up so a sub-millisecond
/// remainder does not spin.
fn poll_millis(remaining: Duration) -> u16 {
	remaining.as_micros().div_ceil(1000).min(u16::MAX as u128) as u16
}

/// Fills `buf` if data shows up before `timeout` expires.
pub fn recv_exact_timeout(
	stream: &impl AsFd,
	buf: &mut [u8],
	timeout: Duration,
) -> Result<(), ProtocolError> {
	if !wait_readable(stream, Some(timeout))? {
		return Err(ProtocolError::Timeout);
	}
	recv_exact(stream, buf)
}

/// Reads and drops whatever is currently buffered on the socket.
/// Returns the number of discarded bytes.
pub fn discard_pending(stream: &impl AsFd) -> Result<usize, ProtocolError> {
	let fd = stream.as_fd().as_raw_fd();
	let mut scratch = [0u8; 256];
	let mut discarded = 0;
	loop {
		match recv(fd, &mut scratch, MsgFlags::MSG_DONTWAIT) {
			Ok(0) => break,
			Ok(n) => discarded += n,
			Err(Errno::EINTR) => continue,
			Err(errno) if errno == Errno::EAGAIN || errno == Errno::EWOULDBLOCK => break,
			Err(errno) => return Err(errno.into()),
		}
	}
	Ok(discarded)
}
