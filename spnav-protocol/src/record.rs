use std::os::fd::AsFd;
use std::time::Duration;

use crate::unix_socket_utils::{recv_exact, recv_exact_timeout, send_all};
use crate::{ProtocolError, REQ_TAG, RequestKind, STATUS_SLOT};

/// Size of every record exchanged with the daemon, events included.
pub const RECORD_SIZE: usize = 32;

/// Fixed-size request/response record: a kind word plus seven payload words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Record {
	pub kind: i32,
	pub data: [i32; 7],
}

pub fn encode_words(words: &[i32; 8]) -> [u8; RECORD_SIZE] {
	let mut out = [0u8; RECORD_SIZE];
	for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
		chunk.copy_from_slice(&word.to_ne_bytes());
	}
	out
}

pub fn decode_words(bytes: &[u8; RECORD_SIZE]) -> [i32; 8] {
	let mut words = [0i32; 8];
	for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
		*word = i32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
	}
	words
}

/// Reads one raw 8-word record, blocking until it is complete.
pub fn read_words(stream: &impl AsFd) -> Result<[i32; 8], ProtocolError> {
	let mut buf = [0u8; RECORD_SIZE];
	recv_exact(stream, &mut buf)?;
	Ok(decode_words(&buf))
}

impl Record {
	/// Tagged request of the given kind with an empty payload.
	pub fn request(kind: RequestKind) -> Self {
		Self {
			kind: kind.tagged(),
			data: [0; 7],
		}
	}

	pub fn with_data(kind: RequestKind, data: [i32; 7]) -> Self {
		Self {
			kind: kind.tagged(),
			data,
		}
	}

	pub fn is_tagged(&self) -> bool {
		self.kind & REQ_TAG == REQ_TAG
	}

	pub fn status(&self) -> i32 {
		self.data[STATUS_SLOT]
	}

	pub fn words(&self) -> [i32; 8] {
		let mut words = [0; 8];
		words[0] = self.kind;
		words[1..].copy_from_slice(&self.data);
		words
	}

	pub fn from_words(words: [i32; 8]) -> Self {
		let mut data = [0; 7];
		data.copy_from_slice(&words[1..]);
		Self {
			kind: words[0],
			data,
		}
	}

	pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
		encode_words(&self.words())
	}

	pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
		Self::from_words(decode_words(bytes))
	}

	/// Payload word reinterpreted as an IEEE float.
	pub fn data_f32(&self, slot: usize) -> f32 {
		f32::from_bits(self.data[slot] as u32)
	}

	pub fn set_data_f32(&mut self, slot: usize, value: f32) {
		self.data[slot] = value.to_bits() as i32;
	}

	/// The 24 payload bytes in front of the status word, in memory order.
	pub fn payload_bytes(&self) -> [u8; 24] {
		let mut out = [0u8; 24];
		for (chunk, word) in out.chunks_exact_mut(4).zip(&self.data[..6]) {
			chunk.copy_from_slice(&word.to_ne_bytes());
		}
		out
	}

	/// Copies up to 24 bytes into the payload words, zero padding the rest.
	pub fn set_payload_bytes(&mut self, bytes: &[u8]) {
		let mut padded = [0u8; 24];
		let len = bytes.len().min(padded.len());
		padded[..len].copy_from_slice(&bytes[..len]);
		for (word, chunk) in self.data[..6].iter_mut().zip(padded.chunks_exact(4)) {
			*word = i32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
		}
	}

	/// Checks that `self` answers `request`: same tagged kind, non-negative status.
	pub fn check_response_to(&self, request: &Record) -> Result<(), ProtocolError> {
		if self.kind != request.kind {
			return Err(ProtocolError::TagMismatch {
				expected: request.kind,
				found: self.kind,
			});
		}
		if self.status() < 0 {
			return Err(ProtocolError::Status(self.status()));
		}
		Ok(())
	}

	pub fn encode_and_send(&self, stream: &impl AsFd) -> Result<(), ProtocolError> {
		tracing::trace!("sending record {:#x}", self.kind);
		send_all(stream, &self.to_bytes())
	}

	/// Blocking read of one record.
	pub fn read_framed(stream: &impl AsFd) -> Result<Self, ProtocolError> {
		Ok(Self::from_words(read_words(stream)?))
	}

	/// Reads one record, giving up if nothing arrives within `timeout`.
	pub fn read_with_timeout(stream: &impl AsFd, timeout: Duration) -> Result<Self, ProtocolError> {
		let mut buf = [0u8; RECORD_SIZE];
		recv_exact_timeout(stream, &mut buf, timeout)?;
		Ok(Self::from_bytes(&buf))
	}

}

#[cfg(test)]
mod tests {
	use super::*;
	use std::os::unix::net::UnixStream;

	#[test]
	fn bytes_use_host_order_words() {
		let record = Record::with_data(RequestKind::GetCfgLed, [1, 2, 3, 4, 5, 6, -7]);
		let bytes = record.to_bytes();
		assert_eq!(&bytes[..4], &RequestKind::GetCfgLed.tagged().to_ne_bytes());
		assert_eq!(&bytes[28..], &(-7i32).to_ne_bytes());
		assert_eq!(Record::from_bytes(&bytes), record);
	}

	#[test]
	fn payload_bytes_keep_memory_order() {
		let mut record = Record::request(RequestKind::DevName);
		record.set_payload_bytes(b"SpaceNavigator");
		let payload = record.payload_bytes();
		assert_eq!(&payload[..14], b"SpaceNavigator");
		assert!(payload[14..].iter().all(|b| *b == 0));
		assert_eq!(record.status(), 0);
	}

	#[test]
	fn float_slots_hold_bit_patterns() {
		let mut record = Record::request(RequestKind::SetCfgSens);
		record.set_data_f32(0, 1.5);
		assert_eq!(record.data[0], 1.5f32.to_bits() as i32);
		assert_eq!(record.data_f32(0), 1.5);
	}

	#[test]
	fn response_with_other_tag_is_rejected() {
		let request = Record::request(RequestKind::GetCfgGrab);
		let response = Record::request(RequestKind::GetCfgLed);
		assert!(matches!(
			response.check_response_to(&request),
			Err(ProtocolError::TagMismatch { .. })
		));
	}

	#[test]
	fn negative_status_is_a_failure() {
		let request = Record::request(RequestKind::CfgSave);
		let mut response = request;
		response.data[STATUS_SLOT] = -1;
		assert!(matches!(
			response.check_response_to(&request),
			Err(ProtocolError::Status(-1))
		));
		response.data[STATUS_SLOT] = 0;
		assert!(response.check_response_to(&request).is_ok());
	}

	#[test]
	fn records_cross_a_socket_intact() {
		let (a, b) = UnixStream::pair().unwrap();
		let record = Record::with_data(RequestKind::DevUsbId, [0x46d, 0xc626, 0, 0, 0, 0, 0]);
		record.encode_and_send(&a).unwrap();
		assert_eq!(Record::read_framed(&b).unwrap(), record);
	}
}
