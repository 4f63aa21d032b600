//! Chunked string transfers.
//!
//! A string travels as a sequence of records carrying 24 bytes each in
//! `data[0..6]`. `data[6]` holds the number of bytes still to come, counting
//! the current chunk. The first record of a transfer has the continuation bit
//! clear, so its length word is the total string length.

use crate::{ProtocolError, Record, STATUS_SLOT};

pub const CHUNK_SIZE: usize = 24;
pub const CONT_BIT: i32 = 0x8000;
pub const MAX_STRING_LEN: usize = 0x7fff;
const LEN_MASK: i32 = 0x7fff;

/// Splits `value` into the records of one transfer. Every record gets `kind`
/// as is, so callers pass the tagged kind.
pub fn encode_string(kind: i32, value: &[u8]) -> Result<Vec<Record>, ProtocolError> {
	if value.len() > MAX_STRING_LEN {
		return Err(ProtocolError::StringTooLong(value.len()));
	}
	let mut records = Vec::with_capacity(value.len().div_ceil(CHUNK_SIZE).max(1));
	let mut rest = value;
	let mut cont = 0;
	loop {
		let take = rest.len().min(CHUNK_SIZE);
		let mut record = Record {
			kind,
			data: [0; 7],
		};
		record.set_payload_bytes(&rest[..take]);
		record.data[STATUS_SLOT] = rest.len() as i32 | cont;
		records.push(record);

		rest = &rest[take..];
		cont = CONT_BIT;
		if rest.is_empty() {
			break;
		}
	}
	Ok(records)
}

/// Receiving side of a string transfer.
#[derive(Debug, Default)]
pub struct StringAssembler {
	buf: Vec<u8>,
	total: usize,
	expect: usize,
	started: bool,
	complete: bool,
}

impl StringAssembler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Feeds one record. Returns `Ok(true)` once the last chunk arrived.
	pub fn push(&mut self, record: &Record) -> Result<bool, ProtocolError> {
		let word = record.data[STATUS_SLOT];
		if word < 0 {
			return Err(ProtocolError::InvalidString("negative length"));
		}
		let len = (word & LEN_MASK) as usize;

		if word & CONT_BIT == 0 {
			self.buf = Vec::with_capacity(len + 1);
			self.total = len;
			self.expect = len;
			self.started = true;
			self.complete = false;
		} else if !self.started {
			return Err(ProtocolError::InvalidString("continuation before first chunk"));
		} else if self.complete {
			return Err(ProtocolError::InvalidString("chunk after the end of the string"));
		}

		if len != self.expect {
			return Err(ProtocolError::InvalidString("remaining length mismatch"));
		}
		let take = len.min(CHUNK_SIZE);
		if self.buf.len() + take > self.total {
			return Err(ProtocolError::InvalidString("chunk overruns the buffer"));
		}
		self.buf.extend_from_slice(&record.payload_bytes()[..take]);
		self.expect -= take;

		if self.expect == 0 {
			self.buf.push(0);
			self.complete = true;
		}
		Ok(self.complete)
	}

	pub fn is_complete(&self) -> bool {
		self.complete
	}

	/// Full string length announced by the first chunk.
	pub fn total_len(&self) -> usize {
		self.total
	}

	/// The assembled string including its NUL terminator.
	pub fn bytes_with_nul(&self) -> Option<&[u8]> {
		self.complete.then_some(self.buf.as_slice())
	}

	/// The assembled bytes without the terminator.
	pub fn into_bytes(mut self) -> Result<Vec<u8>, ProtocolError> {
		if !self.complete {
			return Err(ProtocolError::InvalidString("transfer incomplete"));
		}
		self.buf.pop();
		Ok(self.buf)
	}

	pub fn into_string(self) -> Result<String, ProtocolError> {
		let bytes = self.into_bytes()?;
		Ok(String::from_utf8_lossy(&bytes).into_owned())
	}
}

/// Copies `src` into a C style buffer, truncating if needed. The result is
/// always NUL terminated when `dst` is not empty. Returns the full length of
/// `src` so callers can detect truncation.
pub fn copy_truncated(src: &[u8], dst: &mut [u8]) -> usize {
	if let Some(room) = dst.len().checked_sub(1) {
		let n = src.len().min(room);
		dst[..n].copy_from_slice(&src[..n]);
		dst[n] = 0;
	}
	src.len()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::RequestKind;

	fn transfer(value: &[u8]) -> StringAssembler {
		let records = encode_string(RequestKind::DevName.tagged(), value).unwrap();
		let mut asm = StringAssembler::new();
		let last = records.len() - 1;
		for (i, record) in records.iter().enumerate() {
			assert_eq!(asm.push(record).unwrap(), i == last);
		}
		asm
	}

	#[test]
	fn chunk_boundaries_reassemble_exactly() {
		for len in [CHUNK_SIZE - 1, CHUNK_SIZE, CHUNK_SIZE + 1, 3 * CHUNK_SIZE] {
			let value: Vec<u8> = (0..len).map(|i| b'a' + (i % 26) as u8).collect();
			let asm = transfer(&value);
			assert_eq!(asm.total_len(), len);
			let bytes = asm.bytes_with_nul().unwrap();
			assert_eq!(bytes.len(), len + 1);
			assert_eq!(&bytes[..len], value.as_slice());
			assert_eq!(bytes[len], 0);
			assert_eq!(asm.into_string().unwrap().as_bytes(), value.as_slice());
		}
	}

	#[test]
	fn record_count_follows_chunk_size() {
		let kind = RequestKind::DevPath.tagged();
		assert_eq!(encode_string(kind, b"").unwrap().len(), 1);
		assert_eq!(encode_string(kind, &[b'x'; 24]).unwrap().len(), 1);
		let records = encode_string(kind, &[b'x'; 25]).unwrap();
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].data[STATUS_SLOT], 25);
		assert_eq!(records[1].data[STATUS_SLOT], 1 | CONT_BIT);
	}

	#[test]
	fn empty_string_is_a_single_terminated_chunk() {
		let asm = transfer(b"");
		assert_eq!(asm.bytes_with_nul(), Some(&b"\0"[..]));
	}

	#[test]
	fn mismatched_continuation_aborts() {
		let kind = RequestKind::DevName.tagged();
		let mut records = encode_string(kind, &[b'q'; 40]).unwrap();
		records[1].data[STATUS_SLOT] = 15 | CONT_BIT;
		let mut asm = StringAssembler::new();
		assert!(!asm.push(&records[0]).unwrap());
		assert!(asm.push(&records[1]).is_err());
	}

	#[test]
	fn negative_length_aborts() {
		let mut record = Record::request(RequestKind::DevName);
		record.data[STATUS_SLOT] = -1;
		assert!(StringAssembler::new().push(&record).is_err());
	}

	#[test]
	fn continuation_without_start_aborts() {
		let mut record = Record::request(RequestKind::DevName);
		record.data[STATUS_SLOT] = 4 | CONT_BIT;
		assert!(StringAssembler::new().push(&record).is_err());
	}

	#[test]
	fn oversized_strings_are_refused() {
		let value = vec![b'z'; MAX_STRING_LEN + 1];
		assert!(matches!(
			encode_string(0, &value),
			Err(ProtocolError::StringTooLong(_))
		));
	}

	#[test]
	fn truncated_copies_report_full_length() {
		let mut small = [0xffu8; 5];
		assert_eq!(copy_truncated(b"SpaceMouse", &mut small), 10);
		assert_eq!(&small, b"Spac\0");

		let mut exact = [0xffu8; 11];
		assert_eq!(copy_truncated(b"SpaceMouse", &mut exact), 10);
		assert_eq!(&exact, b"SpaceMouse\0");

		assert_eq!(copy_truncated(b"abc", &mut []), 3);
	}
}
