use std::{
	ffi::{CStr, CString},
	os::raw::{c_char, c_int, c_uint},
};

use spnav_protocol::{Event, EventKind};

use crate::{SpnavClient, SpnavError};

// ============================================================================
// OPAQUE HANDLE
// ============================================================================

/// Opaque handle to an open session.
pub struct SpnavHandle {
	inner: SpnavClient,
	last_error: Option<String>,
}

impl SpnavHandle {
	fn new(inner: SpnavClient) -> Self {
		Self {
			inner,
			last_error: None,
		}
	}

	/// Runs `f` on the session, keeping the error message for
	/// `spnav_take_error()` and returning `fallback` on failure.
	fn call<T>(&mut self, fallback: T, f: impl FnOnce(&mut SpnavClient) -> Result<T, SpnavError>) -> T {
		match f(&mut self.inner) {
			Ok(value) => value,
			Err(err) => {
				tracing::debug!(%err, "C call failed");
				self.last_error = Some(err.to_string());
				fallback
			}
		}
	}
}

/// Resolves a handle pointer, returning `fallback` from the caller when it
/// is NULL.
macro_rules! handle_or {
	($handle:expr, $fallback:expr) => {
		match unsafe { $handle.as_mut() } {
			Some(h) => h,
			None => return $fallback,
		}
	};
}

pub mod config;
pub mod connection;
pub mod posrot;

unsafe fn str_arg<'a>(s: *const c_char) -> Result<&'a str, SpnavError> {
	if s.is_null() {
		return Err(SpnavError::InvalidArgument("NULL string"));
	}
	unsafe { CStr::from_ptr(s) }
		.to_str()
		.map_err(|_| SpnavError::InvalidArgument("string is not UTF-8"))
}

/// Copies a string result into a caller buffer. A NULL buffer only reports
/// the length.
unsafe fn fill_buffer(value: &[u8], buf: *mut c_char, bufsz: c_int) -> c_int {
	if !buf.is_null() && bufsz > 0 {
		let dst = unsafe { std::slice::from_raw_parts_mut(buf.cast::<u8>(), bufsz as usize) };
		spnav_protocol::copy_truncated(value, dst);
	}
	value.len() as c_int
}

fn into_c_string(value: String) -> *mut c_char {
	match CString::new(value) {
		Ok(s) => s.into_raw(),
		Err(_) => std::ptr::null_mut(),
	}
}

// ============================================================================
// EVENTS
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SpnavEventMotion {
	pub type_: c_int,
	pub x: c_int,
	pub y: c_int,
	pub z: c_int,
	pub rx: c_int,
	pub ry: c_int,
	pub rz: c_int,
	pub period: c_uint,
	/// Points at `x`, so the six axes can be indexed as an array.
	pub data: *mut c_int,
}

/// Shared by button and raw button events.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SpnavEventButton {
	pub type_: c_int,
	pub press: c_int,
	pub bnum: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SpnavEventDev {
	pub type_: c_int,
	pub op: c_int,
	pub id: c_int,
	pub devtype: c_int,
	pub usbid: [c_int; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SpnavEventCfg {
	pub type_: c_int,
	pub cfg: c_int,
	pub data: [c_int; 6],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SpnavEventAxis {
	pub type_: c_int,
	pub idx: c_int,
	pub value: c_int,
}

/// `spnav_event`: every member starts with the event type.
#[repr(C)]
#[derive(Clone, Copy)]
pub union SpnavEventC {
	pub type_: c_int,
	pub motion: SpnavEventMotion,
	pub button: SpnavEventButton,
	pub dev: SpnavEventDev,
	pub cfg: SpnavEventCfg,
	pub axis: SpnavEventAxis,
}

impl SpnavEventMotion {
	pub(crate) fn axes(&self) -> [i32; 6] {
		[self.x, self.y, self.z, self.rx, self.ry, self.rz]
	}
}

/// Writes `event` into `out` and returns its type code.
unsafe fn write_event(event: &Event, out: *mut SpnavEventC) -> c_int {
	let kind = event.kind().code();
	if out.is_null() {
		return kind;
	}
	let value = match *event {
		Event::Motion {
			x,
			y,
			z,
			rx,
			ry,
			rz,
			period,
		} => SpnavEventC {
			motion: SpnavEventMotion {
				type_: kind,
				x,
				y,
				z,
				rx,
				ry,
				rz,
				period,
				data: std::ptr::null_mut(),
			},
		},
		Event::Button { press, bnum } | Event::RawButton { bnum, press } => SpnavEventC {
			button: SpnavEventButton {
				type_: kind,
				press: press as c_int,
				bnum,
			},
		},
		Event::Device {
			op,
			id,
			devtype,
			usbid,
		} => SpnavEventC {
			dev: SpnavEventDev {
				type_: kind,
				op: op.to_word(),
				id,
				devtype,
				usbid: usbid.map(|v| v as c_int),
			},
		},
		Event::Config { cfg, data } => SpnavEventC {
			cfg: SpnavEventCfg {
				type_: kind,
				cfg,
				data,
			},
		},
		Event::RawAxis { idx, value } => SpnavEventC {
			axis: SpnavEventAxis {
				type_: kind,
				idx,
				value,
			},
		},
	};
	unsafe {
		out.write(value);
		if event.kind() == EventKind::Motion {
			let motion = &raw mut (*out).motion;
			(*motion).data = &raw mut (*motion).x;
		}
	}
	kind
}
