use super::*;

use crate::{EventFilter, EventMask, SpnavConfig};

// ============================================================================
// CONNECTION AND BASIC OPERATIONS
// ============================================================================

fn open_handle(config: &SpnavConfig) -> *mut SpnavHandle {
	let mut client = SpnavClient::new();
	match client.open_with(config) {
		Ok(()) => Box::into_raw(Box::new(SpnavHandle::new(client))),
		Err(err) => {
			tracing::debug!(%err, "spnav_open failed");
			std::ptr::null_mut()
		}
	}
}

/// Connect to the daemon socket chosen by `SPNAV_SOCKET`, `/etc/spnavrc` or
/// the default path. Returns NULL on failure.
#[unsafe(no_mangle)]
pub extern "C" fn spnav_open() -> *mut SpnavHandle {
	open_handle(&SpnavConfig::from_env())
}

/// Connect to the daemon socket at an explicit path.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_open_path(socket_path: *const c_char) -> *mut SpnavHandle {
	match unsafe { str_arg(socket_path) } {
		Ok(path) => open_handle(&SpnavConfig::default().set_socket_path(path)),
		Err(_) => std::ptr::null_mut(),
	}
}

/// Close the session and free the handle. Returns -1 for a NULL handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_close(handle: *mut SpnavHandle) -> c_int {
	if handle.is_null() {
		return -1;
	}
	let mut handle = unsafe { Box::from_raw(handle) };
	match handle.inner.close() {
		Ok(()) => 0,
		Err(err) => {
			tracing::debug!(%err, "spnav_close failed");
			-1
		}
	}
}

/// Free a string returned by C bindings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_string_free(s: *mut c_char) {
	if !s.is_null() {
		unsafe {
			drop(CString::from_raw(s));
		}
	}
}

/// Take and clear the last error message. Caller must free with `spnav_string_free()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_take_error(handle: *mut SpnavHandle) -> *mut c_char {
	let handle = handle_or!(handle, std::ptr::null_mut());
	match handle.last_error.take() {
		Some(err) => into_c_string(err),
		None => std::ptr::null_mut(),
	}
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_fd(handle: *mut SpnavHandle) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| client.fd())
}

/// Negotiated protocol version, 0 for old daemons.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_protocol(handle: *mut SpnavHandle) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| client.protocol().map(|v| v as c_int))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_sensitivity(handle: *mut SpnavHandle, sens: f64) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| client.sensitivity(sens).map(|()| 0))
}

// ============================================================================
// EVENTS
// ============================================================================

/// Fetch a pending event without blocking. Returns the event type, or 0 if
/// nothing is pending or on error.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_poll_event(handle: *mut SpnavHandle, event: *mut SpnavEventC) -> c_int {
	let handle = handle_or!(handle, 0);
	match handle.call(None, |client| client.poll_event()) {
		Some(ev) => unsafe { write_event(&ev, event) },
		None => 0,
	}
}

/// Block until an event arrives. Returns the event type, or 0 on error.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_wait_event(handle: *mut SpnavHandle, event: *mut SpnavEventC) -> c_int {
	let handle = handle_or!(handle, 0);
	match handle.call(None, |client| client.wait_event().map(Some)) {
		Some(ev) => unsafe { write_event(&ev, event) },
		None => 0,
	}
}

/// Drop pending events of type `type_` (0 for any type). Returns how many
/// were dropped, or -1 on error.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_remove_events(handle: *mut SpnavHandle, type_: c_int) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| {
		let filter = EventFilter::from_code(type_)
			.ok_or(SpnavError::InvalidArgument("unknown event type"))?;
		client.remove_events(filter).map(|n| n as c_int)
	})
}

// ============================================================================
// CLIENT SETTINGS AND DEVICE QUERIES
// ============================================================================

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_client_name(handle: *mut SpnavHandle, name: *const c_char) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| {
		let name = unsafe { str_arg(name) }?;
		client.client_name(name).map(|()| 0)
	})
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_evmask(handle: *mut SpnavHandle, mask: c_uint) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| client.evmask(EventMask::from_bits_retain(mask)).map(|()| 0))
}

/// Copies the device name into `buf` (may be NULL). Returns the full length,
/// or -1 on error.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_dev_name(
	handle: *mut SpnavHandle,
	buf: *mut c_char,
	bufsz: c_int,
) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| {
		let name = client.query_string(spnav_protocol::RequestKind::DevName)?;
		Ok(unsafe { fill_buffer(&name, buf, bufsz) })
	})
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_dev_path(
	handle: *mut SpnavHandle,
	buf: *mut c_char,
	bufsz: c_int,
) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| {
		let path = client.query_string(spnav_protocol::RequestKind::DevPath)?;
		Ok(unsafe { fill_buffer(&path, buf, bufsz) })
	})
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_dev_buttons(handle: *mut SpnavHandle) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.inner.dev_buttons() as c_int
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_dev_axes(handle: *mut SpnavHandle) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.inner.dev_axes() as c_int
}

/// Writes vendor and product id to `ids[0]` and `ids[1]`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_dev_usbid(handle: *mut SpnavHandle, ids: *mut c_uint) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| {
		if ids.is_null() {
			return Err(SpnavError::InvalidArgument("NULL id buffer"));
		}
		let (vendor, product) = client.dev_usbid()?;
		unsafe {
			ids.write(vendor);
			ids.add(1).write(product);
		}
		Ok(0)
	})
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_dev_type(handle: *mut SpnavHandle) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| client.dev_type().map(|ty| ty.0))
}
