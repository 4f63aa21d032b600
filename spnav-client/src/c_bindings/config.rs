use super::*;

use crate::{ButtonAction, InvertAxes};

// ============================================================================
// DAEMON CONFIGURATION
// ============================================================================
//
// Setters return 0 on success. Getters return the value, or -1 (-1.0 for
// sensitivity) on failure.

macro_rules! cfg_unit {
	($(#[$meta:meta])* $name:ident => $method:ident) => {
		$(#[$meta])*
		#[unsafe(no_mangle)]
		pub unsafe extern "C" fn $name(handle: *mut SpnavHandle) -> c_int {
			let handle = handle_or!(handle, -1);
			handle.call(-1, |client| client.$method().map(|()| 0))
		}
	};
}

cfg_unit!(
	/// Revert the daemon to its built-in defaults.
	spnav_cfg_reset => cfg_reset
);
cfg_unit!(
	/// Reload the daemon configuration file.
	spnav_cfg_restore => cfg_restore
);
cfg_unit!(
	/// Write the current settings to the daemon configuration file.
	spnav_cfg_save => cfg_save
);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_set_sens(handle: *mut SpnavHandle, sens: f32) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| client.cfg_set_sens(sens).map(|()| 0))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_get_sens(handle: *mut SpnavHandle) -> f32 {
	let handle = handle_or!(handle, -1.0);
	handle.call(-1.0, |client| client.cfg_get_sens())
}

/// `sens` points at six floats, translation axes first.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_set_axis_sens(handle: *mut SpnavHandle, sens: *const f32) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| {
		if sens.is_null() {
			return Err(SpnavError::InvalidArgument("NULL sensitivity vector"));
		}
		let values = unsafe { sens.cast::<[f32; 6]>().read_unaligned() };
		client.cfg_set_axis_sens(values).map(|()| 0)
	})
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_get_axis_sens(handle: *mut SpnavHandle, sens: *mut f32) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| {
		if sens.is_null() {
			return Err(SpnavError::InvalidArgument("NULL sensitivity vector"));
		}
		let values = client.cfg_get_axis_sens()?;
		unsafe { sens.cast::<[f32; 6]>().write_unaligned(values) };
		Ok(0)
	})
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_set_invert(handle: *mut SpnavHandle, invbits: c_int) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| client.cfg_set_invert(InvertAxes::from_bits_retain(invbits as u32)).map(|()| 0))
}

/// Bit 0 is the x translation, bit 5 the z rotation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_get_invert(handle: *mut SpnavHandle) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| client.cfg_get_invert().map(|axes| axes.bits() as c_int))
}

macro_rules! cfg_pair {
	($set:ident, $get:ident => $set_method:ident, $get_method:ident) => {
		#[unsafe(no_mangle)]
		pub unsafe extern "C" fn $set(handle: *mut SpnavHandle, index: c_int, value: c_int) -> c_int {
			let handle = handle_or!(handle, -1);
			handle.call(-1, |client| client.$set_method(index, value).map(|()| 0))
		}

		#[unsafe(no_mangle)]
		pub unsafe extern "C" fn $get(handle: *mut SpnavHandle, index: c_int) -> c_int {
			let handle = handle_or!(handle, -1);
			handle.call(-1, |client| client.$get_method(index))
		}
	};
}

cfg_pair!(spnav_cfg_set_deadzone, spnav_cfg_get_deadzone => cfg_set_deadzone, cfg_get_deadzone);
cfg_pair!(spnav_cfg_set_axismap, spnav_cfg_get_axismap => cfg_set_axismap, cfg_get_axismap);
cfg_pair!(spnav_cfg_set_bnmap, spnav_cfg_get_bnmap => cfg_set_bnmap, cfg_get_bnmap);
cfg_pair!(spnav_cfg_set_kbmap, spnav_cfg_get_kbmap => cfg_set_kbmap, cfg_get_kbmap);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_set_bnaction(handle: *mut SpnavHandle, bn: c_int, action: c_int) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| {
		client
			.cfg_set_bnaction(bn, ButtonAction::from_code(action))
			.map(|()| 0)
	})
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_get_bnaction(handle: *mut SpnavHandle, bn: c_int) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| client.cfg_get_bnaction(bn).map(ButtonAction::code))
}

macro_rules! cfg_flag {
	($set:ident, $get:ident => $set_method:ident, $get_method:ident) => {
		#[unsafe(no_mangle)]
		pub unsafe extern "C" fn $set(handle: *mut SpnavHandle, state: c_int) -> c_int {
			let handle = handle_or!(handle, -1);
			handle.call(-1, |client| client.$set_method(state != 0).map(|()| 0))
		}

		#[unsafe(no_mangle)]
		pub unsafe extern "C" fn $get(handle: *mut SpnavHandle) -> c_int {
			let handle = handle_or!(handle, -1);
			handle.call(-1, |client| client.$get_method().map(c_int::from))
		}
	};
}

cfg_flag!(spnav_cfg_set_swapyz, spnav_cfg_get_swapyz => cfg_set_swapyz, cfg_get_swapyz);
cfg_flag!(spnav_cfg_set_grab, spnav_cfg_get_grab => cfg_set_grab, cfg_get_grab);

/// 0 off, 1 on, 2 auto. Other values fail without contacting the daemon.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_set_led(handle: *mut SpnavHandle, state: c_int) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| client.cfg_set_led_code(state).map(|()| 0))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_get_led(handle: *mut SpnavHandle) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| client.cfg_get_led().map(|mode| mode.code()))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_set_serial(handle: *mut SpnavHandle, devpath: *const c_char) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| {
		let path = unsafe { str_arg(devpath) }?;
		client.cfg_set_serial(path).map(|()| 0)
	})
}

/// Copies the serial device path into `buf`. Returns the full length, or -1.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spnav_cfg_get_serial(
	handle: *mut SpnavHandle,
	buf: *mut c_char,
	bufsz: c_int,
) -> c_int {
	let handle = handle_or!(handle, -1);
	handle.call(-1, |client| {
		let path = client.query_string(spnav_protocol::RequestKind::GetCfgSerialDevice)?;
		Ok(unsafe { fill_buffer(&path, buf, bufsz) })
	})
}
