//! Daemon configuration requests.
//!
//! These change the daemon's settings for every client, unlike
//! [`SpnavClient::sensitivity`] which only scales this client's motion.
//! All of them need protocol 1.

use serde::{Deserialize, Serialize};
use spnav_protocol::RequestKind;

use crate::{SpnavClient, SpnavError};

const AXES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedMode {
	Off,
	On,
	Auto,
}

impl LedMode {
	pub fn code(self) -> i32 {
		match self {
			LedMode::Off => 0,
			LedMode::On => 1,
			LedMode::Auto => 2,
		}
	}

	pub fn from_code(code: i32) -> Option<Self> {
		match code {
			0 => Some(LedMode::Off),
			1 => Some(LedMode::On),
			2 => Some(LedMode::Auto),
			_ => None,
		}
	}
}

/// What the daemon does when a button is pressed, besides reporting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
	None,
	SensReset,
	SensInc,
	SensDec,
	DisableRot,
	DisableTrans,
	Other(i32),
}

impl ButtonAction {
	pub fn code(self) -> i32 {
		match self {
			ButtonAction::None => 0,
			ButtonAction::SensReset => 1,
			ButtonAction::SensInc => 2,
			ButtonAction::SensDec => 3,
			ButtonAction::DisableRot => 4,
			ButtonAction::DisableTrans => 5,
			ButtonAction::Other(code) => code,
		}
	}

	pub fn from_code(code: i32) -> Self {
		match code {
			0 => ButtonAction::None,
			1 => ButtonAction::SensReset,
			2 => ButtonAction::SensInc,
			3 => ButtonAction::SensDec,
			4 => ButtonAction::DisableRot,
			5 => ButtonAction::DisableTrans,
			other => ButtonAction::Other(other),
		}
	}
}

/// Device model as reported by the daemon. Codes the library does not know
/// are kept as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceType(pub i32);

impl DeviceType {
	pub const UNKNOWN: Self = Self(0);

	pub const SB2003: Self = Self(0x100);
	pub const SB3003: Self = Self(0x101);
	pub const SB4000: Self = Self(0x102);
	pub const SM: Self = Self(0x103);
	pub const SM5000: Self = Self(0x104);
	pub const SMCADMAN: Self = Self(0x105);

	pub const PLUSXT: Self = Self(0x200);
	pub const CADMAN: Self = Self(0x201);
	pub const SMCLASSIC: Self = Self(0x202);
	pub const SB5000: Self = Self(0x203);
	pub const STRAVEL: Self = Self(0x204);
	pub const SPILOT: Self = Self(0x205);
	pub const SNAV: Self = Self(0x206);
	pub const SEXP: Self = Self(0x207);
	pub const SNAVNB: Self = Self(0x208);
	pub const SPILOTPRO: Self = Self(0x209);
	pub const SMPRO: Self = Self(0x20a);
	pub const NULOOQ: Self = Self(0x20b);
	pub const SMW: Self = Self(0x20c);
	pub const SMPROW: Self = Self(0x20d);
	pub const SMENT: Self = Self(0x20e);
	pub const SMCOMP: Self = Self(0x20f);
	pub const SMMOD: Self = Self(0x210);

	const NAMES: &'static [(DeviceType, &'static str)] = &[
		(Self::UNKNOWN, "unknown"),
		(Self::SB2003, "Spaceball 1003/2003/2003C"),
		(Self::SB3003, "Spaceball 3003/3003C"),
		(Self::SB4000, "Spaceball 4000FLX/5000FLX"),
		(Self::SM, "Magellan SpaceMouse"),
		(Self::SM5000, "Spaceball 5000"),
		(Self::SMCADMAN, "CadMan (serial)"),
		(Self::PLUSXT, "SpaceMouse Plus XT"),
		(Self::CADMAN, "CadMan USB"),
		(Self::SMCLASSIC, "SpaceMouse Classic"),
		(Self::SB5000, "Spaceball 5000 USB"),
		(Self::STRAVEL, "Space Traveller"),
		(Self::SPILOT, "Space Pilot"),
		(Self::SNAV, "Space Navigator"),
		(Self::SEXP, "Space Explorer"),
		(Self::SNAVNB, "Space Navigator for Notebooks"),
		(Self::SPILOTPRO, "Space Pilot Pro"),
		(Self::SMPRO, "SpaceMouse Pro"),
		(Self::NULOOQ, "NuLOOQ"),
		(Self::SMW, "SpaceMouse Wireless"),
		(Self::SMPROW, "SpaceMouse Pro Wireless"),
		(Self::SMENT, "SpaceMouse Enterprise"),
		(Self::SMCOMP, "SpaceMouse Compact"),
		(Self::SMMOD, "SpaceMouse Module"),
	];

	pub fn name(self) -> Option<&'static str> {
		Self::NAMES
			.iter()
			.find(|(ty, _)| *ty == self)
			.map(|(_, name)| *name)
	}

	pub fn is_serial(self) -> bool {
		self.0 & 0xff00 == 0x100
	}

	pub fn is_usb(self) -> bool {
		self.0 & 0xff00 == 0x200
	}
}

impl Default for DeviceType {
	fn default() -> Self {
		Self::UNKNOWN
	}
}

impl std::fmt::Display for DeviceType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.name() {
			Some(name) => f.write_str(name),
			None => write!(f, "device type {:#x}", self.0),
		}
	}
}

bitflags::bitflags! {
	/// Axes whose direction the daemon flips.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct InvertAxes: u32 {
		const TX = 1 << 0;
		const TY = 1 << 1;
		const TZ = 1 << 2;
		const RX = 1 << 3;
		const RY = 1 << 4;
		const RZ = 1 << 5;
	}
}

impl InvertAxes {
	/// One boolean word per axis, tx first.
	pub fn to_words(self) -> [i32; AXES] {
		std::array::from_fn(|axis| ((self.bits() >> axis) & 1) as i32)
	}

	pub fn from_words(words: &[i32]) -> Self {
		words
			.iter()
			.take(AXES)
			.enumerate()
			.filter(|(_, word)| **word != 0)
			.fold(Self::empty(), |axes, (axis, _)| axes | Self::from_bits_retain(1 << axis))
	}
}

fn payload(words: &[i32]) -> [i32; 7] {
	let mut data = [0; 7];
	data[..words.len()].copy_from_slice(words);
	data
}

impl SpnavClient {
	fn cfg_set(&mut self, kind: RequestKind, words: &[i32]) -> Result<(), SpnavError> {
		self.call(kind, payload(words))?;
		Ok(())
	}

	fn cfg_get(&mut self, kind: RequestKind) -> Result<i32, SpnavError> {
		Ok(self.call(kind, [0; 7])?.data[0])
	}

	/// Per-index settings answer with the index echoed in `data[0]`.
	fn cfg_get_indexed(&mut self, kind: RequestKind, index: i32) -> Result<i32, SpnavError> {
		Ok(self.call(kind, payload(&[index]))?.data[1])
	}

	/// Reverts the daemon to its built-in defaults.
	pub fn cfg_reset(&mut self) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::CfgReset, &[])
	}

	/// Reloads the daemon's configuration file.
	pub fn cfg_restore(&mut self) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::CfgRestore, &[])
	}

	/// Writes the current settings to the daemon's configuration file.
	pub fn cfg_save(&mut self) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::CfgSave, &[])
	}

	/// Global sensitivity.
	pub fn cfg_set_sens(&mut self, sens: f32) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::SetCfgSens, &[sens.to_bits() as i32])
	}

	pub fn cfg_get_sens(&mut self) -> Result<f32, SpnavError> {
		Ok(self.call(RequestKind::GetCfgSens, [0; 7])?.data_f32(0))
	}

	/// Per-axis sensitivity, translation axes first.
	pub fn cfg_set_axis_sens(&mut self, sens: [f32; AXES]) -> Result<(), SpnavError> {
		self.cfg_set(
			RequestKind::SetCfgAxisSens,
			&sens.map(|value| value.to_bits() as i32),
		)
	}

	pub fn cfg_get_axis_sens(&mut self) -> Result<[f32; AXES], SpnavError> {
		let response = self.call(RequestKind::GetCfgAxisSens, [0; 7])?;
		Ok(std::array::from_fn(|axis| response.data_f32(axis)))
	}

	pub fn cfg_set_deadzone(&mut self, axis: i32, delta: i32) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::SetCfgDeadzone, &[axis, delta])
	}

	pub fn cfg_get_deadzone(&mut self, axis: i32) -> Result<i32, SpnavError> {
		self.cfg_get_indexed(RequestKind::GetCfgDeadzone, axis)
	}

	pub fn cfg_set_invert(&mut self, axes: InvertAxes) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::SetCfgInvert, &axes.to_words())
	}

	pub fn cfg_get_invert(&mut self) -> Result<InvertAxes, SpnavError> {
		let response = self.call(RequestKind::GetCfgInvert, [0; 7])?;
		Ok(InvertAxes::from_words(&response.data[..AXES]))
	}

	/// Routes device axis `dev_axis` to the reported axis `axis`.
	pub fn cfg_set_axismap(&mut self, dev_axis: i32, axis: i32) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::SetCfgAxisMap, &[dev_axis, axis])
	}

	pub fn cfg_get_axismap(&mut self, dev_axis: i32) -> Result<i32, SpnavError> {
		self.cfg_get_indexed(RequestKind::GetCfgAxisMap, dev_axis)
	}

	pub fn cfg_set_bnmap(&mut self, dev_button: i32, button: i32) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::SetCfgButtonMap, &[dev_button, button])
	}

	pub fn cfg_get_bnmap(&mut self, dev_button: i32) -> Result<i32, SpnavError> {
		self.cfg_get_indexed(RequestKind::GetCfgButtonMap, dev_button)
	}

	pub fn cfg_set_bnaction(&mut self, button: i32, action: ButtonAction) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::SetCfgButtonAction, &[button, action.code()])
	}

	pub fn cfg_get_bnaction(&mut self, button: i32) -> Result<ButtonAction, SpnavError> {
		self.cfg_get_indexed(RequestKind::GetCfgButtonAction, button)
			.map(ButtonAction::from_code)
	}

	/// Makes the daemon emit `key` (an X keysym) when `button` is pressed.
	pub fn cfg_set_kbmap(&mut self, button: i32, key: i32) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::SetCfgKeyMap, &[button, key])
	}

	pub fn cfg_get_kbmap(&mut self, button: i32) -> Result<i32, SpnavError> {
		self.cfg_get_indexed(RequestKind::GetCfgKeyMap, button)
	}

	pub fn cfg_set_swapyz(&mut self, swap: bool) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::SetCfgSwapYz, &[swap as i32])
	}

	pub fn cfg_get_swapyz(&mut self) -> Result<bool, SpnavError> {
		Ok(self.cfg_get(RequestKind::GetCfgSwapYz)? != 0)
	}

	pub fn cfg_set_led(&mut self, mode: LedMode) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::SetCfgLed, &[mode.code()])
	}

	/// Raw LED code as used by the C interface. Anything outside 0..3 is
	/// refused before reaching the daemon.
	pub fn cfg_set_led_code(&mut self, code: i32) -> Result<(), SpnavError> {
		let mode = LedMode::from_code(code).ok_or(SpnavError::InvalidArgument("led mode"))?;
		self.cfg_set_led(mode)
	}

	pub fn cfg_get_led(&mut self) -> Result<LedMode, SpnavError> {
		let code = self.cfg_get(RequestKind::GetCfgLed)?;
		LedMode::from_code(code).ok_or(SpnavError::Unexpected("led mode out of range"))
	}

	/// Exclusive access to the device, keeping other input drivers away.
	pub fn cfg_set_grab(&mut self, grab: bool) -> Result<(), SpnavError> {
		self.cfg_set(RequestKind::SetCfgGrab, &[grab as i32])
	}

	pub fn cfg_get_grab(&mut self) -> Result<bool, SpnavError> {
		Ok(self.cfg_get(RequestKind::GetCfgGrab)? != 0)
	}

	/// Serial device the daemon should open.
	pub fn cfg_set_serial(&mut self, path: &str) -> Result<(), SpnavError> {
		self.send_string(RequestKind::SetCfgSerialDevice, path)
	}

	pub fn cfg_get_serial(&mut self) -> Result<String, SpnavError> {
		let bytes = self.query_string(RequestKind::GetCfgSerialDevice)?;
		Ok(String::from_utf8_lossy(&bytes).into_owned())
	}

	pub fn cfg_get_serial_into(&mut self, buf: &mut [u8]) -> Result<usize, SpnavError> {
		self.query_string_into(RequestKind::GetCfgSerialDevice, buf)
	}
}
