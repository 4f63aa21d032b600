use serde::{Deserialize, Serialize};

/// First word of an unsolicited event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum RawEventCode {
	Motion = 0,
	Press = 1,
	Release = 2,
	Device = 3,
	Config = 4,
	RawAxis = 5,
	RawButton = 6,
}

impl RawEventCode {
	pub fn from_word(word: i32) -> Option<Self> {
		Some(match word {
			0 => Self::Motion,
			1 => Self::Press,
			2 => Self::Release,
			3 => Self::Device,
			4 => Self::Config,
			5 => Self::RawAxis,
			6 => Self::RawButton,
			_ => return None,
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOp {
	Add,
	Remove,
	Other(i32),
}

impl DeviceOp {
	pub fn from_word(word: i32) -> Self {
		match word {
			0 => Self::Add,
			1 => Self::Remove,
			other => Self::Other(other),
		}
	}

	pub fn to_word(self) -> i32 {
		match self {
			Self::Add => 0,
			Self::Remove => 1,
			Self::Other(other) => other,
		}
	}
}

/// A decoded daemon event. Motion values are deltas since the previous
/// sample; `period` is the device reported sample period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
	Motion {
		x: i32,
		y: i32,
		z: i32,
		rx: i32,
		ry: i32,
		rz: i32,
		period: u32,
	},
	Button {
		press: bool,
		bnum: i32,
	},
	Device {
		op: DeviceOp,
		id: i32,
		devtype: i32,
		/// USB vendor and product id, `[0, 0]` for serial devices.
		usbid: [u32; 2],
	},
	/// A setting changed; `cfg` is the matching get-request code and `data`
	/// mirrors its response payload.
	Config {
		cfg: i32,
		data: [i32; 6],
	},
	RawAxis {
		idx: i32,
		value: i32,
	},
	RawButton {
		bnum: i32,
		press: bool,
	},
}

/// Payload-free event discriminant. The numeric values are the classic
/// `SPNAV_EVENT_*` codes, 0 being reserved for "no event"/"any".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum EventKind {
	Motion = 1,
	Button = 2,
	Device = 3,
	Config = 4,
	RawAxis = 5,
	RawButton = 6,
}

impl EventKind {
	pub fn code(self) -> i32 {
		self as i32
	}

	pub fn from_code(code: i32) -> Option<Self> {
		Some(match code {
			1 => Self::Motion,
			2 => Self::Button,
			3 => Self::Device,
			4 => Self::Config,
			5 => Self::RawAxis,
			6 => Self::RawButton,
			_ => return None,
		})
	}
}

impl Event {
	/// Decodes a raw event record. Unknown codes yield `None`.
	pub fn from_words(words: &[i32; 8]) -> Option<Self> {
		let code = RawEventCode::from_word(words[0])?;
		Some(match code {
			RawEventCode::Motion => Event::Motion {
				x: words[1],
				y: words[2],
				z: words[3],
				rx: words[4],
				ry: words[5],
				rz: words[6],
				period: words[7] as u32,
			},
			RawEventCode::Press | RawEventCode::Release => Event::Button {
				press: code == RawEventCode::Press,
				bnum: words[1],
			},
			RawEventCode::Device => Event::Device {
				op: DeviceOp::from_word(words[1]),
				id: words[2],
				devtype: words[3],
				usbid: [words[4] as u32, words[5] as u32],
			},
			RawEventCode::Config => {
				let mut data = [0; 6];
				data.copy_from_slice(&words[2..8]);
				Event::Config {
					cfg: words[1],
					data,
				}
			}
			RawEventCode::RawAxis => Event::RawAxis {
				idx: words[1],
				value: words[2],
			},
			RawEventCode::RawButton => Event::RawButton {
				bnum: words[1],
				press: words[2] != 0,
			},
		})
	}

	/// Encodes the event the way the daemon puts it on the wire.
	pub fn to_words(&self) -> [i32; 8] {
		let mut words = [0i32; 8];
		match *self {
			Event::Motion {
				x,
				y,
				z,
				rx,
				ry,
				rz,
				period,
			} => {
				words[0] = RawEventCode::Motion as i32;
				words[1..7].copy_from_slice(&[x, y, z, rx, ry, rz]);
				words[7] = period as i32;
			}
			Event::Button { press, bnum } => {
				words[0] = if press {
					RawEventCode::Press as i32
				} else {
					RawEventCode::Release as i32
				};
				words[1] = bnum;
			}
			Event::Device {
				op,
				id,
				devtype,
				usbid,
			} => {
				words[0] = RawEventCode::Device as i32;
				words[1] = op.to_word();
				words[2] = id;
				words[3] = devtype;
				words[4] = usbid[0] as i32;
				words[5] = usbid[1] as i32;
			}
			Event::Config { cfg, data } => {
				words[0] = RawEventCode::Config as i32;
				words[1] = cfg;
				words[2..8].copy_from_slice(&data);
			}
			Event::RawAxis { idx, value } => {
				words[0] = RawEventCode::RawAxis as i32;
				words[1] = idx;
				words[2] = value;
			}
			Event::RawButton { bnum, press } => {
				words[0] = RawEventCode::RawButton as i32;
				words[1] = bnum;
				words[2] = press as i32;
			}
		}
		words
	}

	pub fn kind(&self) -> EventKind {
		match self {
			Event::Motion { .. } => EventKind::Motion,
			Event::Button { .. } => EventKind::Button,
			Event::Device { .. } => EventKind::Device,
			Event::Config { .. } => EventKind::Config,
			Event::RawAxis { .. } => EventKind::RawAxis,
			Event::RawButton { .. } => EventKind::RawButton,
		}
	}

	/// Translation and rotation deltas of a motion event.
	pub fn motion_axes(&self) -> Option<[i32; 6]> {
		match *self {
			Event::Motion {
				x,
				y,
				z,
				rx,
				ry,
				rz,
				..
			} => Some([x, y, z, rx, ry, rz]),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn motion_words_map_to_axes_and_period() {
		let event = Event::from_words(&[0, 1, -2, 3, -4, 5, -6, 16]).unwrap();
		assert_eq!(
			event,
			Event::Motion {
				x: 1,
				y: -2,
				z: 3,
				rx: -4,
				ry: 5,
				rz: -6,
				period: 16,
			}
		);
		assert_eq!(event.motion_axes(), Some([1, -2, 3, -4, 5, -6]));
	}

	#[test]
	fn press_and_release_are_both_button_events() {
		let press = Event::from_words(&[1, 3, 0, 0, 0, 0, 0, 0]).unwrap();
		let release = Event::from_words(&[2, 3, 0, 0, 0, 0, 0, 0]).unwrap();
		assert_eq!(press, Event::Button { press: true, bnum: 3 });
		assert_eq!(release, Event::Button { press: false, bnum: 3 });
		assert_eq!(press.kind(), release.kind());
	}

	#[test]
	fn raw_button_reads_state_from_second_word() {
		let event = Event::from_words(&[6, 12, 1, 0, 0, 0, 0, 0]).unwrap();
		assert_eq!(event, Event::RawButton { bnum: 12, press: true });
	}

	#[test]
	fn device_and_config_payloads() {
		let dev = Event::from_words(&[3, 1, 7, 0x20c, 0x46d, 0xc626, 0, 0]).unwrap();
		assert_eq!(
			dev,
			Event::Device {
				op: DeviceOp::Remove,
				id: 7,
				devtype: 0x20c,
				usbid: [0x46d, 0xc626],
			}
		);
		let cfg = Event::from_words(&[4, 0x3013, 2, 0, 0, 0, 0, 9]).unwrap();
		assert_eq!(
			cfg,
			Event::Config {
				cfg: 0x3013,
				data: [2, 0, 0, 0, 0, 9],
			}
		);
	}

	#[test]
	fn out_of_range_codes_are_not_events() {
		assert_eq!(Event::from_words(&[-1, 0, 0, 0, 0, 0, 0, 0]), None);
		assert_eq!(Event::from_words(&[7, 0, 0, 0, 0, 0, 0, 0]), None);
	}

	#[test]
	fn to_words_matches_daemon_layout() {
		let events = [
			Event::Button { press: false, bnum: 1 },
			Event::RawAxis { idx: 2, value: -300 },
			Event::Config {
				cfg: 0x3001,
				data: [1, 2, 3, 4, 5, 6],
			},
		];
		for event in events {
			assert_eq!(Event::from_words(&event.to_words()), Some(event));
		}
	}

	#[test]
	fn kind_codes_match_classic_values() {
		assert_eq!(EventKind::Motion.code(), 1);
		assert_eq!(EventKind::RawButton.code(), 6);
		assert_eq!(EventKind::from_code(0), None);
		assert_eq!(EventKind::from_code(4), Some(EventKind::Config));
	}

	#[test]
	fn events_serialize_with_a_type_tag() {
		let value = serde_json::to_value(Event::Button { press: true, bnum: 0 }).unwrap();
		assert_eq!(value["type"], "button");
		assert_eq!(value["press"], true);
	}
}
