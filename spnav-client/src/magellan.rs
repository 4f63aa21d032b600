//! Event shapes of the legacy Magellan X11 SDK.
//!
//! Applications written against that SDK receive motion either as raw
//! integers with a period in milliseconds-ish units, or as scaled doubles.
//! Only motion and button events have a Magellan form.

use spnav_protocol::{Event, EventKind};

use crate::{EventFilter, SpnavClient, SpnavError};

pub const MOTION_EVENT: i32 = 1;
pub const BUTTON_PRESS_EVENT: i32 = 2;
pub const BUTTON_RELEASE_EVENT: i32 = 3;

/// Integer event, as filled in by `MagellanInputEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagellanIntEvent {
	/// Axes `x y z a b c` followed by the rescaled period.
	Motion { data: [i32; 7] },
	ButtonPress { button: i32 },
	ButtonRelease { button: i32 },
}

impl MagellanIntEvent {
	pub fn from_event(event: &Event) -> Option<Self> {
		match *event {
			Event::Motion { period, .. } => {
				let axes = event.motion_axes()?;
				let mut data = [0; 7];
				data[..6].copy_from_slice(&axes);
				data[6] = (period as i64 * 1000 / 60) as i32;
				Some(Self::Motion { data })
			}
			Event::Button { press: true, bnum } => Some(Self::ButtonPress { button: bnum }),
			Event::Button { press: false, bnum } => Some(Self::ButtonRelease { button: bnum }),
			_ => None,
		}
	}

	pub fn type_code(&self) -> i32 {
		match self {
			Self::Motion { .. } => MOTION_EVENT,
			Self::ButtonPress { .. } => BUTTON_PRESS_EVENT,
			Self::ButtonRelease { .. } => BUTTON_RELEASE_EVENT,
		}
	}
}

/// Scaled event, as filled in by `MagellanTranslateEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MagellanFloatEvent {
	pub kind: i32,
	pub button: i32,
	pub data: [f64; 6],
	pub period: i32,
}

impl MagellanFloatEvent {
	/// Translation axes are multiplied by `tscale`, rotation axes by
	/// `rscale`. The period is passed through unchanged.
	pub fn from_event(event: &Event, tscale: f64, rscale: f64) -> Option<Self> {
		match *event {
			Event::Motion { period, .. } => {
				let axes = event.motion_axes()?;
				let data = std::array::from_fn(|i| {
					axes[i] as f64 * if i < 3 { tscale } else { rscale }
				});
				Some(Self {
					kind: MOTION_EVENT,
					button: 0,
					data,
					period: period as i32,
				})
			}
			Event::Button { press, bnum } => Some(Self {
				kind: if press {
					BUTTON_PRESS_EVENT
				} else {
					BUTTON_RELEASE_EVENT
				},
				button: bnum,
				..Self::default()
			}),
			_ => None,
		}
	}
}

impl SpnavClient {
	/// Drops queued motion so the next event reflects the current state.
	pub fn remove_motion_events(&mut self) -> Result<usize, SpnavError> {
		self.remove_events(EventFilter::Kind(EventKind::Motion))
	}
}
