use spnav_protocol::{Event, EventKind};

/// Selects the events dropped by `remove_events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
	Any,
	Kind(EventKind),
}

impl EventFilter {
	pub fn matches(self, event: &Event) -> bool {
		match self {
			EventFilter::Any => true,
			EventFilter::Kind(kind) => event.kind() == kind,
		}
	}

	/// Maps a classic event type code, 0 meaning any.
	pub fn from_code(code: i32) -> Option<Self> {
		if code == 0 {
			return Some(EventFilter::Any);
		}
		EventKind::from_code(code).map(EventFilter::Kind)
	}
}

impl From<EventKind> for EventFilter {
	fn from(kind: EventKind) -> Self {
		EventFilter::Kind(kind)
	}
}

bitflags::bitflags! {
	/// Event classes a client asks the daemon to deliver.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct EventMask: u32 {
		const MOTION = 0x01;
		const BUTTON = 0x02;
		const DEV = 0x04;
		const CFG = 0x08;
		const RAWAXIS = 0x10;
		const RAWBUTTON = 0x20;

		const INPUT = Self::MOTION.bits() | Self::BUTTON.bits();
		const DEFAULT = Self::INPUT.bits() | Self::DEV.bits();
		const ALL = 0xffff;
	}
}

impl Default for EventMask {
	fn default() -> Self {
		Self::DEFAULT
	}
}
