use const_str::convert_ascii_case;

macro_rules! define_requests {
	($( $variant:ident => $wire:ident = $code:literal ),* $(,)?) => {
		/// Request kinds understood by protocol v1 daemons.
		///
		/// `S*`/`Set*` requests change a setting, `G*`/`Get*` requests query one.
		/// Responses echo the tagged kind; `data[6]` carries the status unless
		/// the response is a string transfer.
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
		pub enum RequestKind {
			$( $variant, )*
		}

		impl RequestKind {
			pub const ALL: &'static [RequestKind] = &[$( RequestKind::$variant, )*];

			/// Untagged numeric code.
			pub const fn code(self) -> i32 {
				match self {
					$( RequestKind::$variant => $code, )*
				}
			}

			/// Lowercase wire name, used in logs.
			pub const fn name(self) -> &'static str {
				match self {
					$( RequestKind::$variant => {
						const RAW: &str = stringify!($wire);
						const LOWER: &str = convert_ascii_case!(lower, RAW);
						LOWER
					} )*
				}
			}

			/// Looks up a kind from a tagged or untagged code.
			pub fn from_code(code: i32) -> Option<Self> {
				let code = code & !crate::REQ_TAG;
				Self::ALL.iter().copied().find(|kind| kind.code() == code)
			}
		}
	};
}

define_requests! {
	SetName => SET_NAME = 0x1000,
	SetSens => SET_SENS = 0x1001,
	GetSens => GET_SENS = 0x1002,
	SetEvmask => SET_EVMASK = 0x1003,
	GetEvmask => GET_EVMASK = 0x1004,

	DevName => DEV_NAME = 0x2000,
	DevPath => DEV_PATH = 0x2001,
	DevAxes => DEV_NAXES = 0x2002,
	DevButtons => DEV_NBUTTONS = 0x2003,
	DevUsbId => DEV_USBID = 0x2004,
	DevType => DEV_TYPE = 0x2005,

	SetCfgSens => SCFG_SENS = 0x3000,
	GetCfgSens => GCFG_SENS = 0x3001,
	SetCfgAxisSens => SCFG_SENS_AXIS = 0x3002,
	GetCfgAxisSens => GCFG_SENS_AXIS = 0x3003,
	SetCfgDeadzone => SCFG_DEADZONE = 0x3004,
	GetCfgDeadzone => GCFG_DEADZONE = 0x3005,
	SetCfgInvert => SCFG_INVERT = 0x3006,
	GetCfgInvert => GCFG_INVERT = 0x3007,
	SetCfgAxisMap => SCFG_AXISMAP = 0x3008,
	GetCfgAxisMap => GCFG_AXISMAP = 0x3009,
	SetCfgButtonMap => SCFG_BNMAP = 0x300a,
	GetCfgButtonMap => GCFG_BNMAP = 0x300b,
	SetCfgButtonAction => SCFG_BNACTION = 0x300c,
	GetCfgButtonAction => GCFG_BNACTION = 0x300d,
	SetCfgKeyMap => SCFG_KBMAP = 0x300e,
	GetCfgKeyMap => GCFG_KBMAP = 0x300f,
	SetCfgSwapYz => SCFG_SWAPYZ = 0x3010,
	GetCfgSwapYz => GCFG_SWAPYZ = 0x3011,
	SetCfgLed => SCFG_LED = 0x3012,
	GetCfgLed => GCFG_LED = 0x3013,
	SetCfgGrab => SCFG_GRAB = 0x3014,
	GetCfgGrab => GCFG_GRAB = 0x3015,
	SetCfgSerialDevice => SCFG_SERDEV = 0x3016,
	GetCfgSerialDevice => GCFG_SERDEV = 0x3017,

	CfgSave => CFG_SAVE = 0x3ffe,
	CfgRestore => CFG_RESTORE = 0x3fff,
	CfgReset => CFG_RESET = 0x4000,

	ChangeProto => CHANGE_PROTO = 0x5500,
}

impl RequestKind {
	/// Kind as sent on the wire, with the request tag set.
	pub const fn tagged(self) -> i32 {
		crate::REQ_TAG | self.code()
	}
}
