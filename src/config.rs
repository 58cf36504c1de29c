// Shift register signal configuration
//
// One canonical SipoConfig drives the bit-level protocol. It can be
// built from the packed Settings bit-mask or, with the `legacy-api`
// feature, from the older enumerated LegacySettings struct. Both
// collapse to the same SipoConfig before any line is touched.
//
// Settings bits:
//   bit 0  DATAORDER  1 = MSB first      0 = LSB first
//   bit 1  CLOCK_POL  1 = clock idles low 0 = clock idles high
//   bit 2  LOAD_LEV   1 = low-to-high    0 = high-to-low

use core::fmt;
use core::ops::BitOr;

use embedded_hal::digital::PinState;

/// Order in which the bits of a byte are shifted onto the data line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BitOrder {
    #[default]
    MsbFirst,
    LsbFirst,
}

impl BitOrder {
    /// Value of bit `n` (0 = first shifted) of `byte`.
    #[inline]
    pub const fn bit(self, byte: u8, n: u8) -> bool {
        match self {
            BitOrder::MsbFirst => byte & (0x80 >> n) != 0,
            BitOrder::LsbFirst => byte & (0x01 << n) != 0,
        }
    }
}

/// Idle level of the clock line. The sampling edge is the transition
/// away from the idle level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClockPolarity {
    /// Idle low, data sampled on the rising edge.
    #[default]
    StartLow,
    /// Idle high, data sampled on the falling edge.
    StartHigh,
}

impl ClockPolarity {
    pub const fn idle(self) -> PinState {
        match self {
            ClockPolarity::StartLow => PinState::Low,
            ClockPolarity::StartHigh => PinState::High,
        }
    }

    pub const fn active(self) -> PinState {
        match self {
            ClockPolarity::StartLow => PinState::High,
            ClockPolarity::StartHigh => PinState::Low,
        }
    }
}

/// Transition of the load line that commits shifted bits to the outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolarity {
    #[default]
    LowToHigh,
    HighToLow,
}

impl LoadPolarity {
    pub const fn idle(self) -> PinState {
        match self {
            LoadPolarity::LowToHigh => PinState::Low,
            LoadPolarity::HighToLow => PinState::High,
        }
    }

    pub const fn active(self) -> PinState {
        match self {
            LoadPolarity::LowToHigh => PinState::High,
            LoadPolarity::HighToLow => PinState::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Raw settings carry bits outside `Settings::MASK`.
    UnknownBits(u8),
    /// A legacy enum code other than 0 or 1.
    InvalidCode { field: &'static str, code: u8 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownBits(bits) => {
                write!(f, "unknown sipo settings bits {:#04x}", bits)
            }
            ConfigError::InvalidCode { field, code } => {
                write!(f, "invalid legacy {} code {}", field, code)
            }
        }
    }
}

/// Packed settings bit-mask.
///
/// ```
/// use sipo::config::{BitOrder, Settings, SipoConfig};
///
/// let s = Settings::DATAORDER_LSB | Settings::START_HIGH | Settings::LOW_TO_HIGH;
/// assert_eq!(SipoConfig::from(s).bit_order, BitOrder::LsbFirst);
/// assert!(Settings::from_bits(0x08).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings(u8);

impl Settings {
    pub const DATAORDER: Settings = Settings(1 << 0);
    pub const DATAORDER_MSB: Settings = Settings(1 << 0);
    pub const DATAORDER_LSB: Settings = Settings(0);

    pub const CLOCK_POL: Settings = Settings(1 << 1);
    pub const START_LOW: Settings = Settings(1 << 1);
    pub const START_HIGH: Settings = Settings(0);

    pub const LOAD_LEV: Settings = Settings(1 << 2);
    pub const LOW_TO_HIGH: Settings = Settings(1 << 2);
    pub const HIGH_TO_LOW: Settings = Settings(0);

    pub const MASK: u8 = 0b111;

    pub const fn from_bits(bits: u8) -> Result<Self, ConfigError> {
        if bits & !Self::MASK != 0 {
            return Err(ConfigError::UnknownBits(bits));
        }
        Ok(Settings(bits))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    const fn has(self, flag: Settings) -> bool {
        self.0 & flag.0 != 0
    }
}

impl Default for Settings {
    fn default() -> Self {
        SipoConfig::default().settings()
    }
}

impl BitOr for Settings {
    type Output = Settings;

    fn bitor(self, rhs: Settings) -> Settings {
        Settings(self.0 | rhs.0)
    }
}

/// Canonical, immutable configuration of one shift register chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SipoConfig {
    pub bit_order: BitOrder,
    pub clock: ClockPolarity,
    pub load: LoadPolarity,
}

impl SipoConfig {
    pub const fn new(bit_order: BitOrder, clock: ClockPolarity, load: LoadPolarity) -> Self {
        Self {
            bit_order,
            clock,
            load,
        }
    }

    pub fn from_bits(bits: u8) -> Result<Self, ConfigError> {
        Settings::from_bits(bits).map(Self::from)
    }

    /// Packs this configuration back into its bit-mask form.
    pub fn settings(&self) -> Settings {
        let order = match self.bit_order {
            BitOrder::MsbFirst => Settings::DATAORDER_MSB,
            BitOrder::LsbFirst => Settings::DATAORDER_LSB,
        };
        let clock = match self.clock {
            ClockPolarity::StartLow => Settings::START_LOW,
            ClockPolarity::StartHigh => Settings::START_HIGH,
        };
        let load = match self.load {
            LoadPolarity::LowToHigh => Settings::LOW_TO_HIGH,
            LoadPolarity::HighToLow => Settings::HIGH_TO_LOW,
        };
        order | clock | load
    }
}

impl From<Settings> for SipoConfig {
    fn from(s: Settings) -> Self {
        Self {
            bit_order: if s.has(Settings::DATAORDER) {
                BitOrder::MsbFirst
            } else {
                BitOrder::LsbFirst
            },
            clock: if s.has(Settings::CLOCK_POL) {
                ClockPolarity::StartLow
            } else {
                ClockPolarity::StartHigh
            },
            load: if s.has(Settings::LOAD_LEV) {
                LoadPolarity::LowToHigh
            } else {
                LoadPolarity::HighToLow
            },
        }
    }
}

// ── Legacy enumerated form ──────────────────────────────────────────

/// Older per-field configuration. Its numeric codes are inverted with
/// respect to `Settings`: 0 selects MSB first, clock idle low and a
/// low-to-high load, which is also the all-zero `Default`.
#[cfg(feature = "legacy-api")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacySettings {
    pub bit_order: BitOrder,
    pub clock_pol: ClockPolarity,
    pub load_pol: LoadPolarity,
}

#[cfg(feature = "legacy-api")]
impl LegacySettings {
    pub const DATAORDER_MSB: u8 = 0;
    pub const DATAORDER_LSB: u8 = 1;
    pub const START_LOW: u8 = 0;
    pub const START_HIGH: u8 = 1;
    pub const LOW_TO_HIGH: u8 = 0;
    pub const HIGH_TO_LOW: u8 = 1;

    pub fn from_codes(bit_order: u8, clock_pol: u8, load_pol: u8) -> Result<Self, ConfigError> {
        let bit_order = match bit_order {
            Self::DATAORDER_MSB => BitOrder::MsbFirst,
            Self::DATAORDER_LSB => BitOrder::LsbFirst,
            code => {
                return Err(ConfigError::InvalidCode {
                    field: "bit_order",
                    code,
                });
            }
        };
        let clock_pol = match clock_pol {
            Self::START_LOW => ClockPolarity::StartLow,
            Self::START_HIGH => ClockPolarity::StartHigh,
            code => {
                return Err(ConfigError::InvalidCode {
                    field: "clock_pol",
                    code,
                });
            }
        };
        let load_pol = match load_pol {
            Self::LOW_TO_HIGH => LoadPolarity::LowToHigh,
            Self::HIGH_TO_LOW => LoadPolarity::HighToLow,
            code => {
                return Err(ConfigError::InvalidCode {
                    field: "load_pol",
                    code,
                });
            }
        };
        Ok(Self {
            bit_order,
            clock_pol,
            load_pol,
        })
    }
}

#[cfg(feature = "legacy-api")]
impl From<LegacySettings> for SipoConfig {
    fn from(l: LegacySettings) -> Self {
        SipoConfig::new(l.bit_order, l.clock_pol, l.load_pol)
    }
}
