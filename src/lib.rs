// Driver for serial-in / parallel-out shift register chains
// (74HC595, CD4094 and friends) over three GPIO lines.

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod config;
pub mod drivers;
pub mod stream;

pub use board::{SipoLines, SipoMap, SipoPins, Transfer};
pub use config::{BitOrder, ClockPolarity, ConfigError, LoadPolarity, Settings, SipoConfig};
#[cfg(feature = "legacy-api")]
pub use config::LegacySettings;
pub use drivers::sipo::{Error, Op, Sipo};
pub use stream::{KindMismatch, Stream, StreamKind};
