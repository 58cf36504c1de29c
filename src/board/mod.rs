//! Line-level hardware seams for shift register chains.
//!
//! The driver never addresses GPIOs itself. It asks a [`SipoMap`] (the
//! device reference) for exclusive access to one chain's [`SipoLines`]
//! for the duration of a transfer, and toggles those.
//!
//! Provided maps:
//! - [`SipoPins`]: one chain wired to three `embedded-hal` output pins.
//! - [`ChainRef`]: one chain of a [`SharedBank`], several chains behind
//!   a single controller.

pub mod bank;
pub mod pins;

#[cfg(test)]
pub(crate) mod mock;

pub use bank::{ChainRef, SharedBank, SipoBank};
pub use pins::{NoHold, SipoPins};

use embedded_hal::digital::PinState;

/// The three control lines of one shift register chain.
pub trait SipoLines {
    type Error: core::fmt::Debug;

    /// Serial data in (SI / SER / DS).
    fn set_data(&mut self, level: PinState) -> Result<(), Self::Error>;

    /// Shift clock (SCK / SRCLK / SH_CP).
    fn set_clock(&mut self, level: PinState) -> Result<(), Self::Error>;

    /// Load / latch (LD / RCLK / ST_CP).
    fn set_load(&mut self, level: PinState) -> Result<(), Self::Error>;

    /// Keep the current levels stable long enough for the chip to see them.
    fn hold(&mut self) {}
}

/// Work run against one chain's lines while a map grants exclusive access.
/// `run` is generic over the line type, so the bit loop is monomorphized
/// for each map instead of going through a vtable.
pub trait Transfer<E> {
    type Output;

    fn run<L: SipoLines<Error = E>>(self, lines: &mut L) -> Self::Output;
}

/// Maps a device reference to the lines of the chain it names.
pub trait SipoMap {
    type Error: core::fmt::Debug;

    /// Runs `t` with exclusive access to the chain's lines. A whole
    /// transfer happens inside one call so shared lines never carry
    /// another chain's bits mid-byte.
    fn with_lines<T: Transfer<Self::Error>>(&mut self, t: T) -> T::Output;
}

impl<M: SipoMap> SipoMap for &mut M {
    type Error = M::Error;

    fn with_lines<T: Transfer<M::Error>>(&mut self, t: T) -> T::Output {
        (**self).with_lines(t)
    }
}
