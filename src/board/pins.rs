// One shift register chain on three dedicated output pins.
//
// Typical 74HC595 wiring:
//   SI  -> SER   (pin 14)
//   CLK -> SRCLK (pin 11)
//   LD  -> RCLK  (pin 12)
//
// Optional hold delay between toggles for slow or long-wired chains;
// NoHold skips it entirely.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use super::{SipoLines, SipoMap, Transfer};

/// Zero-length delay used when the chain needs no hold time.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHold;

impl DelayNs for NoHold {
    #[inline]
    fn delay_ns(&mut self, _ns: u32) {}
}

pub struct SipoPins<SI, CLK, LD, D = NoHold> {
    si: SI,
    clk: CLK,
    ld: LD,
    delay: D,
    hold_ns: u32,
}

impl<SI, CLK, LD, E> SipoPins<SI, CLK, LD, NoHold>
where
    SI: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    LD: OutputPin<Error = E>,
{
    // Pins are taken as-is; nothing is driven until the first transfer.
    pub fn new(si: SI, clk: CLK, ld: LD) -> Self {
        Self {
            si,
            clk,
            ld,
            delay: NoHold,
            hold_ns: 0,
        }
    }
}

impl<SI, CLK, LD, D, E> SipoPins<SI, CLK, LD, D>
where
    SI: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    LD: OutputPin<Error = E>,
    D: DelayNs,
{
    /// Waits `hold_ns` after every line toggle.
    pub fn with_hold_ns<D2: DelayNs>(self, delay: D2, hold_ns: u32) -> SipoPins<SI, CLK, LD, D2> {
        SipoPins {
            si: self.si,
            clk: self.clk,
            ld: self.ld,
            delay,
            hold_ns,
        }
    }

    pub fn hold_ns(&self) -> u32 {
        self.hold_ns
    }

    pub fn release(self) -> (SI, CLK, LD, D) {
        (self.si, self.clk, self.ld, self.delay)
    }
}

impl<SI, CLK, LD, D, E> SipoLines for SipoPins<SI, CLK, LD, D>
where
    SI: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    LD: OutputPin<Error = E>,
    D: DelayNs,
    E: core::fmt::Debug,
{
    type Error = E;

    #[inline]
    fn set_data(&mut self, level: PinState) -> Result<(), E> {
        self.si.set_state(level)
    }

    #[inline]
    fn set_clock(&mut self, level: PinState) -> Result<(), E> {
        self.clk.set_state(level)
    }

    #[inline]
    fn set_load(&mut self, level: PinState) -> Result<(), E> {
        self.ld.set_state(level)
    }

    #[inline]
    fn hold(&mut self) {
        if self.hold_ns > 0 {
            self.delay.delay_ns(self.hold_ns);
        }
    }
}

impl<SI, CLK, LD, D, E> SipoMap for SipoPins<SI, CLK, LD, D>
where
    SI: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    LD: OutputPin<Error = E>,
    D: DelayNs,
    E: core::fmt::Debug,
{
    type Error = E;

    fn with_lines<T: Transfer<E>>(&mut self, t: T) -> T::Output {
        t.run(self)
    }
}
