// Recording line mock for host tests.
//
// Every toggle lands in a shared Trace. decode() replays the trace the
// way a receiving chip would: data is sampled on the active clock edge
// and outputs latch on the active load edge.

use std::cell::RefCell;
use std::rc::Rc;

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};

use super::{SipoLines, SipoMap, Transfer};
use crate::config::SipoConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Data,
    Clock,
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Set(Line, bool),
    Hold,
}

/// What the receiving chip observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    Bit(bool),
    Latch,
}

#[derive(Debug, Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<Event>>>);

impl Trace {
    pub fn push(&self, ev: Event) {
        self.0.borrow_mut().push(ev);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn levels(&self) -> Vec<(Line, bool)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|ev| match *ev {
                Event::Set(line, level) => Some((line, level)),
                Event::Hold => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Replays the trace against `cfg`. Panics on a clock pulse that was
    /// not preceded by a data assignment.
    pub fn decode(&self, cfg: &SipoConfig) -> Vec<Wire> {
        let clk_active = cfg.clock.active() == PinState::High;
        let ld_active = cfg.load.active() == PinState::High;

        let mut out = Vec::new();
        let mut data: Option<bool> = None;
        let mut data_fresh = false;
        let mut clk: Option<bool> = None;
        let mut ld: Option<bool> = None;

        for (line, level) in self.levels() {
            match line {
                Line::Data => {
                    data = Some(level);
                    data_fresh = true;
                }
                Line::Clock => {
                    if clk == Some(!clk_active) && level == clk_active {
                        assert!(data_fresh, "clock pulse without a data assignment");
                        out.push(Wire::Bit(data.unwrap()));
                        data_fresh = false;
                    }
                    clk = Some(level);
                }
                Line::Load => {
                    if ld == Some(!ld_active) && level == ld_active {
                        out.push(Wire::Latch);
                    }
                    ld = Some(level);
                }
            }
        }
        out
    }

    /// Bits sampled between latches, one entry per latch.
    pub fn latched_frames(&self, cfg: &SipoConfig) -> Vec<Vec<bool>> {
        let mut frames = Vec::new();
        let mut cur = Vec::new();
        for w in self.decode(cfg) {
            match w {
                Wire::Bit(b) => cur.push(b),
                Wire::Latch => frames.push(core::mem::take(&mut cur)),
            }
        }
        assert!(cur.is_empty(), "bits shifted but never latched");
        frames
    }
}

pub fn bits_of(wire: &[Wire]) -> Vec<u8> {
    wire.iter()
        .filter_map(|w| match w {
            Wire::Bit(b) => Some(*b as u8),
            Wire::Latch => None,
        })
        .collect()
}

/// Output pin that logs into a Trace.
pub struct LogPin {
    trace: Trace,
    line: Line,
}

impl LogPin {
    pub fn new(trace: &Trace, line: Line) -> Self {
        Self {
            trace: trace.clone(),
            line,
        }
    }
}

impl ErrorType for LogPin {
    type Error = Infallible;
}

impl OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.trace.push(Event::Set(self.line, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.trace.push(Event::Set(self.line, true));
        Ok(())
    }
}

/// Line map that logs directly, optionally failing after `fail_after`
/// toggles.
#[derive(Debug, Default)]
pub struct MockLines {
    pub trace: Trace,
    pub fail_after: Option<usize>,
    toggles: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stuck;

impl MockLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    fn set(&mut self, line: Line, level: PinState) -> Result<(), Stuck> {
        if self.fail_after.is_some_and(|n| self.toggles >= n) {
            return Err(Stuck);
        }
        self.toggles += 1;
        self.trace.push(Event::Set(line, level == PinState::High));
        Ok(())
    }
}

impl SipoLines for MockLines {
    type Error = Stuck;

    fn set_data(&mut self, level: PinState) -> Result<(), Stuck> {
        self.set(Line::Data, level)
    }

    fn set_clock(&mut self, level: PinState) -> Result<(), Stuck> {
        self.set(Line::Clock, level)
    }

    fn set_load(&mut self, level: PinState) -> Result<(), Stuck> {
        self.set(Line::Load, level)
    }

    fn hold(&mut self) {
        self.trace.push(Event::Hold);
    }
}

impl SipoMap for MockLines {
    type Error = Stuck;

    fn with_lines<T: Transfer<Stuck>>(&mut self, t: T) -> T::Output {
        t.run(self)
    }
}
