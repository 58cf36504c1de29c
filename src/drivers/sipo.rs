// Serial-in / parallel-out shift register driver (74HC595, 4094, ...)
//
// Per byte: 8x (data, clock to active, clock to idle) in the configured
// bit order, then one load pulse. The load line only moves after the
// 8th clock, so a chain never latches a partial byte. Lines are driven
// to their idle levels at the start of each transfer, never at init.
//
// Write-only: read and seek report ErrorKind::Unsupported without
// touching a line. Nothing is buffered, flush is a no-op.

use core::fmt;

use embedded_hal::digital::PinState;
use embedded_io::{ErrorKind, ErrorType, Read, Seek, SeekFrom, Write};
use log::{debug, trace, warn};

use crate::board::{SipoLines, SipoMap, Transfer};
#[cfg(feature = "legacy-api")]
use crate::config::LegacySettings;
use crate::config::{ConfigError, Settings, SipoConfig};
use crate::stream::{KindMismatch, Stream};

/// Stream operations a shift register cannot perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read,
    Seek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// The line implementation reported a failure.
    Line(E),
    /// The chain is write-only.
    Unsupported(Op),
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Line(e) => write!(f, "sipo line error: {:?}", e),
            Error::Unsupported(Op::Read) => write!(f, "sipo is write-only, read unsupported"),
            Error::Unsupported(Op::Seek) => write!(f, "sipo is write-only, seek unsupported"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}

impl<E: fmt::Debug> embedded_io::Error for Error<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Line(_) => ErrorKind::Other,
            Error::Unsupported(_) => ErrorKind::Unsupported,
        }
    }
}

// Load pulse placement within one transfer.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Latch {
    EachByte,
    EndOfFrame,
}

/// Driver context for one shift register chain.
#[derive(Debug)]
pub struct Sipo<M> {
    map: M,
    config: SipoConfig,
}

impl<M: SipoMap> Sipo<M> {
    /// Default configuration: MSB first, clock idle low, load low-to-high.
    pub fn new(map: M) -> Self {
        Self::with_config(map, SipoConfig::default())
    }

    pub fn with_settings(map: M, settings: Settings) -> Self {
        Self::with_config(map, SipoConfig::from(settings))
    }

    /// Like `with_settings`, from an unchecked bit-mask.
    pub fn from_bits(map: M, bits: u8) -> Result<Self, ConfigError> {
        Ok(Self::with_settings(map, Settings::from_bits(bits)?))
    }

    #[cfg(feature = "legacy-api")]
    pub fn from_legacy(map: M, legacy: LegacySettings) -> Self {
        Self::with_config(map, SipoConfig::from(legacy))
    }

    pub fn with_config(map: M, config: SipoConfig) -> Self {
        debug!(
            "sipo: init {:?}, clock {:?}, load {:?} (settings {:#04x})",
            config.bit_order,
            config.clock,
            config.load,
            config.settings().bits()
        );
        Self { map, config }
    }

    pub fn config(&self) -> SipoConfig {
        self.config
    }

    /// Shifts one byte and latches it onto the parallel outputs.
    pub fn put_byte(&mut self, byte: u8) -> Result<(), Error<M::Error>> {
        self.transfer(&[byte], Latch::EachByte).map(|_| ())
    }

    /// Shifts and latches each byte in turn, one load pulse per byte.
    ///
    /// A line error after `k > 0` bytes reached the outputs returns
    /// `Ok(k)`, so a retry resumes at the first byte not yet latched.
    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<usize, Error<M::Error>> {
        self.transfer(buf, Latch::EachByte)
    }

    /// Shifts the whole buffer, then latches once. For a daisy chain of
    /// N chips pass N bytes; `buf[0]` ends up in the chip furthest from
    /// the controller. An empty frame touches no line. A line error
    /// before the load pulse latches nothing and is returned as is.
    pub fn write_frame(&mut self, buf: &[u8]) -> Result<usize, Error<M::Error>> {
        self.transfer(buf, Latch::EndOfFrame)
    }

    /// Hands the device reference back.
    pub fn release(self) -> M {
        self.map
    }

    pub fn close(mut self) -> Result<M, Error<M::Error>> {
        self.flush()?;
        Ok(self.map)
    }

    /// Driver view of a generic stream. A stream of another kind is a
    /// programming error and panics.
    pub fn cast(stream: &mut Stream<M>) -> &mut Sipo<M> {
        match stream.as_sipo_mut() {
            Ok(sipo) => sipo,
            Err(e) => panic!("sipo: {}", e),
        }
    }

    pub fn try_cast(stream: &mut Stream<M>) -> Result<&mut Sipo<M>, KindMismatch> {
        stream.as_sipo_mut().inspect_err(|e| warn!("sipo: {}", e))
    }

    fn transfer(&mut self, buf: &[u8], latch: Latch) -> Result<usize, Error<M::Error>> {
        if buf.is_empty() {
            return Ok(0);
        }
        trace!("sipo: shifting {} byte(s)", buf.len());

        let shift = Shift {
            buf,
            cfg: self.config,
            latch,
        };
        match self.map.with_lines(shift) {
            Ok(n) => Ok(n),
            Err((0, e)) => Err(Error::Line(e)),
            Err((n, e)) => {
                warn!("sipo: line error after {} of {} byte(s) latched: {:?}", n, buf.len(), e);
                Ok(n)
            }
        }
    }
}

// One transfer. On failure, carries the number of bytes already latched.
struct Shift<'a> {
    buf: &'a [u8],
    cfg: SipoConfig,
    latch: Latch,
}

impl<E> Transfer<E> for Shift<'_> {
    type Output = Result<usize, (usize, E)>;

    fn run<L: SipoLines<Error = E>>(self, lines: &mut L) -> Self::Output {
        let mut latched = 0;
        match shift_out(lines, &self.cfg, self.buf, self.latch, &mut latched) {
            Ok(()) => Ok(latched),
            Err(e) => Err((latched, e)),
        }
    }
}

// ── Bit-level protocol ──────────────────────────────────────────────

fn shift_out<L: SipoLines>(
    lines: &mut L,
    cfg: &SipoConfig,
    buf: &[u8],
    latch: Latch,
    latched: &mut usize,
) -> Result<(), L::Error> {
    idle(lines, cfg)?;
    for &byte in buf {
        shift_byte(lines, cfg, byte)?;
        if latch == Latch::EachByte {
            pulse_load(lines, cfg, latched, 1)?;
        }
    }
    if latch == Latch::EndOfFrame {
        pulse_load(lines, cfg, latched, buf.len())?;
    }
    Ok(())
}

fn idle<L: SipoLines>(lines: &mut L, cfg: &SipoConfig) -> Result<(), L::Error> {
    lines.set_clock(cfg.clock.idle())?;
    lines.hold();
    lines.set_load(cfg.load.idle())?;
    lines.hold();
    Ok(())
}

fn shift_byte<L: SipoLines>(lines: &mut L, cfg: &SipoConfig, byte: u8) -> Result<(), L::Error> {
    for n in 0..8 {
        lines.set_data(PinState::from(cfg.bit_order.bit(byte, n)))?;
        lines.hold();
        lines.set_clock(cfg.clock.active())?;
        lines.hold();
        lines.set_clock(cfg.clock.idle())?;
        lines.hold();
    }
    Ok(())
}

// The outputs take the shifted bits on the active edge, so `bytes` count
// as latched once that edge is out.
fn pulse_load<L: SipoLines>(
    lines: &mut L,
    cfg: &SipoConfig,
    latched: &mut usize,
    bytes: usize,
) -> Result<(), L::Error> {
    lines.set_load(cfg.load.active())?;
    *latched += bytes;
    lines.hold();
    lines.set_load(cfg.load.idle())?;
    lines.hold();
    Ok(())
}

// ── Stream traits ───────────────────────────────────────────────────

impl<M: SipoMap> ErrorType for Sipo<M> {
    type Error = Error<M::Error>;
}

impl<M: SipoMap> Write for Sipo<M> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.write_bytes(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<M: SipoMap> Read for Sipo<M> {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        Err(Error::Unsupported(Op::Read))
    }
}

impl<M: SipoMap> Seek for Sipo<M> {
    fn seek(&mut self, _pos: SeekFrom) -> Result<u64, Self::Error> {
        Err(Error::Unsupported(Op::Seek))
    }
}

// Runs synchronously: no suspension point inside a transfer.
impl<M: SipoMap> embedded_io_async::Write for Sipo<M> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.write_bytes(buf)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
