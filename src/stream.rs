// Generic byte stream handle.
//
// A closed set of stream kinds, each with a four-character type tag.
// Callers that only need a byte sink use the embedded-io traits on
// Stream; callers that need driver fields downcast through as_sipo*()
// and get a KindMismatch instead of a misinterpreted handle.

use core::fmt;

use embedded_io::{ErrorType, Read, Seek, SeekFrom, Write};

use crate::board::SipoMap;
use crate::drivers::sipo::{Error, Sipo};

const fn make_id(tag: [u8; 4]) -> u32 {
    u32::from_be_bytes(tag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Sipo,
    Null,
}

impl StreamKind {
    pub const SIPO_ID: u32 = make_id(*b"SIPO");
    pub const NULL_ID: u32 = make_id(*b"NULL");

    /// Runtime type tag.
    pub const fn id(self) -> u32 {
        match self {
            StreamKind::Sipo => Self::SIPO_ID,
            StreamKind::Null => Self::NULL_ID,
        }
    }

    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            Self::SIPO_ID => Some(StreamKind::Sipo),
            Self::NULL_ID => Some(StreamKind::Null),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            StreamKind::Sipo => "SIPO",
            StreamKind::Null => "NULL",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stream was downcast to the wrong kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMismatch {
    pub expected: StreamKind,
    pub found: StreamKind,
}

impl fmt::Display for KindMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} stream, found {}", self.expected, self.found)
    }
}

impl core::error::Error for KindMismatch {}

#[derive(Debug)]
pub enum Stream<M> {
    /// Shift register chain, write-only.
    Sipo(Sipo<M>),
    /// Discards writes, reads as end of stream.
    Null,
}

impl<M: SipoMap> Stream<M> {
    pub fn kind(&self) -> StreamKind {
        match self {
            Stream::Sipo(_) => StreamKind::Sipo,
            Stream::Null => StreamKind::Null,
        }
    }

    fn mismatch(&self, expected: StreamKind) -> KindMismatch {
        KindMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_sipo(&self) -> Result<&Sipo<M>, KindMismatch> {
        match self {
            Stream::Sipo(s) => Ok(s),
            other => Err(other.mismatch(StreamKind::Sipo)),
        }
    }

    pub fn as_sipo_mut(&mut self) -> Result<&mut Sipo<M>, KindMismatch> {
        match self {
            Stream::Sipo(s) => Ok(s),
            other => Err(other.mismatch(StreamKind::Sipo)),
        }
    }

    pub fn into_sipo(self) -> Result<Sipo<M>, KindMismatch> {
        match self {
            Stream::Sipo(s) => Ok(s),
            other => Err(other.mismatch(StreamKind::Sipo)),
        }
    }

    /// Flushes and tears the stream down, returning the device reference
    /// of a shift register stream.
    pub fn close(self) -> Result<Option<M>, Error<M::Error>> {
        match self {
            Stream::Sipo(s) => s.close().map(Some),
            Stream::Null => Ok(None),
        }
    }
}

impl<M: SipoMap> From<Sipo<M>> for Stream<M> {
    fn from(s: Sipo<M>) -> Self {
        Stream::Sipo(s)
    }
}

impl<M: SipoMap> ErrorType for Stream<M> {
    type Error = Error<M::Error>;
}

impl<M: SipoMap> Write for Stream<M> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        match self {
            Stream::Sipo(s) => s.write(buf),
            Stream::Null => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        match self {
            Stream::Sipo(s) => s.flush(),
            Stream::Null => Ok(()),
        }
    }
}

impl<M: SipoMap> Read for Stream<M> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self {
            Stream::Sipo(s) => s.read(buf),
            Stream::Null => Ok(0),
        }
    }
}

impl<M: SipoMap> Seek for Stream<M> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        match self {
            Stream::Sipo(s) => s.seek(pos),
            Stream::Null => Ok(0),
        }
    }
}

impl<M: SipoMap> embedded_io_async::Write for Stream<M> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        match self {
            Stream::Sipo(s) => embedded_io_async::Write::write(s, buf).await,
            Stream::Null => Ok(buf.len()),
        }
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::mock::MockLines;
    use crate::config::SipoConfig;
    use crate::drivers::sipo::Op;
    use embedded_io::{Error as _, ErrorKind};

    fn sipo_stream() -> Stream<MockLines> {
        Stream::from(Sipo::new(MockLines::new()))
    }

    #[test]
    fn tags_are_four_char_ids() {
        assert_eq!(StreamKind::Sipo.id(), 0x5349_504F);
        assert_eq!(StreamKind::from_id(StreamKind::Null.id()), Some(StreamKind::Null));
        assert_eq!(StreamKind::from_id(0), None);
    }

    #[test]
    fn stream_writes_reach_the_chain() {
        let mut stream = sipo_stream();
        assert_eq!(stream.kind(), StreamKind::Sipo);
        stream.write_all(&[0x12, 0x34]).unwrap();

        let map = stream.close().unwrap().unwrap();
        assert_eq!(map.trace.latched_frames(&SipoConfig::default()).len(), 2);
    }

    #[test]
    fn sipo_stream_refuses_read_and_seek() {
        let mut stream = sipo_stream();
        let mut buf = [0u8; 2];
        let err = stream.read(&mut buf).unwrap_err();
        assert_eq!(err, Error::Unsupported(Op::Read));
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(stream.seek(SeekFrom::End(0)).is_err());

        let map = stream.into_sipo().unwrap().release();
        assert!(map.trace.is_empty());
    }

    #[test]
    fn null_stream_swallows_everything() {
        let mut stream: Stream<MockLines> = Stream::Null;
        assert_eq!(stream.write(&[1, 2, 3]).unwrap(), 3);
        assert_eq!(stream.read(&mut [0u8; 3]).unwrap(), 0);
        assert_eq!(stream.seek(SeekFrom::Current(5)).unwrap(), 0);
        assert!(stream.close().unwrap().is_none());
    }

    #[test]
    fn downcast_checks_the_kind() {
        let mut stream = sipo_stream();
        assert!(stream.as_sipo().is_ok());
        assert!(Sipo::try_cast(&mut stream).is_ok());
        Sipo::cast(&mut stream).put_byte(0xFF).unwrap();

        let mut null: Stream<MockLines> = Stream::Null;
        let err = Sipo::try_cast(&mut null).unwrap_err();
        assert_eq!(
            err,
            KindMismatch {
                expected: StreamKind::Sipo,
                found: StreamKind::Null
            }
        );
        assert_eq!(err.to_string(), "expected SIPO stream, found NULL");
        assert!(null.into_sipo().is_err());
    }

    #[test]
    #[should_panic(expected = "expected SIPO stream, found NULL")]
    fn cast_of_foreign_stream_panics() {
        let mut null: Stream<MockLines> = Stream::Null;
        Sipo::cast(&mut null);
    }

    #[test]
    fn async_stream_write() {
        let mut stream = sipo_stream();
        let n = embassy_futures::block_on(embedded_io_async::Write::write(&mut stream, &[0x01]))
            .unwrap();
        assert_eq!(n, 1);
    }
}
