// Backend-agnostic byte cursor; backends speak a four-call sentinel contract.
use std::io;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeekMode {
    Start,
    Current,
    End,
}

impl SeekMode {
    /// C encoding: 0 = Start, 1 = Current, 2 = End.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(SeekMode::Start),
            1 => Some(SeekMode::Current),
            2 => Some(SeekMode::End),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            SeekMode::Start => 0,
            SeekMode::Current => 1,
            SeekMode::End => 2,
        }
    }
}

/// The whole backend contract. Read and write report bytes moved, 0 from
/// read meaning end of data; seek reports the new absolute position; every
/// call reports failure as -1 rather than panicking or blocking forever.
/// Position state lives inside the backend, never in the stream.
pub trait StreamBackend: Send {
    fn read(&mut self, buf: &mut [u8]) -> isize;
    fn write(&mut self, buf: &[u8]) -> isize;
    fn seek(&mut self, offset: i64, mode: SeekMode) -> i64;
    fn flush(&mut self) -> i32;
}

/// One cursor over one backend, bound at construction. The stream owns the
/// binding only; whatever the backend's own `Drop` does is the extent of
/// cleanup on release.
pub struct Stream {
    backend: Box<dyn StreamBackend>,
}

impl Stream {
    pub fn new(backend: Box<dyn StreamBackend>) -> Self {
        Self { backend }
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let moved = self.backend.read(buf);
        if moved < 0 {
            tracing::debug!(requested = buf.len(), "backend read signaled failure");
            return Err(Error::new(ErrorKind::Io).with_message("backend read failed"));
        }
        Ok(moved as usize)
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let moved = self.backend.write(buf);
        if moved < 0 {
            tracing::debug!(requested = buf.len(), "backend write signaled failure");
            return Err(Error::new(ErrorKind::Io).with_message("backend write failed"));
        }
        Ok(moved as usize)
    }

    /// Negative results never come back as positions: a backend's -1 means
    /// the target does not exist, surfaced as `OutOfRange`.
    pub fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64, Error> {
        let position = self.backend.seek(offset, mode);
        if position < 0 {
            return Err(Error::new(ErrorKind::OutOfRange)
                .with_message(format!("seek {offset} from {mode:?} is out of range")));
        }
        Ok(position as u64)
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        if self.backend.flush() < 0 {
            return Err(Error::new(ErrorKind::Io).with_message("backend flush failed"));
        }
        Ok(())
    }
}

// Adapters so a bound backend composes with ordinary Rust I/O.
impl io::Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Stream::read(self, buf).map_err(io::Error::other)
    }
}

impl io::Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Stream::write(self, buf).map_err(io::Error::other)
    }

    fn flush(&mut self) -> io::Result<()> {
        Stream::flush(self).map_err(io::Error::other)
    }
}

impl io::Seek for Stream {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, mode) = match pos {
            io::SeekFrom::Start(offset) => (
                i64::try_from(offset).map_err(|_| io::Error::other("seek offset overflow"))?,
                SeekMode::Start,
            ),
            io::SeekFrom::Current(offset) => (offset, SeekMode::Current),
            io::SeekFrom::End(offset) => (offset, SeekMode::End),
        };
        Stream::seek(self, offset, mode).map_err(io::Error::other)
    }
}

/// Position arithmetic shared by backends: resolve an offset against the
/// mode's reference point, refusing targets outside `0..=u64::MAX`.
pub fn resolve_seek(position: u64, len: u64, offset: i64, mode: SeekMode) -> Option<u64> {
    let base = match mode {
        SeekMode::Start => 0i128,
        SeekMode::Current => i128::from(position),
        SeekMode::End => i128::from(len),
    };
    let target = base + i128::from(offset);
    if target < 0 || target > i128::from(u64::MAX) {
        return None;
    }
    Some(target as u64)
}

#[cfg(test)]
mod tests {
    use super::{SeekMode, Stream, StreamBackend, resolve_seek};
    use crate::core::error::ErrorKind;

    // Backend that fails every call, for sentinel translation checks.
    struct Bust;

    impl StreamBackend for Bust {
        fn read(&mut self, _buf: &mut [u8]) -> isize {
            -1
        }
        fn write(&mut self, _buf: &[u8]) -> isize {
            -1
        }
        fn seek(&mut self, _offset: i64, _mode: SeekMode) -> i64 {
            -1
        }
        fn flush(&mut self) -> i32 {
            -1
        }
    }

    struct Empty;

    impl StreamBackend for Empty {
        fn read(&mut self, _buf: &mut [u8]) -> isize {
            0
        }
        fn write(&mut self, buf: &[u8]) -> isize {
            buf.len() as isize
        }
        fn seek(&mut self, _offset: i64, _mode: SeekMode) -> i64 {
            0
        }
        fn flush(&mut self) -> i32 {
            0
        }
    }

    #[test]
    fn sentinels_translate_to_error_kinds() {
        let mut stream = Stream::new(Box::new(Bust));
        let mut buf = [0u8; 4];

        assert_eq!(stream.read(&mut buf).expect_err("read").kind(), ErrorKind::Io);
        assert_eq!(stream.write(b"ab").expect_err("write").kind(), ErrorKind::Io);
        assert_eq!(
            stream.seek(0, SeekMode::Start).expect_err("seek").kind(),
            ErrorKind::OutOfRange
        );
        assert_eq!(stream.flush().expect_err("flush").kind(), ErrorKind::Io);
    }

    #[test]
    fn zero_read_is_end_of_data_not_failure() {
        let mut stream = Stream::new(Box::new(Empty));
        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).expect("read"), 0);
    }

    #[test]
    fn short_writes_are_reported_as_is() {
        struct Half;
        impl StreamBackend for Half {
            fn read(&mut self, _buf: &mut [u8]) -> isize {
                0
            }
            fn write(&mut self, buf: &[u8]) -> isize {
                (buf.len() / 2) as isize
            }
            fn seek(&mut self, _offset: i64, _mode: SeekMode) -> i64 {
                0
            }
            fn flush(&mut self) -> i32 {
                0
            }
        }

        let mut stream = Stream::new(Box::new(Half));
        assert_eq!(stream.write(b"abcdef").expect("write"), 3);
    }

    #[test]
    fn seek_mode_raw_round_trips() {
        for mode in [SeekMode::Start, SeekMode::Current, SeekMode::End] {
            assert_eq!(SeekMode::from_raw(mode.as_raw()), Some(mode));
        }
        assert_eq!(SeekMode::from_raw(3), None);
        assert_eq!(SeekMode::from_raw(-1), None);
    }

    #[test]
    fn resolve_seek_handles_every_reference_point() {
        assert_eq!(resolve_seek(5, 10, 0, SeekMode::Start), Some(0));
        assert_eq!(resolve_seek(5, 10, 7, SeekMode::Start), Some(7));
        assert_eq!(resolve_seek(5, 10, -2, SeekMode::Current), Some(3));
        assert_eq!(resolve_seek(5, 10, 2, SeekMode::Current), Some(7));
        assert_eq!(resolve_seek(5, 10, 0, SeekMode::End), Some(10));
        assert_eq!(resolve_seek(5, 10, -10, SeekMode::End), Some(0));

        // Negative absolute positions are refused, not clamped.
        assert_eq!(resolve_seek(5, 10, -6, SeekMode::Current), None);
        assert_eq!(resolve_seek(5, 10, -11, SeekMode::End), None);
        assert_eq!(resolve_seek(5, 10, -1, SeekMode::Start), None);

        // Past the end is allowed; past u64 is not.
        assert_eq!(resolve_seek(5, 10, 100, SeekMode::End), Some(110));
        assert_eq!(resolve_seek(u64::MAX, 0, 1, SeekMode::Current), None);
    }

    #[test]
    fn io_trait_adapters_delegate() {
        use std::io::{Read, Seek, SeekFrom, Write};

        let mut stream = Stream::new(Box::new(Empty));
        let mut buf = [0u8; 2];
        assert_eq!(Read::read(&mut stream, &mut buf).expect("read"), 0);
        assert_eq!(Write::write(&mut stream, b"ab").expect("write"), 2);
        Write::flush(&mut stream).expect("flush");
        assert_eq!(Seek::seek(&mut stream, SeekFrom::Start(0)).expect("seek"), 0);

        let mut failing = Stream::new(Box::new(Bust));
        assert!(Read::read(&mut failing, &mut buf).is_err());
    }
}
