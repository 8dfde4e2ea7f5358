// File stream backend with a small write-behind buffer, drained before any
// read or seek so the file never lags the cursor's view of it.
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::core::error::{Error, ErrorKind};
use crate::core::stream::{SeekMode, StreamBackend};

const WRITE_BUFFER_LIMIT: usize = 8 * 1024;

pub struct FileBackend {
    file: File,
    pending: Vec<u8>,
}

impl FileBackend {
    /// Create or truncate, read-write.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message(format!("create {}", path.display()))
                    .with_source(err)
            })?;
        Ok(Self {
            file,
            pending: Vec::new(),
        })
    }

    /// Open an existing file, read-write, cursor at the start.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message(format!("open {}", path.display()))
                    .with_source(err)
            })?;
        Ok(Self {
            file,
            pending: Vec::new(),
        })
    }

    fn drain(&mut self) -> io::Result<()> {
        drain_into(&mut self.file, &mut self.pending)
    }
}

// Delivered bytes leave `pending` at once; after a failure only the
// undelivered tail remains for the next attempt.
fn drain_into(writer: &mut impl Write, pending: &mut Vec<u8>) -> io::Result<()> {
    while !pending.is_empty() {
        match writer.write(pending.as_slice()) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "file refused buffered bytes",
                ));
            }
            Ok(delivered) => {
                pending.drain(..delivered);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

impl StreamBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> isize {
        if self.drain().is_err() {
            return -1;
        }
        match self.file.read(buf) {
            Ok(moved) => moved as isize,
            Err(_) => -1,
        }
    }

    fn write(&mut self, buf: &[u8]) -> isize {
        self.pending.extend_from_slice(buf);
        if self.pending.len() >= WRITE_BUFFER_LIMIT && self.drain().is_err() {
            return -1;
        }
        buf.len() as isize
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> i64 {
        if self.drain().is_err() {
            return -1;
        }
        let target = match mode {
            SeekMode::Start => {
                let Ok(offset) = u64::try_from(offset) else {
                    return -1;
                };
                SeekFrom::Start(offset)
            }
            SeekMode::Current => SeekFrom::Current(offset),
            SeekMode::End => SeekFrom::End(offset),
        };
        match self.file.seek(target) {
            Ok(position) if position <= i64::MAX as u64 => position as i64,
            _ => -1,
        }
    }

    fn flush(&mut self) -> i32 {
        if self.drain().is_err() {
            return -1;
        }
        match self.file.flush() {
            Ok(()) => 0,
            Err(_) => -1,
        }
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        // Same posture as fclose: push buffered bytes out, ignore failure.
        let _ = self.drain();
    }
}
