// In-memory stream backend over a growable byte buffer.
use crate::core::stream::{SeekMode, StreamBackend, resolve_seek};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: Vec<u8>,
    position: u64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl StreamBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> isize {
        // The cursor may sit past the end; it only moves over bytes copied.
        if self.position >= self.data.len() as u64 {
            return 0;
        }
        let start = self.position as usize;
        let available = &self.data[start..];
        let moved = available.len().min(buf.len());
        buf[..moved].copy_from_slice(&available[..moved]);
        self.position = (start + moved) as u64;
        moved as isize
    }

    fn write(&mut self, buf: &[u8]) -> isize {
        let Ok(start) = usize::try_from(self.position) else {
            return -1;
        };
        let Some(end) = start.checked_add(buf.len()) else {
            return -1;
        };
        if self.data.len() < end {
            // Writing past the end zero-fills the gap, like a sparse file.
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buf);
        self.position = end as u64;
        buf.len() as isize
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> i64 {
        match resolve_seek(self.position, self.data.len() as u64, offset, mode) {
            Some(target) if target <= i64::MAX as u64 => {
                self.position = target;
                target as i64
            }
            _ => -1,
        }
    }

    fn flush(&mut self) -> i32 {
        0
    }
}
