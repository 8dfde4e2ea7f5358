// Example stream backends: an in-memory buffer and a buffered file.
pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;
