//! Purpose: Define the stable public Rust API boundary for Ferrule.
//! Exports: Registry and handle types plus text, uuid, and stream operations.
//! Role: Public, additive-only surface; the C ABI is a 1:1 projection of it.
//! Invariants: Every handle operation validates through the registry before acting.
//! Invariants: Failures are plain `Result` values; only `abi` writes the C error channel.

mod stream;
mod text;
mod uuid;

pub use crate::core::error::{Error, ErrorKind, to_error_code};
pub use crate::core::registry::{Handle, Kind, Registry};
pub use crate::core::stream::{SeekMode, Stream, StreamBackend};
pub use stream::StreamApiExt;
pub use text::TextApiExt;
pub use uuid::UuidApiExt;

pub type ApiResult<T> = Result<T, Error>;
