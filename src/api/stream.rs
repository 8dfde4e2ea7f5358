//! Purpose: Stream handle operations over the registry.
//! Exports: `StreamApiExt`.
//! Role: Binds a backend into the registry and drives it through validated handles.
//! Invariants: Releasing a stream drops the binding; backend cleanup is the backend's `Drop`.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind};
use crate::core::registry::{Handle, Kind, Registry, Resource};
use crate::core::stream::{SeekMode, Stream, StreamBackend};

use super::ApiResult;

pub trait StreamApiExt {
    fn stream_open(&self, backend: Box<dyn StreamBackend>) -> ApiResult<Handle>;
    fn stream_read(&self, handle: Handle, buf: &mut [u8]) -> ApiResult<usize>;
    fn stream_write(&self, handle: Handle, buf: &[u8]) -> ApiResult<usize>;
    fn stream_seek(&self, handle: Handle, offset: i64, mode: SeekMode) -> ApiResult<u64>;
    fn stream_flush(&self, handle: Handle) -> ApiResult<()>;
}

impl StreamApiExt for Registry {
    fn stream_open(&self, backend: Box<dyn StreamBackend>) -> ApiResult<Handle> {
        self.register(Resource::Stream(Stream::new(backend)))
    }

    fn stream_read(&self, handle: Handle, buf: &mut [u8]) -> ApiResult<usize> {
        with_stream(self, handle, |stream| stream.read(buf))
    }

    fn stream_write(&self, handle: Handle, buf: &[u8]) -> ApiResult<usize> {
        with_stream(self, handle, |stream| stream.write(buf))
    }

    fn stream_seek(&self, handle: Handle, offset: i64, mode: SeekMode) -> ApiResult<u64> {
        with_stream(self, handle, |stream| stream.seek(offset, mode))
    }

    fn stream_flush(&self, handle: Handle) -> ApiResult<()> {
        with_stream(self, handle, |stream| stream.flush())
    }
}

fn with_stream<T>(
    registry: &Registry,
    handle: Handle,
    f: impl FnOnce(&mut Stream) -> ApiResult<T>,
) -> ApiResult<T> {
    registry.with_resource(handle, Kind::Stream, |resource| match resource {
        Resource::Stream(stream) => f(stream),
        _ => Err(Error::new(ErrorKind::Internal)
            .with_message("kind tag out of sync")
            .with_handle(handle.as_raw())),
    })
}
