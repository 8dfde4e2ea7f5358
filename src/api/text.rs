//! Purpose: Text handle operations over the registry.
//! Exports: `TextApiExt`.
//! Role: Stable mutable-string surface mirrored by the C projection.
//! Invariants: `text_get` returns an independent copy, never a view of the payload.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind};
use crate::core::registry::{Handle, Kind, Registry, Resource};
use crate::core::text::Text;

use super::ApiResult;

pub trait TextApiExt {
    fn text_create(&self, value: &str) -> ApiResult<Handle>;
    fn text_get(&self, handle: Handle) -> ApiResult<String>;
    fn text_set(&self, handle: Handle, value: &str) -> ApiResult<()>;
    fn text_append(&self, handle: Handle, suffix: &str) -> ApiResult<()>;
    /// Byte length of the payload.
    fn text_len(&self, handle: Handle) -> ApiResult<usize>;
    fn text_make_uppercase(&self, handle: Handle) -> ApiResult<()>;
}

impl TextApiExt for Registry {
    fn text_create(&self, value: &str) -> ApiResult<Handle> {
        self.register(Resource::Text(Text::new(value)))
    }

    fn text_get(&self, handle: Handle) -> ApiResult<String> {
        with_text(self, handle, |text| Ok(text.value().to_string()))
    }

    fn text_set(&self, handle: Handle, value: &str) -> ApiResult<()> {
        with_text(self, handle, |text| {
            text.set(value);
            Ok(())
        })
    }

    fn text_append(&self, handle: Handle, suffix: &str) -> ApiResult<()> {
        with_text(self, handle, |text| {
            text.append(suffix);
            Ok(())
        })
    }

    fn text_len(&self, handle: Handle) -> ApiResult<usize> {
        with_text(self, handle, |text| Ok(text.len()))
    }

    fn text_make_uppercase(&self, handle: Handle) -> ApiResult<()> {
        with_text(self, handle, |text| {
            text.make_uppercase();
            Ok(())
        })
    }
}

fn with_text<T>(
    registry: &Registry,
    handle: Handle,
    f: impl FnOnce(&mut Text) -> ApiResult<T>,
) -> ApiResult<T> {
    registry.with_resource(handle, Kind::Text, |resource| match resource {
        Resource::Text(text) => f(text),
        _ => Err(kind_out_of_sync(handle)),
    })
}

// Checkout already matched the kind tag; the variant can only disagree if
// the registry itself is corrupt.
fn kind_out_of_sync(handle: Handle) -> Error {
    Error::new(ErrorKind::Internal)
        .with_message("kind tag out of sync")
        .with_handle(handle.as_raw())
}
