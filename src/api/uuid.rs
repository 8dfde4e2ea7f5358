//! Purpose: UUID handle operations over the registry.
//! Exports: `UuidApiExt`.
//! Role: Factories, projections, and the byte-wise total order.
//! Invariants: `uuid_parse` admits only the canonical hyphenated form.
//! Invariants: Comparisons copy values out first; no operation holds two payload locks.
#![allow(clippy::result_large_err)]

use std::cmp::Ordering;

use uuid::Uuid;

use crate::core::error::{Error, ErrorKind};
use crate::core::registry::{Handle, Kind, Registry, Resource};
use crate::core::uuid::{parse_canonical, timestamp_ms, timestamp_rfc3339};

use super::ApiResult;

pub trait UuidApiExt {
    fn uuid_new_v4(&self) -> ApiResult<Handle>;
    fn uuid_new_v7(&self) -> ApiResult<Handle>;
    fn uuid_nil(&self) -> ApiResult<Handle>;
    fn uuid_max(&self) -> ApiResult<Handle>;
    fn uuid_parse(&self, input: &str) -> ApiResult<Handle>;
    /// The raw value; handy for Rust embedders, unused by the C surface.
    fn uuid_value(&self, handle: Handle) -> ApiResult<Uuid>;
    fn uuid_to_string(&self, handle: Handle) -> ApiResult<String>;
    fn uuid_to_urn(&self, handle: Handle) -> ApiResult<String>;
    fn uuid_bytes(&self, handle: Handle) -> ApiResult<[u8; 16]>;
    fn uuid_compare(&self, a: Handle, b: Handle) -> ApiResult<Ordering>;
    fn uuid_equals(&self, a: Handle, b: Handle) -> ApiResult<bool>;
    fn uuid_is_nil(&self, handle: Handle) -> ApiResult<bool>;
    fn uuid_is_max(&self, handle: Handle) -> ApiResult<bool>;
    fn uuid_timestamp_ms(&self, handle: Handle) -> ApiResult<Option<u64>>;
    fn uuid_timestamp_rfc3339(&self, handle: Handle) -> ApiResult<Option<String>>;
}

impl UuidApiExt for Registry {
    fn uuid_new_v4(&self) -> ApiResult<Handle> {
        self.register(Resource::Uuid(Uuid::new_v4()))
    }

    fn uuid_new_v7(&self) -> ApiResult<Handle> {
        self.register(Resource::Uuid(Uuid::now_v7()))
    }

    fn uuid_nil(&self) -> ApiResult<Handle> {
        self.register(Resource::Uuid(Uuid::nil()))
    }

    fn uuid_max(&self) -> ApiResult<Handle> {
        self.register(Resource::Uuid(Uuid::max()))
    }

    fn uuid_parse(&self, input: &str) -> ApiResult<Handle> {
        let value = parse_canonical(input)?;
        self.register(Resource::Uuid(value))
    }

    fn uuid_value(&self, handle: Handle) -> ApiResult<Uuid> {
        with_uuid(self, handle, |value| Ok(*value))
    }

    fn uuid_to_string(&self, handle: Handle) -> ApiResult<String> {
        Ok(self.uuid_value(handle)?.to_string())
    }

    fn uuid_to_urn(&self, handle: Handle) -> ApiResult<String> {
        Ok(self.uuid_value(handle)?.urn().to_string())
    }

    fn uuid_bytes(&self, handle: Handle) -> ApiResult<[u8; 16]> {
        Ok(self.uuid_value(handle)?.into_bytes())
    }

    fn uuid_compare(&self, a: Handle, b: Handle) -> ApiResult<Ordering> {
        let left = self.uuid_value(a)?;
        let right = self.uuid_value(b)?;
        Ok(left.cmp(&right))
    }

    fn uuid_equals(&self, a: Handle, b: Handle) -> ApiResult<bool> {
        Ok(self.uuid_compare(a, b)? == Ordering::Equal)
    }

    fn uuid_is_nil(&self, handle: Handle) -> ApiResult<bool> {
        Ok(self.uuid_value(handle)?.is_nil())
    }

    fn uuid_is_max(&self, handle: Handle) -> ApiResult<bool> {
        Ok(self.uuid_value(handle)?.is_max())
    }

    fn uuid_timestamp_ms(&self, handle: Handle) -> ApiResult<Option<u64>> {
        Ok(timestamp_ms(&self.uuid_value(handle)?))
    }

    fn uuid_timestamp_rfc3339(&self, handle: Handle) -> ApiResult<Option<String>> {
        timestamp_rfc3339(&self.uuid_value(handle)?)
    }
}

fn with_uuid<T>(
    registry: &Registry,
    handle: Handle,
    f: impl FnOnce(&Uuid) -> ApiResult<T>,
) -> ApiResult<T> {
    registry.with_resource(handle, Kind::Uuid, |resource| match resource {
        Resource::Uuid(value) => f(value),
        _ => Err(Error::new(ErrorKind::Internal)
            .with_message("kind tag out of sync")
            .with_handle(handle.as_raw())),
    })
}
