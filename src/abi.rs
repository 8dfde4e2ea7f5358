//! Purpose: C ABI surface for bindings (libferrule).
//! Exports: C-callable factories, handle operations, the stream trampoline, and error accessors.
//! Role: Stable ABI surface for non-Rust callers; a thin projection of `api`.
//! Invariants: Handles cross as u64; 0 is never valid. Failures set the thread's
//! error channel before returning the operation's sentinel.
//! Invariants: One universal `frl_free` releases every handle kind.
//! Invariants: Returned strings are tracked allocations, released exactly once
//! through `frl_free_string`.
#![allow(clippy::result_large_err)]

use std::cmp::Ordering;
use std::collections::HashSet;
use std::ffi::{CStr, CString, c_void};
use std::os::raw::c_char;
use std::ptr;
use std::sync::{Mutex, OnceLock};

use crate::api::{StreamApiExt, TextApiExt, UuidApiExt};
use crate::core::error::{Error, ErrorKind};
use crate::core::registry::{Handle, Registry};
use crate::core::stream::{SeekMode, StreamBackend};

pub type FrlReadFn =
    unsafe extern "C" fn(context: *mut c_void, buffer: *mut u8, max_len: usize) -> isize;
pub type FrlWriteFn =
    unsafe extern "C" fn(context: *mut c_void, buffer: *const u8, len: usize) -> isize;
pub type FrlSeekFn = unsafe extern "C" fn(context: *mut c_void, offset: i64, mode: i32) -> i64;
pub type FrlFlushFn = unsafe extern "C" fn(context: *mut c_void) -> i32;

// The caller's callbacks plus its context word. The context stays opaque:
// keeping it valid until the stream handle is released, and safe to touch
// from whichever thread drives the stream, is the caller's contract.
struct CallbackBackend {
    context: usize,
    read_cb: Option<FrlReadFn>,
    write_cb: Option<FrlWriteFn>,
    seek_cb: Option<FrlSeekFn>,
    flush_cb: Option<FrlFlushFn>,
}

impl CallbackBackend {
    fn context(&self) -> *mut c_void {
        self.context as *mut c_void
    }
}

impl StreamBackend for CallbackBackend {
    fn read(&mut self, buf: &mut [u8]) -> isize {
        let Some(read_cb) = self.read_cb else {
            return -1;
        };
        unsafe { read_cb(self.context(), buf.as_mut_ptr(), buf.len()) }
    }

    fn write(&mut self, buf: &[u8]) -> isize {
        let Some(write_cb) = self.write_cb else {
            return -1;
        };
        unsafe { write_cb(self.context(), buf.as_ptr(), buf.len()) }
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> i64 {
        let Some(seek_cb) = self.seek_cb else {
            return -1;
        };
        unsafe { seek_cb(self.context(), offset, mode.as_raw()) }
    }

    fn flush(&mut self) -> i32 {
        // A write-through backend may omit flush; that is a no-op, not a fault.
        let Some(flush_cb) = self.flush_cb else {
            return 0;
        };
        unsafe { flush_cb(self.context()) }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_error_code() -> i32 {
    Error::last_code()
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_error_message() -> *mut c_char {
    // Reading the channel never disturbs it; an untrackable message comes
    // back null rather than clobbering the error being inspected.
    track_c_string(Error::last_message())
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_clear_error() {
    Error::clear_last();
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_free(handle: u64) -> i32 {
    match Registry::global().release_any(Handle::from_raw(handle)) {
        Ok(()) => 0,
        Err(err) => fail(err, -1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_free_string(ptr: *mut c_char) -> i32 {
    if ptr.is_null() {
        return fail(
            Error::new(ErrorKind::NullParameter).with_message("ptr is null"),
            -1,
        );
    }
    let tracked = string_ledger()
        .lock()
        .unwrap_or_else(|err| err.into_inner())
        .remove(&(ptr as usize));
    if !tracked {
        return fail(
            Error::new(ErrorKind::AlreadyFreed)
                .with_message("string already freed or not owned by this library"),
            -1,
        );
    }
    unsafe { drop(CString::from_raw(ptr)) };
    0
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_text_create(value: *const c_char) -> u64 {
    let value = match cstr_arg(value, "value") {
        Ok(value) => value,
        Err(err) => return fail(err, 0),
    };
    match Registry::global().text_create(value) {
        Ok(handle) => handle.as_raw(),
        Err(err) => fail(err, 0),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_text_get(handle: u64) -> *mut c_char {
    match Registry::global().text_get(Handle::from_raw(handle)) {
        Ok(value) => return_tracked(value),
        Err(err) => fail(err, ptr::null_mut()),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_text_set(handle: u64, value: *const c_char) -> i32 {
    let value = match cstr_arg(value, "value") {
        Ok(value) => value,
        Err(err) => return fail(err, -1),
    };
    match Registry::global().text_set(Handle::from_raw(handle), value) {
        Ok(()) => 0,
        Err(err) => fail(err, -1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_text_append(handle: u64, value: *const c_char) -> i32 {
    let value = match cstr_arg(value, "value") {
        Ok(value) => value,
        Err(err) => return fail(err, -1),
    };
    match Registry::global().text_append(Handle::from_raw(handle), value) {
        Ok(()) => 0,
        Err(err) => fail(err, -1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_text_len(handle: u64) -> i64 {
    match Registry::global().text_len(Handle::from_raw(handle)) {
        Ok(len) => len as i64,
        Err(err) => fail(err, -1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_text_to_upper(handle: u64) -> i32 {
    match Registry::global().text_make_uppercase(Handle::from_raw(handle)) {
        Ok(()) => 0,
        Err(err) => fail(err, -1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_new_v4() -> u64 {
    match Registry::global().uuid_new_v4() {
        Ok(handle) => handle.as_raw(),
        Err(err) => fail(err, 0),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_new_v7() -> u64 {
    match Registry::global().uuid_new_v7() {
        Ok(handle) => handle.as_raw(),
        Err(err) => fail(err, 0),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_nil() -> u64 {
    match Registry::global().uuid_nil() {
        Ok(handle) => handle.as_raw(),
        Err(err) => fail(err, 0),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_max() -> u64 {
    match Registry::global().uuid_max() {
        Ok(handle) => handle.as_raw(),
        Err(err) => fail(err, 0),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_parse(value: *const c_char) -> u64 {
    let value = match cstr_arg(value, "value") {
        Ok(value) => value,
        Err(err) => return fail(err, 0),
    };
    match Registry::global().uuid_parse(value) {
        Ok(handle) => handle.as_raw(),
        Err(err) => fail(err, 0),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_to_string(handle: u64) -> *mut c_char {
    match Registry::global().uuid_to_string(Handle::from_raw(handle)) {
        Ok(value) => return_tracked(value),
        Err(err) => fail(err, ptr::null_mut()),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_to_urn(handle: u64) -> *mut c_char {
    match Registry::global().uuid_to_urn(Handle::from_raw(handle)) {
        Ok(value) => return_tracked(value),
        Err(err) => fail(err, ptr::null_mut()),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_bytes(handle: u64, out_bytes: *mut u8) -> i32 {
    if out_bytes.is_null() {
        return fail(
            Error::new(ErrorKind::NullParameter).with_message("out_bytes is null"),
            -1,
        );
    }
    match Registry::global().uuid_bytes(Handle::from_raw(handle)) {
        Ok(bytes) => {
            unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), out_bytes, bytes.len()) };
            0
        }
        Err(err) => fail(err, -1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_compare(a: u64, b: u64, out_order: *mut i32) -> i32 {
    if out_order.is_null() {
        return fail(
            Error::new(ErrorKind::NullParameter).with_message("out_order is null"),
            -1,
        );
    }
    match Registry::global().uuid_compare(Handle::from_raw(a), Handle::from_raw(b)) {
        Ok(order) => {
            let value = match order {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            };
            unsafe { *out_order = value };
            0
        }
        Err(err) => fail(err, -1),
    }
}

/// Tri-state: 1 equal, 0 not equal, -1 failure with the channel set.
#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_equals(a: u64, b: u64) -> i32 {
    match Registry::global().uuid_equals(Handle::from_raw(a), Handle::from_raw(b)) {
        Ok(equal) => i32::from(equal),
        Err(err) => fail(err, -1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_is_nil(handle: u64) -> i32 {
    match Registry::global().uuid_is_nil(Handle::from_raw(handle)) {
        Ok(is_nil) => i32::from(is_nil),
        Err(err) => fail(err, -1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_is_max(handle: u64) -> i32 {
    match Registry::global().uuid_is_max(Handle::from_raw(handle)) {
        Ok(is_max) => i32::from(is_max),
        Err(err) => fail(err, -1),
    }
}

/// Returns 0 with `out_ms` filled when the version carries a timestamp,
/// 1 when it carries none, -1 on failure with the channel set.
#[unsafe(no_mangle)]
pub extern "C" fn frl_uuid_timestamp_ms(handle: u64, out_ms: *mut u64) -> i32 {
    if out_ms.is_null() {
        return fail(
            Error::new(ErrorKind::NullParameter).with_message("out_ms is null"),
            -1,
        );
    }
    match Registry::global().uuid_timestamp_ms(Handle::from_raw(handle)) {
        Ok(Some(ms)) => {
            unsafe { *out_ms = ms };
            0
        }
        Ok(None) => 1,
        Err(err) => fail(err, -1),
    }
}

/// A one-direction stream may pass null for the unused side; invoking that
/// side then fails. Passing null for both sides is refused outright.
#[unsafe(no_mangle)]
pub extern "C" fn frl_stream_open(
    context: *mut c_void,
    read_cb: Option<FrlReadFn>,
    write_cb: Option<FrlWriteFn>,
    seek_cb: Option<FrlSeekFn>,
    flush_cb: Option<FrlFlushFn>,
) -> u64 {
    if read_cb.is_none() && write_cb.is_none() {
        return fail(
            Error::new(ErrorKind::NullParameter)
                .with_message("read_cb and write_cb are both null"),
            0,
        );
    }
    let backend = CallbackBackend {
        context: context as usize,
        read_cb,
        write_cb,
        seek_cb,
        flush_cb,
    };
    match Registry::global().stream_open(Box::new(backend)) {
        Ok(handle) => handle.as_raw(),
        Err(err) => fail(err, 0),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_stream_read(handle: u64, buffer: *mut u8, max_len: usize) -> isize {
    if buffer.is_null() && max_len != 0 {
        return fail(
            Error::new(ErrorKind::NullParameter).with_message("buffer is null"),
            -1,
        );
    }
    let mut empty = [0u8; 0];
    let buf = if max_len == 0 {
        &mut empty[..]
    } else {
        unsafe { std::slice::from_raw_parts_mut(buffer, max_len) }
    };
    match Registry::global().stream_read(Handle::from_raw(handle), buf) {
        Ok(moved) => moved as isize,
        Err(err) => fail(err, -1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_stream_write(handle: u64, buffer: *const u8, len: usize) -> isize {
    if buffer.is_null() && len != 0 {
        return fail(
            Error::new(ErrorKind::NullParameter).with_message("buffer is null"),
            -1,
        );
    }
    let buf = if len == 0 {
        &[][..]
    } else {
        unsafe { std::slice::from_raw_parts(buffer, len) }
    };
    match Registry::global().stream_write(Handle::from_raw(handle), buf) {
        Ok(moved) => moved as isize,
        Err(err) => fail(err, -1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_stream_seek(handle: u64, offset: i64, mode: i32) -> i64 {
    let Some(seek_mode) = SeekMode::from_raw(mode) else {
        return fail(
            Error::new(ErrorKind::OutOfRange).with_message(format!("invalid seek mode {mode}")),
            -1,
        );
    };
    match Registry::global().stream_seek(Handle::from_raw(handle), offset, seek_mode) {
        Ok(position) => position as i64,
        Err(err) => fail(err, -1),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn frl_stream_flush(handle: u64) -> i32 {
    match Registry::global().stream_flush(Handle::from_raw(handle)) {
        Ok(()) => 0,
        Err(err) => fail(err, -1),
    }
}

fn fail<T>(err: Error, sentinel: T) -> T {
    err.set_last();
    sentinel
}

fn cstr_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, Error> {
    if ptr.is_null() {
        return Err(Error::new(ErrorKind::NullParameter).with_message(format!("{name} is null")));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| Error::new(ErrorKind::Parse).with_message(format!("{name} is not valid UTF-8")))
}

fn return_tracked(value: String) -> *mut c_char {
    let ptr = track_c_string(value);
    if ptr.is_null() {
        return fail(
            Error::new(ErrorKind::Parse).with_message("value contains an interior nul byte"),
            ptr::null_mut(),
        );
    }
    ptr
}

fn track_c_string(value: String) -> *mut c_char {
    let Ok(value) = CString::new(value) else {
        return ptr::null_mut();
    };
    let raw = value.into_raw();
    string_ledger()
        .lock()
        .unwrap_or_else(|err| err.into_inner())
        .insert(raw as usize);
    raw
}

fn string_ledger() -> &'static Mutex<HashSet<usize>> {
    static LEDGER: OnceLock<Mutex<HashSet<usize>>> = OnceLock::new();
    LEDGER.get_or_init(|| Mutex::new(HashSet::new()))
}

#[cfg(test)]
mod tests {
    use super::{
        CallbackBackend, cstr_arg, frl_free_string, frl_stream_open, frl_stream_seek,
        track_c_string,
    };
    use crate::core::error::{Error, ErrorKind};
    use crate::core::stream::{SeekMode, StreamBackend};
    use std::ffi::c_void;
    use std::ptr;

    #[test]
    fn cstr_arg_reports_null_and_bad_utf8() {
        let err = cstr_arg(ptr::null(), "value").expect_err("null");
        assert_eq!(err.kind(), ErrorKind::NullParameter);

        let bad = [0xffu8, 0];
        let err = cstr_arg(bad.as_ptr().cast(), "value").expect_err("utf8");
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn tracked_strings_free_exactly_once() {
        Error::clear_last();
        let ptr = track_c_string("tracked".to_string());
        assert!(!ptr.is_null());

        assert_eq!(frl_free_string(ptr), 0);
        assert_eq!(frl_free_string(ptr), -1);
        assert_eq!(Error::last_code(), 3);
        Error::clear_last();
    }

    #[test]
    fn free_string_rejects_null() {
        Error::clear_last();
        assert_eq!(frl_free_string(ptr::null_mut()), -1);
        assert_eq!(Error::last_code(), 1);
        Error::clear_last();
    }

    #[test]
    fn callback_backend_maps_missing_callbacks() {
        let mut backend = CallbackBackend {
            context: 0,
            read_cb: None,
            write_cb: None,
            seek_cb: None,
            flush_cb: None,
        };
        let mut buf = [0u8; 4];
        assert_eq!(backend.read(&mut buf), -1);
        assert_eq!(backend.write(b"x"), -1);
        assert_eq!(backend.seek(0, SeekMode::Start), -1);
        assert_eq!(backend.flush(), 0);
    }

    #[test]
    fn stream_open_requires_a_data_callback() {
        Error::clear_last();
        let handle = frl_stream_open(ptr::null_mut(), None, None, None, None);
        assert_eq!(handle, 0);
        assert_eq!(Error::last_code(), 1);
        Error::clear_last();
    }

    #[test]
    fn invalid_seek_mode_is_out_of_range() {
        unsafe extern "C" fn empty_read(
            _context: *mut c_void,
            _buffer: *mut u8,
            _max_len: usize,
        ) -> isize {
            0
        }

        Error::clear_last();
        let handle = frl_stream_open(ptr::null_mut(), Some(empty_read), None, None, None);
        assert_ne!(handle, 0);

        assert_eq!(frl_stream_seek(handle, 0, 9), -1);
        assert_eq!(Error::last_code(), 7);
        Error::clear_last();
        assert_eq!(super::frl_free(handle), 0);
    }
}
