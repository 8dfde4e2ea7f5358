//! Purpose: Shared core library crate behind the `frl` demo binary and the C ABI (libferrule).
//! Exports: `core` (registry, errors, values, stream contract), `api` (Rust surface),
//! `abi` (C surface), `backend` (example stream backends).
//! Role: Internal library plus a stable C projection; the Rust API is additive but not frozen.
//! Invariants: Every handle is type-tagged and double-free-safe; one universal release frees all kinds.
//! Invariants: The C error channel is thread-local and written only at the ABI boundary.
pub mod abi;
pub mod api;
pub mod backend;
pub mod core;
