// Core modules implementing handles, error modeling, values, and the stream contract.
pub mod error;
pub mod registry;
pub mod stream;
pub mod text;
pub mod uuid;
