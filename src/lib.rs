//! srcpack library crate.
//!
//! The primary interface is the `srcpack` binary. The library exposes the
//! pack and unpack pipelines so that integration tests and benches can drive
//! them without going through the CLI:
//!
//! - pack: [`rules`] -> [`collect`] (via [`matcher`]) -> [`encoding`] ->
//!   [`archive::write`]
//! - unpack: [`archive::read`] -> [`unpack`]

pub mod archive;
pub mod collect;
pub mod config;
pub mod encoding;
pub mod error;
pub mod matcher;
pub mod paths;
pub mod rules;
pub mod unpack;
