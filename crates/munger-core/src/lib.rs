#![forbid(unsafe_code)]
//! munger-core: data model and pure logic for the insight pipeline.
//!
//! Nothing here performs I/O. The collaborator traits in [`traits`] are
//! implemented by `munger-io` (object storage) and by test fakes.

pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod key;
pub mod payload;
pub mod prelude;
pub mod traits;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
