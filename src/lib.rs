#![forbid(unsafe_code)]
//! munger: facade over the workspace crates.
//!
//! - `core`: data model, catalog, payload decoding, insight extraction.
//! - `io`: object storage backends and the object-backed collaborators.
//! - `exec`: cycle driver, scheduler, and per-cycle reports.

pub use munger_core as core;
pub use munger_exec as exec;
pub use munger_io as io;
