#![forbid(unsafe_code)]
//! munger-io: object storage backends and the collaborators built on them.
//!
//! - `storage`: the `Storage` trait plus filesystem / S3 backends and the
//!   URI-driven builder.
//! - `memory_storage`: in-memory backend for `memory://` and tests.
//! - `sources`: `MasterListSource`, `RecordSource` and `ResultSink` over a
//!   `Storage`.

pub mod error;
pub mod memory_storage;
pub mod sources;
pub mod storage;

pub use memory_storage::MemoryStorage;
pub use sources::{ObjectMasterList, ObjectRecordSource, ObjectResultSink};
pub use storage::{build_storage_from_config, FsStorage, RetryConfig, Storage};
