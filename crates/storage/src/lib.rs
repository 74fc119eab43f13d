//! Storage abstractions for the bloom worker.
//!
//! Provides:
//! - [`StorageSink`], the write/read/exists/list surface the pipeline persists through
//! - [`ObjectStorage`], an `object_store` backed sink (local filesystem, S3, in-memory)
//! - [`MirroredStorage`], which fans writes out to a primary and a mirror sink
//! - [`StoragePath`], the output path layout

pub mod mirrored;
pub mod object_store;
pub mod sink;

pub use self::object_store::{ObjectStorage, ObjectStorageConfig, StoragePath};
pub use mirrored::MirroredStorage;
pub use sink::{content_types, write_json, StorageSink};
