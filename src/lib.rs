//! Bangumi Archive Loader
//!
//! Schema-validated streaming decoder for Bangumi wiki snapshot archives: a
//! single zip container of newline-delimited JSON member files, one record
//! per line, exposed as independent lazy record streams per entity type.
//!
//! ## Features
//!
//! - **Schemas as data**: a static registry declares each member's fields,
//!   enum domains and unknown-field policy; one generic decoder enforces it
//! - **Namespaced enumerations**: relation and staff-position codes whose
//!   valid ranges depend on the parent subject's type
//! - **Error policy**: per-line failures are dropped, fatal, or collected
//!   for a report, at the caller's choice
//! - **Deterministic resources**: every stream owns its archive handle and
//!   releases it on every exit path
//!
//! ## Architecture
//!
//! ```text
//! ArchiveReader (facade: path + policy + collect buffer)
//! ├── subjects() .. person_characters()  → RecordStream<T>
//! ├── load_all()                         → member name → RecordIter
//! └── failure_report()                   → FailureReport
//!
//! RecordStream<T>  (stream: owned zip member handle, lazy lines)
//! └── decode_line<T>(raw, schema)        (decoder: policy-free)
//!     └── registry::schema_for(member)   (registry: static table)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use bgm_archive::{ArchiveReader, ErrorPolicy};
//!
//! # fn main() -> bgm_archive::Result<()> {
//! let reader = ArchiveReader::open("snapshot.zip", ErrorPolicy::Collect)?;
//! let episodes: Vec<_> = reader.episodes()?.collect::<Result<_, _>>()?;
//! let report = reader.failure_report();
//! println!("{} episodes, {} failures", episodes.len(), report.total());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod decode;
pub mod error;
pub mod model;
pub mod registry;
pub mod schema;
pub mod stream;

pub use archive::{ArchiveReader, FailureReport, RecordIter};
pub use config::LoaderConfig;
pub use decode::decode_line;
pub use error::{ArchiveError, DecodeFailure, FailureKind, RecordedFailure, Result};
pub use model::Record;
pub use registry::schema_for;
pub use schema::{EnumDomain, FieldKind, FieldSpec, Schema, UnknownFieldPolicy};
pub use stream::{ErrorPolicy, RecordStream};
