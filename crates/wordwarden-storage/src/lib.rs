//! Flat-file persistence for the Wordwarden client.
//!
//! Every persisted document is plain JSON, one logical file per key:
//! word sets as arrays of strings, nicknames as a string → string
//! object, the version marker as `{"version": n}`, and the
//! request-status record as a username → profile map. All writes are
//! atomic: serialize → write temp file → fsync → rename.
//!
//! Subsystems: path layout, datafile initialization, dataset loading,
//! snapshot merging, and the write-through request-status store.

pub mod datasets;
pub mod files;
pub mod paths;
pub mod requests;

pub use datasets::{initialize_datafiles, load_dataset, merge_snapshot, read_version};
pub use paths::DataPaths;
pub use requests::RequestStore;
