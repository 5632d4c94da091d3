//! The archive: one text file holding many source files.
//!
//! - [`format`]: the line grammar (headers, separators, footer).
//! - [`write`]: serializing a collection.
//! - [`read`]: parsing an archive back into entries.

pub mod format;
pub mod read;
pub mod write;


pub use read::{ArchiveEntry, parse_archive, read_archive};
pub use write::{ArchiveWriter, Banner, PackReport, pack_collection, write_archive_file};
