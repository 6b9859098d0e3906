//! Library for interacting with Duels of the Planeswalkers WAD
//! archives.
//!
//! Support for both reading and writing all five format revisions
//! is provided, with the exception of reading the pre-0x200 ones
//! whose data-offset layout is unknown.
//!
//! Archive headers are produced in two passes: a placeholder header
//! is written, followed by the stored file records, and the header
//! is written again once the final record offsets are known. See
//! [`ArchiveBuilder`] for details.

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod archive;
pub use archive::*;

mod builder;
pub use builder::*;

mod deflater;
pub use deflater::*;

mod error;
pub use error::{ErrorKind, WadError};

pub mod glob;

mod inflater;
pub use inflater::*;

pub mod layout;

pub mod string_table;

mod tree;
pub use tree::*;

pub mod types;
pub use types::{ArchiveFlags, DataType, Version};
