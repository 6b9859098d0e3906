//! Shared utility code throughout the Duels WAD tools.

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod align;
pub mod binary;
pub mod text;
