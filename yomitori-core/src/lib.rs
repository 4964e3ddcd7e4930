//! Lazy reader for the header region of ELF images.
//!
//! All four physical layouts (32/64-bit, little/big-endian) are decoded
//! into one native representation at construction time; section names and
//! contents are fetched through a caller-supplied [`Loader`] only when
//! first requested.

pub mod error;
pub mod file;
pub mod header;
pub mod loader;
pub mod section;
pub mod strtab;

pub use error::*;
pub use file::*;
pub use header::*;
pub use loader::*;
pub use section::*;
pub use strtab::*;
