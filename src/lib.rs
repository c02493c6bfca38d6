//! A library for reading and writing [Windows
//! cabinet](https://en.wikipedia.org/wiki/Cabinet_(file_format)) (CAB)
//! archives entirely in memory: bytes in, bytes out.
//!
//! Parsing handles uncompressed and MSZIP-compressed cabinets, including
//! multi-folder and multi-block layouts, and verifies the format's XOR
//! block checksums. Writing always produces a single-folder cabinet,
//! optionally MSZIP-compressed; parsing a cabinet and re-saving it with
//! the same compression flag reproduces the original bytes exactly.
//! Quantum and LZX compression and chained cabinet sets are rejected with
//! distinct errors.
//!
//! ```no_run
//! use cabarchive::{CabArchive, CabFile};
//!
//! let archive = CabArchive::parse(&std::fs::read("input.cab")?)?;
//! for file in &archive {
//!     println!("{} ({} bytes)", file.name(), file.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod archive;
mod checksum;
mod consts;
mod ctype;
mod datetime;
mod error;
mod file;
mod mszip;
mod parser;
mod record;
mod writer;

pub use crate::archive::CabArchive;
pub use crate::error::{Error, Result};
pub use crate::file::CabFile;
