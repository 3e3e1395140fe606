#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Decoders for the per-map terrain containers.
//!
//! Every container starts with the same two byte header:
//!
//! ```text
//! u8 version, u8 map number
//! [u32 length, ciphertext]   only for encrypted versions
//! body
//! ```
//!
//! The body is a count-prefixed list of object placements (`obj`), or one or
//! more grids of [`TERRAIN_SIZE`] x [`TERRAIN_SIZE`] cells (`att`, `map`).

mod attribute;
mod grid;
mod mapping;
mod objects;

pub use attribute::{AttributeFlags, TerrainAttribute};
pub use grid::Grid;
pub use mapping::{TerrainHeight, TerrainMapping, HEIGHT_SCALE};
pub use mu_binary::{Error, Result};
pub use objects::{ObjectList, ObjectPlacement};

use std::borrow::Cow;

use mu_binary::Reader;
use tracing::debug;

/// Side length of a terrain in cells.
pub const TERRAIN_SIZE: usize = 256;
pub const CELL_COUNT: usize = TERRAIN_SIZE * TERRAIN_SIZE;

const HEADER_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    pub version: u8,
    pub map_number: u8,
}

impl Header {
    /// Whether records of this revision carry the fields added after version 0.
    #[must_use]
    pub fn is_extended(self) -> bool {
        self.version >= 1
    }
}

/// Reads the header of a terrain container and opens its body.
fn open<'a>(format: &'static str, bytes: &'a [u8]) -> Result<(Header, Cow<'a, [u8]>)> {
    let mut reader = Reader::new(bytes);
    let header = Header {
        version: reader.read_u8()?,
        map_number: reader.read_u8()?,
    };

    debug!(
        format,
        version = header.version,
        map_number = header.map_number,
        "decoding terrain container"
    );

    let body = mu_crypt::open_body(bytes, header.version, HEADER_SIZE)?;
    Ok((header, body))
}
