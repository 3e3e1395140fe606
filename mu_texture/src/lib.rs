#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Texture container decoders.
//!
//! Each container is a small fixed prefix followed by either a standard image
//! stream (JPEG, PNG, TGA, DDS) or a raw bitmap. All of them decode to a
//! [`TextureAsset`].

mod bitmap;
mod dds;
mod embedded;

pub use dds::BlockCompression;
pub use mu_binary::{Error, Result};

use std::fmt::{self, Display};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Raw bitmap behind a 4 byte prefix.
    Ozb,
    /// JPEG stream behind a 24 byte prefix.
    Ozj,
    /// PNG stream behind a 4 byte prefix.
    Ozp,
    /// TGA stream behind a 4 byte prefix.
    Ozt,
    /// DDS stream behind a 4 byte prefix, kept block compressed.
    Ozd,
}

impl TextureFormat {
    pub const ALL: [Self; 5] = [Self::Ozb, Self::Ozj, Self::Ozp, Self::Ozt, Self::Ozd];

    /// Returns the format for a container extension, case-insensitively.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }

    /// Returns the container format that stores a texture referenced with `extension`.
    ///
    /// Models reference textures by their source name (`sword.jpg`), while the
    /// file on disk is the wrapped container (`sword.ozj`).
    #[must_use]
    pub fn for_reference(extension: &str) -> Option<Self> {
        let extension = extension.to_ascii_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" => Some(Self::Ozj),
            "png" => Some(Self::Ozp),
            "tga" => Some(Self::Ozt),
            "bmp" => Some(Self::Ozb),
            "dds" => Some(Self::Ozd),
            other => Self::from_extension(other),
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Ozb => "ozb",
            Self::Ozj => "ozj",
            Self::Ozp => "ozp",
            Self::Ozt => "ozt",
            Self::Ozd => "ozd",
        }
    }

    /// Decodes a container of this format.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the container or its embedded stream is invalid.
    pub fn decode(self, bytes: &[u8]) -> Result<TextureAsset> {
        debug!(format = %self, len = bytes.len(), "decoding texture");

        match self {
            Self::Ozb => bitmap::decode(bytes),
            Self::Ozj => embedded::decode_jpeg(bytes),
            Self::Ozp => embedded::decode_png(bytes),
            Self::Ozt => embedded::decode_tga(bytes),
            Self::Ozd => dds::decode(bytes),
        }
    }
}

impl Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A decoded texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureAsset {
    pub width: u32,
    pub height: u32,
    /// 3 for RGB, 4 for RGBA.
    pub components: u8,
    /// Set when `data` holds GPU block-compressed data instead of interleaved pixels.
    pub compression: Option<BlockCompression>,
    /// Number of mip levels stored in `data`, always 1 for uncompressed textures.
    pub mip_levels: u32,
    /// Rows are stored top to bottom.
    pub data: Vec<u8>,
}

impl TextureAsset {
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.compression.is_some()
    }

    /// Reads the components of the pixel at `x`, `y` of an uncompressed texture.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if self.is_compressed() || x >= self.width || y >= self.height {
            return None;
        }

        let components = usize::from(self.components);
        let start = (y as usize * self.width as usize + x as usize) * components;
        self.data.get(start..start + components)
    }
}

/// Strips a container prefix, failing if nothing would be left.
fn strip_prefix(bytes: &[u8], prefix: usize) -> Result<&[u8]> {
    match bytes.get(prefix..) {
        Some(rest) if !rest.is_empty() => Ok(rest),
        _ => Err(Error::TruncatedInput {
            offset: 0,
            needed: prefix + 1,
            available: bytes.len(),
        }),
    }
}
