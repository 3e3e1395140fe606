//! Block-compressed DirectDraw surfaces behind the `ozd` prefix.
//!
//! The surface is not decompressed. Its blocks are handed out as they are,
//! tagged with the compression scheme, so they can be uploaded directly.

use std::fmt::{self, Display};

use mu_binary::Reader;

use crate::{strip_prefix, Error, Result, TextureAsset};

const FORMAT: &str = "ozd";
const PREFIX: usize = 4;

const MAGIC: &[u8; 4] = b"DDS ";
const HEADER_SIZE: u32 = 124;
const PIXEL_FORMAT_OFFSET: usize = 72;

/// Block compression schemes of a DDS surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockCompression {
    /// DXT1, 8 bytes per 4x4 block.
    Bc1,
    /// DXT3, 16 bytes per 4x4 block with explicit alpha.
    Bc2,
    /// DXT5, 16 bytes per 4x4 block with interpolated alpha.
    Bc3,
}

impl BlockCompression {
    fn from_four_cc(four_cc: [u8; 4]) -> Option<Self> {
        match &four_cc {
            b"DXT1" => Some(Self::Bc1),
            b"DXT3" => Some(Self::Bc2),
            b"DXT5" => Some(Self::Bc3),
            _ => None,
        }
    }

    #[must_use]
    pub fn block_size(self) -> usize {
        match self {
            Self::Bc1 => 8,
            Self::Bc2 | Self::Bc3 => 16,
        }
    }

    #[must_use]
    pub fn components(self) -> u8 {
        match self {
            Self::Bc1 => 3,
            Self::Bc2 | Self::Bc3 => 4,
        }
    }

    /// Size in bytes of a single surface of the given dimensions.
    #[must_use]
    pub fn surface_size(self, width: u32, height: u32) -> usize {
        let blocks_wide = ((width as usize) + 3) / 4;
        let blocks_high = ((height as usize) + 3) / 4;
        blocks_wide.max(1) * blocks_high.max(1) * self.block_size()
    }
}

impl Display for BlockCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bc1 => "DXT1",
            Self::Bc2 => "DXT3",
            Self::Bc3 => "DXT5",
        })
    }
}

pub fn decode(bytes: &[u8]) -> Result<TextureAsset> {
    let surface = strip_prefix(bytes, PREFIX)?;
    let mut reader = Reader::new(surface);

    if reader.read_bytes(4)? != MAGIC {
        return Err(Error::invalid(FORMAT, "missing `DDS ` signature"));
    }

    let header = reader.read_bytes(HEADER_SIZE as usize)?;
    let mut fields = Reader::new(header);

    let size = fields.read_u32()?;
    if size != HEADER_SIZE {
        return Err(Error::invalid(
            FORMAT,
            format!("header size {size}, expected {HEADER_SIZE}"),
        ));
    }
    let _flags = fields.read_u32()?;
    let height = fields.read_u32()?;
    let width = fields.read_u32()?;
    let _pitch = fields.read_u32()?;
    let _depth = fields.read_u32()?;
    let mip_levels = fields.read_u32()?.max(1);

    let mut pixel_format = Reader::new(&header[PIXEL_FORMAT_OFFSET..]);
    // size, flags
    pixel_format.skip(8)?;
    let mut four_cc = [0; 4];
    four_cc.copy_from_slice(pixel_format.read_bytes(4)?);

    let compression = BlockCompression::from_four_cc(four_cc).ok_or_else(|| {
        Error::invalid(
            FORMAT,
            format!("unsupported pixel format `{}`", four_cc.escape_ascii()),
        )
    })?;

    if width == 0 || height == 0 {
        return Err(Error::invalid(
            FORMAT,
            format!("invalid dimensions {width}x{height}"),
        ));
    }

    let data = reader.remaining_bytes();
    let needed = compression.surface_size(width, height);
    if data.len() < needed {
        return Err(Error::TruncatedInput {
            offset: PREFIX + reader.position(),
            needed,
            available: data.len(),
        });
    }

    Ok(TextureAsset {
        width,
        height,
        components: compression.components(),
        compression: Some(compression),
        mip_levels,
        data: data.to_vec(),
    })
}
