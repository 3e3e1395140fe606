//! Uncompressed Windows bitmaps behind the `ozb` prefix.
//!
//! Only the subset the client ships is accepted: 8 bit paletted, 24 bit BGR
//! and 32 bit BGRA images without compression. Rows are padded to 4 bytes and
//! stored bottom-up unless the height is negative.

use mu_binary::Reader;

use crate::{strip_prefix, Error, Result, TextureAsset};

const FORMAT: &str = "ozb";
const PREFIX: usize = 4;

const SIGNATURE: &[u8; 2] = b"BM";
const FILE_HEADER_SIZE: usize = 14;
const MIN_INFO_HEADER_SIZE: u32 = 40;
const PALETTE_ENTRY_SIZE: usize = 4;

struct InfoHeader {
    size: u32,
    width: u32,
    height: u32,
    bottom_up: bool,
    bits_per_pixel: u16,
    colors_used: u32,
}

impl InfoHeader {
    fn read(reader: &mut Reader) -> Result<Self> {
        let size = reader.read_u32()?;
        if size < MIN_INFO_HEADER_SIZE {
            return Err(Error::invalid(
                FORMAT,
                format!("info header size {size} is too small"),
            ));
        }

        let width = reader.read_i32()?;
        let height = reader.read_i32()?;
        let _planes = reader.read_u16()?;
        let bits_per_pixel = reader.read_u16()?;
        let compression = reader.read_u32()?;
        // image size, resolution
        reader.skip(12)?;
        let colors_used = reader.read_u32()?;

        if width <= 0 || height == 0 {
            return Err(Error::invalid(
                FORMAT,
                format!("invalid dimensions {width}x{height}"),
            ));
        }

        if compression != 0 {
            return Err(Error::invalid(
                FORMAT,
                format!("unsupported compression {compression}"),
            ));
        }

        Ok(Self {
            size,
            width: width.unsigned_abs(),
            height: height.unsigned_abs(),
            bottom_up: height > 0,
            bits_per_pixel,
            colors_used,
        })
    }
}

pub fn decode(bytes: &[u8]) -> Result<TextureAsset> {
    let bitmap = strip_prefix(bytes, PREFIX)?;
    let mut reader = Reader::new(bitmap);

    if reader.read_bytes(2)? != SIGNATURE {
        return Err(Error::invalid(FORMAT, "missing `BM` signature"));
    }
    // file size, reserved
    reader.skip(8)?;
    let data_offset = reader.read_u32()? as usize;

    let header = InfoHeader::read(&mut reader)?;

    let palette = if header.bits_per_pixel == 8 {
        Some(read_palette(bitmap, &header)?)
    } else {
        None
    };

    let (source_components, components) = match header.bits_per_pixel {
        8 => (1, 3),
        24 => (3, 3),
        32 => (4, 4),
        other => {
            return Err(Error::invalid(
                FORMAT,
                format!("unsupported bit depth {other}"),
            ))
        }
    };

    let width = header.width as usize;
    let height = header.height as usize;
    let stride = (width * source_components + 3) & !3;

    let pixels = bitmap.get(data_offset..).ok_or(Error::TruncatedInput {
        offset: PREFIX + data_offset,
        needed: 0,
        available: bytes.len(),
    })?;
    if pixels.len() < stride * height {
        return Err(Error::TruncatedInput {
            offset: PREFIX + data_offset,
            needed: stride * height,
            available: pixels.len(),
        });
    }

    let mut data = Vec::with_capacity(width * height * components);
    for y in 0..height {
        let source_row = if header.bottom_up { height - 1 - y } else { y };
        let row = &pixels[source_row * stride..][..width * source_components];

        match &palette {
            Some(palette) => {
                for &index in row {
                    let color = palette.get(usize::from(index)).ok_or_else(|| {
                        Error::invalid(FORMAT, format!("palette index {index} out of range"))
                    })?;
                    data.extend_from_slice(color);
                }
            }
            None => {
                for pixel in row.chunks_exact(source_components) {
                    data.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
                    if source_components == 4 {
                        data.push(pixel[3]);
                    }
                }
            }
        }
    }

    Ok(TextureAsset {
        width: header.width,
        height: header.height,
        components: components as u8,
        compression: None,
        mip_levels: 1,
        data,
    })
}

/// Reads the BGRA palette following the info header as RGB triples.
fn read_palette(bitmap: &[u8], header: &InfoHeader) -> Result<Vec<[u8; 3]>> {
    let count = match header.colors_used {
        0 => 256,
        n => n.min(256) as usize,
    };

    let start = FILE_HEADER_SIZE + header.size as usize;
    let mut reader = Reader::new(bitmap);
    reader.skip(start)?;
    let entries = reader.read_bytes(count * PALETTE_ENTRY_SIZE)?;

    Ok(entries
        .chunks_exact(PALETTE_ENTRY_SIZE)
        .map(|bgra| [bgra[2], bgra[1], bgra[0]])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO_HEADER_SIZE: usize = 40;

    /// Builds an `ozb` container around a bitmap whose rows are produced by `row`.
    fn container(
        width: i32,
        height: i32,
        bits_per_pixel: u16,
        palette: &[[u8; 4]],
        row: impl Fn(usize) -> Vec<u8>,
    ) -> Vec<u8> {
        let data_offset = FILE_HEADER_SIZE + INFO_HEADER_SIZE + palette.len() * 4;

        let mut out = vec![0; PREFIX];
        out.extend_from_slice(SIGNATURE);
        out.extend_from_slice(&0_u32.to_le_bytes());
        out.extend_from_slice(&0_u32.to_le_bytes());
        out.extend_from_slice(&(data_offset as u32).to_le_bytes());

        out.extend_from_slice(&(INFO_HEADER_SIZE as u32).to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&1_u16.to_le_bytes());
        out.extend_from_slice(&bits_per_pixel.to_le_bytes());
        out.extend_from_slice(&0_u32.to_le_bytes());
        out.extend_from_slice(&[0; 12]);
        out.extend_from_slice(&(palette.len() as u32).to_le_bytes());
        out.extend_from_slice(&0_u32.to_le_bytes());

        for entry in palette {
            out.extend_from_slice(entry);
        }

        for y in 0..height.unsigned_abs() as usize {
            let mut row = row(y);
            while row.len() % 4 != 0 {
                row.push(0);
            }
            out.extend_from_slice(&row);
        }

        out
    }

    #[test]
    fn bottom_up_24_bit() {
        // stored row y is filled with blue = y, green = 2, red = 3
        let bytes = container(256, 64, 24, &[], |y| {
            (0..256).flat_map(|_| [y as u8, 2, 3]).collect()
        });

        let texture = decode(&bytes).unwrap();
        assert_eq!((texture.width, texture.height), (256, 64));
        assert_eq!(texture.components, 3);
        assert_eq!(texture.data.len(), 256 * 64 * 3);
        assert_eq!(texture.pixel(0, 0), Some(&[3, 2, 63][..]));
        assert_eq!(texture.pixel(255, 63), Some(&[3, 2, 0][..]));
    }

    #[test]
    fn top_down_32_bit() {
        let bytes = container(2, -2, 32, &[], |y| {
            vec![10, 20, 30 + y as u8, 40, 50, 60, 70, 80]
        });

        let texture = decode(&bytes).unwrap();
        assert_eq!(texture.components, 4);
        assert_eq!(texture.pixel(0, 0), Some(&[30, 20, 10, 40][..]));
        assert_eq!(texture.pixel(0, 1), Some(&[31, 20, 10, 40][..]));
        assert_eq!(texture.pixel(1, 1), Some(&[70, 60, 50, 80][..]));
    }

    #[test]
    fn paletted_rows_are_padded() {
        let palette = [[255, 0, 0, 0], [0, 255, 0, 0], [0, 0, 255, 0]];
        // 3 pixels per row, padded to 4 bytes
        let bytes = container(3, 2, 8, &palette, |y| {
            if y == 0 {
                vec![0, 1, 2]
            } else {
                vec![2, 2, 2]
            }
        });

        let texture = decode(&bytes).unwrap();
        assert_eq!(texture.components, 3);
        assert_eq!(texture.data.len(), 3 * 2 * 3);
        // stored row 0 is the bottom row
        assert_eq!(texture.pixel(0, 1), Some(&[0, 0, 255][..]));
        assert_eq!(texture.pixel(1, 1), Some(&[0, 255, 0][..]));
        assert_eq!(texture.pixel(2, 1), Some(&[255, 0, 0][..]));
        assert_eq!(texture.pixel(0, 0), Some(&[255, 0, 0][..]));
    }

    #[test]
    fn palette_index_out_of_range() {
        let bytes = container(1, 1, 8, &[[0, 0, 0, 0]], |_| vec![5]);
        assert!(matches!(decode(&bytes), Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn unsupported_bit_depth() {
        let bytes = container(4, 1, 16, &[], |_| vec![0; 8]);
        assert!(matches!(decode(&bytes), Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn missing_signature() {
        let mut bytes = container(1, 1, 24, &[], |_| vec![0; 3]);
        bytes[PREFIX] = b'X';
        assert!(matches!(decode(&bytes), Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn truncated_pixels() {
        let mut bytes = container(4, 4, 24, &[], |_| vec![0; 12]);
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(decode(&bytes), Err(Error::TruncatedInput { .. })));
    }
}
