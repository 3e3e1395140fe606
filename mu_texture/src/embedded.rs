//! Containers wrapping a standard image stream.

use image::{DynamicImage, ImageFormat};

use crate::{strip_prefix, Error, Result, TextureAsset};

const JPEG_PREFIX: usize = 24;
const PNG_PREFIX: usize = 4;
const TGA_PREFIX: usize = 4;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

pub fn decode_jpeg(bytes: &[u8]) -> Result<TextureAsset> {
    let stream = strip_prefix(bytes, JPEG_PREFIX)?;
    if !stream.starts_with(&JPEG_SOI) {
        return Err(Error::invalid("ozj", "embedded stream is not a jpeg"));
    }

    decode_stream("ozj", stream, ImageFormat::Jpeg)
}

pub fn decode_png(bytes: &[u8]) -> Result<TextureAsset> {
    decode_stream("ozp", strip_prefix(bytes, PNG_PREFIX)?, ImageFormat::Png)
}

pub fn decode_tga(bytes: &[u8]) -> Result<TextureAsset> {
    decode_stream("ozt", strip_prefix(bytes, TGA_PREFIX)?, ImageFormat::Tga)
}

fn decode_stream(
    format: &'static str,
    stream: &[u8],
    image_format: ImageFormat,
) -> Result<TextureAsset> {
    let image = image::load_from_memory_with_format(stream, image_format)
        .map_err(|err| Error::invalid(format, err.to_string()))?;

    Ok(normalize(image))
}

/// Converts any decoded image to interleaved 8-bit RGB or RGBA.
fn normalize(image: DynamicImage) -> TextureAsset {
    let (width, height) = (image.width(), image.height());

    let (components, data) = if image.color().has_alpha() {
        (4, image.into_rgba8().into_raw())
    } else {
        (3, image.into_rgb8().into_raw())
    };

    TextureAsset {
        width,
        height,
        components,
        compression: None,
        mip_levels: 1,
        data,
    }
}
