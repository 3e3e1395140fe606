use mu_binary::Reader;
use mu_texture::TextureAsset;

use crate::{open, Error, Grid, Header, Result, CELL_COUNT, TERRAIN_SIZE};

const FORMAT: &str = "map";

/// World units per height sample step.
pub const HEIGHT_SCALE: f32 = 1.5;

/// Texture layers and blending of every terrain cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMapping {
    pub header: Header,
    /// Index of the base tile texture.
    pub layer1: Grid<u8>,
    /// Index of the tile texture blended over the base.
    pub layer2: Grid<u8>,
    /// Blend weight of `layer2`, in `0.0..=1.0`.
    pub alpha: Grid<f32>,
    /// Only present from version 1 on.
    pub height: Option<TerrainHeight>,
}

impl TerrainMapping {
    /// Decodes a mapping from the raw contents of a `map` file.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any of the grids is shorter than a full terrain.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (header, body) = open(FORMAT, bytes)?;
        let mut reader = Reader::new(&body);

        let layer1 = read_byte_grid(&mut reader)?;
        let layer2 = read_byte_grid(&mut reader)?;
        let alpha = read_byte_grid(&mut reader)?.map(|&a| f32::from(a) / 255.0);

        let height = if header.is_extended() {
            let samples = read_byte_grid(&mut reader)?;
            Some(TerrainHeight {
                heights: samples.map(|&h| f32::from(h) * HEIGHT_SCALE),
            })
        } else {
            None
        };

        Ok(Self {
            header,
            layer1,
            layer2,
            alpha,
            height,
        })
    }
}

/// Ground height of every terrain cell, in world units.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainHeight {
    pub heights: Grid<f32>,
}

impl TerrainHeight {
    /// Builds heights from a decoded height bitmap, using its first channel.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the texture is block compressed or not exactly one terrain in size.
    pub fn from_texture(texture: &TextureAsset) -> Result<Self> {
        if texture.is_compressed() {
            return Err(Error::invalid(FORMAT, "height texture is block compressed"));
        }

        if texture.width as usize != TERRAIN_SIZE || texture.height as usize != TERRAIN_SIZE {
            return Err(Error::invalid(
                FORMAT,
                format!(
                    "height texture is {}x{}, expected {TERRAIN_SIZE}x{TERRAIN_SIZE}",
                    texture.width, texture.height
                ),
            ));
        }

        let heights = texture
            .data
            .chunks_exact(usize::from(texture.components))
            .map(|pixel| f32::from(pixel[0]) * HEIGHT_SCALE)
            .collect();

        let heights = Grid::from_cells(heights)
            .ok_or_else(|| Error::invalid(FORMAT, "height texture data is incomplete"))?;

        Ok(Self { heights })
    }

    #[must_use]
    pub fn at(&self, x: usize, y: usize) -> Option<f32> {
        self.heights.get(x, y).copied()
    }
}

fn read_byte_grid(reader: &mut Reader) -> Result<Grid<u8>> {
    let cells = reader.read_bytes(CELL_COUNT)?.to_vec();
    Grid::from_cells(cells).ok_or_else(|| Error::invalid(FORMAT, "incomplete grid"))
}
