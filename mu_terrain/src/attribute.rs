use bitflags::bitflags;
use mu_binary::Reader;

use crate::{open, Error, Grid, Header, Result, CELL_COUNT};

const FORMAT: &str = "att";

bitflags! {
    /// Walkability and behavior flags of a terrain cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeFlags: u16 {
        const SAFE_ZONE = 0x01;
        const CHARACTER = 0x02;
        const NO_MOVE = 0x04;
        const NO_GROUND = 0x08;
        const WATER = 0x10;
        const ACTION = 0x20;
        const HEIGHT = 0x40;
        const CAMERA_UP = 0x80;
        const NO_ATTACK = 0x100;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainAttribute {
    pub header: Header,
    pub cells: Grid<AttributeFlags>,
}

impl TerrainAttribute {
    /// Decodes an attribute grid from the raw contents of an `att` file.
    ///
    /// Version 0 stores one byte per cell, later versions a u16.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the grid is shorter than a full terrain.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (header, body) = open(FORMAT, bytes)?;
        let mut reader = Reader::new(&body);

        let cells: Vec<AttributeFlags> = if header.is_extended() {
            reader
                .read_records::<u16>(CELL_COUNT as i64)?
                .into_iter()
                .map(AttributeFlags::from_bits_retain)
                .collect()
        } else {
            reader
                .read_bytes(CELL_COUNT)?
                .iter()
                .map(|&bits| AttributeFlags::from_bits_retain(u16::from(bits)))
                .collect()
        };

        let cells = Grid::from_cells(cells)
            .ok_or_else(|| Error::invalid(FORMAT, "incomplete grid"))?;

        Ok(Self { header, cells })
    }

    #[must_use]
    pub fn flags(&self, x: usize, y: usize) -> AttributeFlags {
        self.cells.get(x, y).copied().unwrap_or_default()
    }

    /// Whether a character can stand on the cell at `x`, `y`.
    #[must_use]
    pub fn is_walkable(&self, x: usize, y: usize) -> bool {
        match self.cells.get(x, y) {
            Some(flags) => !flags.intersects(AttributeFlags::NO_MOVE | AttributeFlags::NO_GROUND),
            None => false,
        }
    }

    #[must_use]
    pub fn is_safe_zone(&self, x: usize, y: usize) -> bool {
        self.flags(x, y).contains(AttributeFlags::SAFE_ZONE)
    }
}
