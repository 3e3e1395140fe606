use glam::Vec3;
use mu_binary::Reader;

use crate::{open, Error, Header, Result};

const FORMAT: &str = "obj";

/// A static object placed on the terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPlacement {
    /// Index into the map's object model table.
    pub kind: i16,
    pub position: Vec3,
    /// Euler angles in degrees.
    pub angle: Vec3,
    /// Uniform scale, 1.0 in version 0 containers which don't store it.
    pub scale: f32,
}

impl ObjectPlacement {
    fn read(reader: &mut Reader, header: Header) -> Result<Self> {
        let kind = reader.read_i16()?;
        let position = reader.read_vec3()?;
        let angle = reader.read_vec3()?;
        let scale = if header.is_extended() {
            reader.read_f32()?
        } else {
            1.0
        };

        Ok(Self {
            kind,
            position,
            angle,
            scale,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectList {
    pub header: Header,
    pub objects: Vec<ObjectPlacement>,
}

impl ObjectList {
    /// Decodes an object list from the raw contents of an `obj` file.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the count is negative or the records run past the end of the data.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (header, body) = open(FORMAT, bytes)?;
        let mut reader = Reader::new(&body);

        let count = reader.read_i16()?;
        let count = usize::try_from(count).map_err(|_| {
            Error::invalid(FORMAT, format!("negative object count {count}"))
        })?;

        let objects = (0..count)
            .map(|_| ObjectPlacement::read(&mut reader, header))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { header, objects })
    }

    /// Placements of a single object kind.
    pub fn of_kind(&self, kind: i16) -> impl Iterator<Item = &ObjectPlacement> {
        self.objects.iter().filter(move |object| object.kind == kind)
    }
}
