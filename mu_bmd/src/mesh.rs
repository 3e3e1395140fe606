use glam::{Vec2, Vec3};
use mu_binary::{Error, Reader, Record, Result};

use crate::{FORMAT, NAME_LENGTH};

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub texture: i16,
    pub texture_path: String,
    pub vertices: Vec<Vertex>,
    pub normals: Vec<Normal>,
    pub tex_coords: Vec<TexCoord>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub(crate) fn read(reader: &mut Reader) -> Result<Self> {
        let vertex_count = reader.read_i16()?;
        let normal_count = reader.read_i16()?;
        let tex_coord_count = reader.read_i16()?;
        let triangle_count = reader.read_i16()?;
        let texture = reader.read_i16()?;

        let vertices = reader.read_records(vertex_count)?;
        let normals = reader.read_records(normal_count)?;
        let tex_coords = reader.read_records(tex_coord_count)?;
        let triangles = reader.read_records(triangle_count)?;
        let texture_path = reader.read_fixed_string(NAME_LENGTH)?;

        Ok(Self {
            texture,
            texture_path,
            vertices,
            normals,
            tex_coords,
            triangles,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Index of the bone this vertex is attached to.
    pub node: i16,
    pub position: Vec3,
}

impl Record for Vertex {
    const SIZE: usize = 16;

    fn read(reader: &mut Reader) -> Result<Self> {
        let node = reader.read_i16()?;
        reader.skip(2)?;
        let position = reader.read_vec3()?;

        Ok(Self { node, position })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    pub node: i16,
    pub normal: Vec3,
    pub bind_vertex: i16,
}

impl Record for Normal {
    const SIZE: usize = 20;

    fn read(reader: &mut Reader) -> Result<Self> {
        let node = reader.read_i16()?;
        reader.skip(2)?;
        let normal = reader.read_vec3()?;
        let bind_vertex = reader.read_i16()?;
        reader.skip(2)?;

        Ok(Self {
            node,
            normal,
            bind_vertex,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
}

impl Record for TexCoord {
    const SIZE: usize = 8;

    fn read(reader: &mut Reader) -> Result<Self> {
        Ok(Self {
            u: reader.read_f32()?,
            v: reader.read_f32()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// 3 for triangles, 4 for quads.
    pub polygon: u8,
    pub vertex_indices: [i16; 4],
    pub normal_indices: [i16; 4],
    pub tex_coord_indices: [i16; 4],
    pub light_map_coords: [Vec2; 4],
    pub light_map_index: i16,
}

impl Triangle {
    /// The vertex indices actually used by this polygon.
    #[must_use]
    pub fn vertices(&self) -> &[i16] {
        &self.vertex_indices[..usize::from(self.polygon)]
    }

    #[must_use]
    pub fn normals(&self) -> &[i16] {
        &self.normal_indices[..usize::from(self.polygon)]
    }

    #[must_use]
    pub fn tex_coords(&self) -> &[i16] {
        &self.tex_coord_indices[..usize::from(self.polygon)]
    }
}

fn read_indices(reader: &mut Reader) -> Result<[i16; 4]> {
    Ok([
        reader.read_i16()?,
        reader.read_i16()?,
        reader.read_i16()?,
        reader.read_i16()?,
    ])
}

impl Record for Triangle {
    const SIZE: usize = 64;

    fn read(reader: &mut Reader) -> Result<Self> {
        let offset = reader.position();
        let polygon = reader.read_u8()?;
        if !matches!(polygon, 3 | 4) {
            return Err(Error::invalid(
                FORMAT,
                format!("polygon at offset {offset} has {polygon} sides"),
            ));
        }
        reader.skip(1)?;

        let vertex_indices = read_indices(reader)?;
        let normal_indices = read_indices(reader)?;
        let tex_coord_indices = read_indices(reader)?;

        // floats are 4-byte aligned
        reader.skip(2)?;
        let mut light_map_coords = [Vec2::ZERO; 4];
        for coord in &mut light_map_coords {
            *coord = Vec2::new(reader.read_f32()?, reader.read_f32()?);
        }

        let light_map_index = reader.read_i16()?;
        reader.skip(2)?;

        Ok(Self {
            polygon,
            vertex_indices,
            normal_indices,
            tex_coord_indices,
            light_map_coords,
            light_map_index,
        })
    }
}
