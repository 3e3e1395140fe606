#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Decoder for `bmd` skeletal models.
//!
//! Layout of a model container:
//!
//! ```text
//! "BMD" u8 version
//! [u32 length, ciphertext]   only for encrypted versions
//! name[32] i16 meshes i16 bones i16 actions
//! meshes, actions, bones
//! ```
//!
//! Bones carry one matrix per action, so actions are decoded before bones even
//! though the header lists bones first.

mod mesh;
mod skeleton;

#[cfg(test)]
mod tests;

pub use mesh::{Mesh, Normal, TexCoord, Triangle, Vertex};
pub use mu_binary::{Error, Result};
pub use skeleton::{euler_to_quat, Action, Bone, BoneMatrix, BoneNode};

use itertools::Itertools;
use mu_binary::Reader;
use tracing::debug;

pub const MAGIC: &[u8; 3] = b"BMD";
pub const EXTENSION: &str = "bmd";

pub(crate) const FORMAT: &str = "bmd";
pub(crate) const NAME_LENGTH: usize = 32;

const MIN_LENGTH: usize = 8;
const BODY_OFFSET: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub version: u8,
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub bones: Vec<Bone>,
    pub actions: Vec<Action>,
}

impl Model {
    /// Decodes a model from the raw contents of a `bmd` file.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the magic or size is invalid, or if any array runs past the end of the data.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_LENGTH {
            return Err(Error::invalid(
                FORMAT,
                format!("file is {} bytes, expected at least {MIN_LENGTH}", bytes.len()),
            ));
        }

        if &bytes[..3] != MAGIC {
            return Err(Error::invalid(
                FORMAT,
                format!("invalid signature `{}`", bytes[..3].escape_ascii()),
            ));
        }

        let version = bytes[3];
        let body = mu_crypt::open_body(bytes, version, BODY_OFFSET)?;
        let mut reader = Reader::new(&body);

        let name = reader.read_fixed_string(NAME_LENGTH)?;
        let mesh_count = reader.read_i16()?;
        let bone_count = reader.read_i16()?;
        let action_count = reader.read_i16()?;

        debug!(
            version,
            %name,
            mesh_count,
            bone_count,
            action_count,
            "decoding model"
        );

        let meshes = (0..mesh_count)
            .map(|_| Mesh::read(&mut reader))
            .collect::<Result<Vec<_>>>()?;

        let actions = (0..action_count)
            .map(|_| Action::read(&mut reader))
            .collect::<Result<Vec<_>>>()?;

        let bones = (0..bone_count)
            .map(|_| Bone::read(&mut reader, &actions))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            version,
            name,
            meshes,
            bones,
            actions,
        })
    }

    /// Sets the playback speed of an action. Has no effect if the action doesn't exist.
    pub fn set_play_speed(&mut self, action: usize, play_speed: f32) {
        if let Some(action) = self.actions.get_mut(action) {
            action.play_speed = play_speed;
        }
    }

    /// Distinct texture paths referenced by the meshes, in first-use order.
    pub fn texture_paths(&self) -> impl Iterator<Item = &str> {
        self.meshes
            .iter()
            .map(|mesh| mesh.texture_path.as_str())
            .filter(|path| !path.is_empty())
            .unique()
    }

    /// Bones that carry data, with their indices.
    pub fn real_bones(&self) -> impl Iterator<Item = (usize, &BoneNode)> {
        self.bones
            .iter()
            .enumerate()
            .filter_map(|(i, bone)| bone.node().map(|node| (i, node)))
    }

    #[must_use]
    pub fn bone_by_name(&self, name: &str) -> Option<(usize, &BoneNode)> {
        self.real_bones()
            .find(|(_, node)| node.name.eq_ignore_ascii_case(name))
    }
}
