use glam::{Quat, Vec3};
use mu_binary::{Reader, Result};

use crate::NAME_LENGTH;

/// Converts euler angles in radians to a unit quaternion.
///
/// The half-angle composition matches Blender's `XYZ` euler order.
#[must_use]
pub fn euler_to_quat(euler: Vec3) -> Quat {
    let (sx, cx) = (euler.x * 0.5).sin_cos();
    let (sy, cy) = (euler.y * 0.5).sin_cos();
    let (sz, cz) = (euler.z * 0.5).sin_cos();

    Quat::from_xyzw(
        sx * cy * cz - cx * sy * sz,
        cx * sy * cz + sx * cy * sz,
        cx * cy * sz - sx * sy * cz,
        cx * cy * cz + sx * sy * sz,
    )
    .normalize()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub key_count: usize,
    /// Root positions are stored explicitly instead of derived from the bones.
    pub lock_positions: bool,
    /// Present only when `lock_positions` is set.
    pub positions: Option<Vec<Vec3>>,
    /// Playback speed multiplier, not stored in the file.
    pub play_speed: f32,
}

impl Action {
    pub(crate) fn read(reader: &mut Reader) -> Result<Self> {
        let key_count = reader.read_i16()?;
        let lock_positions = reader.read_bool()?;

        let positions = if lock_positions {
            Some(reader.read_records(key_count)?)
        } else {
            None
        };

        Ok(Self {
            key_count: usize::try_from(key_count).unwrap_or_default(),
            lock_positions,
            positions,
            play_speed: 1.0,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Bone {
    /// Placeholder keeping the indices of the following bones aligned.
    Dummy,
    Node(BoneNode),
}

impl Bone {
    pub(crate) fn read(reader: &mut Reader, actions: &[Action]) -> Result<Self> {
        if reader.read_bool()? {
            return Ok(Self::Dummy);
        }

        let name = reader.read_fixed_string(NAME_LENGTH)?;
        let parent = reader.read_i16()?;

        let matrices = actions
            .iter()
            .map(|action| BoneMatrix::read(reader, action.key_count))
            .collect::<Result<_>>()?;

        Ok(Self::Node(BoneNode {
            name,
            parent,
            matrices,
        }))
    }

    #[must_use]
    pub fn is_dummy(&self) -> bool {
        matches!(self, Self::Dummy)
    }

    #[must_use]
    pub fn node(&self) -> Option<&BoneNode> {
        match self {
            Self::Dummy => None,
            Self::Node(node) => Some(node),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneNode {
    pub name: String,
    /// Raw parent index, negative for root bones.
    pub parent: i16,
    /// One matrix per action of the model.
    pub matrices: Vec<BoneMatrix>,
}

impl BoneNode {
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        usize::try_from(self.parent).ok()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent < 0
    }
}

/// Per-action animation keys of a bone.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneMatrix {
    pub positions: Vec<Vec3>,
    /// Euler angles in radians.
    pub rotations: Vec<Vec3>,
    /// Derived from `rotations` at decode time.
    pub quaternions: Vec<Quat>,
}

impl BoneMatrix {
    fn read(reader: &mut Reader, key_count: usize) -> Result<Self> {
        let count = i64::try_from(key_count).unwrap_or(i64::MAX);
        let positions: Vec<Vec3> = reader.read_records(count)?;
        let rotations: Vec<Vec3> = reader.read_records(count)?;
        let quaternions = rotations.iter().copied().map(euler_to_quat).collect();

        Ok(Self {
            positions,
            rotations,
            quaternions,
        })
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        self.rotations.len()
    }
}
