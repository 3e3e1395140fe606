#![allow(clippy::approx_constant)]

use std::f32::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use glam::{EulerRot, Quat, Vec3};

use mu_binary::{Reader, Record};

use super::*;

fn quat_to_euler(q: Quat) -> Vec3 {
    let (z, y, x) = q.to_euler(EulerRot::ZYX);
    Vec3::new(x, y, z)
}

/// Tests that euler to quat conversion is identical to Blender
#[test]
fn euler_to_quat_conversion_blender_compatible() {
    assert_relative_eq!(
        euler_to_quat(Vec3::new(1.442_919_9, -0.457_030_3, 0.202_343_17)),
        Quat::from_xyzw(0.657_201, -0.104_246, 0.222_718, 0.712_472),
        epsilon = 0.01,
    );

    assert_relative_eq!(
        euler_to_quat(Vec3::new(1.570_796_1, 0.0, -1.570_776_7)),
        Quat::from_xyzw(0.500_005, -0.499_995, -0.499_995, 0.500_005),
        epsilon = 0.01,
    );
}

#[test]
fn single_axis_rotations() {
    assert_relative_eq!(
        euler_to_quat(Vec3::new(FRAC_PI_2, 0.0, 0.0)),
        Quat::from_rotation_x(FRAC_PI_2),
        epsilon = 1e-6,
    );
    assert_relative_eq!(
        euler_to_quat(Vec3::new(0.0, 0.0, -0.3)),
        Quat::from_rotation_z(-0.3),
        epsilon = 1e-6,
    );
}

#[test]
fn quat_euler_conversion_consistency() {
    let original = Quat::from_xyzw(0.657_201, -0.104_246, 0.222_718, 0.712_472).normalize();
    let converted = euler_to_quat(quat_to_euler(original));

    assert_relative_eq!(original, converted, epsilon = 1e-5);
}

#[test]
fn derived_quaternions_are_unit_length() {
    for i in 0..200 {
        let f = i as f32;
        let euler = Vec3::new(f * 0.37 - 20.0, f * -1.13 + 7.0, f * 2.71);
        assert_relative_eq!(euler_to_quat(euler).length(), 1.0, epsilon = 1e-5);
    }
}

fn triangle_bytes(polygon: u8) -> Vec<u8> {
    let mut bytes = vec![polygon, 0];
    for i in 0..12_i16 {
        bytes.extend_from_slice(&i.to_le_bytes());
    }
    bytes.extend_from_slice(&[0xAA; 2]);
    for i in 0..8 {
        bytes.extend_from_slice(&(i as f32 * 0.5).to_le_bytes());
    }
    bytes.extend_from_slice(&7_i16.to_le_bytes());
    bytes.extend_from_slice(&[0xAA; 2]);
    bytes
}

#[test]
fn triangle_record_layout() {
    let bytes = triangle_bytes(3);
    assert_eq!(bytes.len(), Triangle::SIZE);

    let mut reader = Reader::new(&bytes);
    let triangle: Triangle = reader.read_record().unwrap();

    assert!(reader.is_empty());
    assert_eq!(triangle.vertices(), &[0, 1, 2]);
    assert_eq!(triangle.normal_indices, [4, 5, 6, 7]);
    assert_eq!(triangle.tex_coords(), &[8, 9, 10]);
    assert_eq!(triangle.light_map_coords[0], glam::Vec2::new(0.0, 0.5));
    assert_eq!(triangle.light_map_coords[3], glam::Vec2::new(3.0, 3.5));
    assert_eq!(triangle.light_map_index, 7);
}

#[test]
fn five_sided_polygon_is_invalid() {
    let bytes = triangle_bytes(5);
    let mut reader = Reader::new(&bytes);
    assert!(matches!(
        reader.read_record::<Triangle>(),
        Err(Error::InvalidFormat { .. })
    ));
}
