//! Vector and quaternion helpers
//!
//! Linear algebra itself comes from `nalgebra`; this module adds the few
//! operations the orbital code needs on top of it: guarded normalization,
//! angle wrapping, and rotations by raw (not necessarily unit) quaternions.

pub mod lagrange;

use crate::error::{Error, Result};
use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};
use std::f64::consts::TAU;

/// Magnitudes below this are treated as zero when normalizing
pub const ZERO_TOLERANCE: f64 = 1e-12;

/// Wrap an angle into [0, 2π)
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can return TAU itself for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Unit vector along `v`, or an error for a zero-length vector
pub fn unit(v: &Vector3<f64>) -> Result<Vector3<f64>> {
    let norm = v.norm();
    if norm < ZERO_TOLERANCE {
        return Err(Error::out_of_range("cannot normalize a zero-length vector"));
    }
    Ok(v / norm)
}

/// Angle between two vectors in [0, π]; zero if either vector is degenerate
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let denom = a.norm() * b.norm();
    if denom < ZERO_TOLERANCE {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Build a quaternion from a scalar part and a vector part
///
/// The result is not normalized.
pub fn quaternion_from_parts(w: f64, v: &Vector3<f64>) -> Quaternion<f64> {
    Quaternion::new(w, v.x, v.y, v.z)
}

/// Build a rotation quaternion of `angle` radians about `axis`
///
/// The axis is used as given; pass a unit axis for a unit quaternion.
pub fn quaternion_from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Quaternion<f64> {
    let half = 0.5 * angle;
    quaternion_from_parts(half.cos(), &(axis * half.sin()))
}

/// Rotate `v` by `q` as `q v q*`
///
/// Only a unit quaternion yields a pure rotation.
pub fn rotate(v: &Vector3<f64>, q: &Quaternion<f64>) -> Vector3<f64> {
    let p = quaternion_from_parts(0.0, v);
    let rotated = q * p * q.conjugate();
    rotated.imag()
}

/// Elementary rotation about Z that maps reference coordinates into a frame
/// turned by `angle` about the shared Z axis
pub fn frame_rotation_z(angle: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -angle)
}

/// Elementary rotation about X that maps reference coordinates into a frame
/// turned by `angle` about the shared X axis
pub fn frame_rotation_x(angle: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -angle)
}

/// Rotation taking body axis `from` onto direction `to`
///
/// Antiparallel inputs fall back to a half turn about an axis orthogonal to `from`.
pub fn rotation_between(from: &Vector3<f64>, to: &Vector3<f64>) -> Result<UnitQuaternion<f64>> {
    let from = unit(from)?;
    let to = unit(to)?;
    if let Some(q) = UnitQuaternion::rotation_between(&from, &to) {
        return Ok(q);
    }
    let helper = if from.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let axis = Unit::new_normalize(from.cross(&helper));
    Ok(UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI))
}
