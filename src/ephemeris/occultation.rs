//! Binary occultation test
//!
//! No penumbra: a target is either visible or hidden, judged from its
//! center only.

use crate::math::angle_between;
use nalgebra::Vector3;

/// Whether the occulting sphere hides the center of `target` from `observer`
///
/// All positions must share an origin and a frame. The target is hidden
/// when the occulter is nearer than the target and the angle between the
/// two directions is smaller than the occulter's apparent angular radius.
pub fn is_occulted(
    observer: &Vector3<f64>,
    target: &Vector3<f64>,
    occulter: &Vector3<f64>,
    occulter_radius: f64,
) -> bool {
    let to_target = target - observer;
    let to_occulter = occulter - observer;
    let occulter_distance = to_occulter.norm();

    if occulter_distance <= occulter_radius {
        // Observer inside the occulting body
        return true;
    }
    if occulter_distance >= to_target.norm() {
        return false;
    }

    let apparent_radius = (occulter_radius / occulter_distance).asin();
    angle_between(&to_target, &to_occulter) < apparent_radius
}
