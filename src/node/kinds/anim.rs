//! Animation keyframe node kinds (spec §3.5, §6.3 "Animation").
//!
//! `AnimKeyFrameScalar/Vec2/Vec3/Vec4` all share one representation — a
//! `[f32; 4]` value slot with a `dim` tag for how many components are
//! meaningful — mirroring the original engine's single `float value[4]`
//! keyframe field (`original_source/nodes.h`'s `animkeyframe`) rather than
//! four separate Rust structs that would just duplicate each other.

use crate::animation::easing::Easing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyframeDim {
    Scalar = 1,
    Vec2 = 2,
    Vec3 = 3,
    Vec4 = 4,
}

#[derive(Debug, Clone)]
pub struct AnimKeyFrame {
    pub time: f64,
    pub value: [f32; 4],
    pub dim: KeyframeDim,
    pub easing: Easing,
}

impl AnimKeyFrame {
    #[must_use]
    pub fn value_slice(&self) -> &[f32] {
        &self.value[..self.dim as usize]
    }
}
