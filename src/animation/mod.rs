//! Animation evaluator (spec §4.3, component E).
//!
//! An animated parameter is a sorted list of `AnimKeyFrame*` nodes
//! (component E's "keyframe") plus a cursor remembering the last bucket a
//! sample landed in, so forward playback is O(1) amortized instead of a
//! full rescan every frame (spec §4.3 "Interpolation": "search resumes from
//! a cached cursor ... on miss, restart from 0").
//!
//! [`easing`] holds the interpolation function menu; this module holds the
//! keyframe-list walk that calls into it.

pub mod easing;

use crate::node::kinds::anim::AnimKeyFrame;
use crate::node::{Node, NodeHandle, NodeKind};

fn as_keyframe(node: &Node) -> Option<&AnimKeyFrame> {
    match &node.kind {
        NodeKind::AnimKeyFrameScalar(k)
        | NodeKind::AnimKeyFrameVec2(k)
        | NodeKind::AnimKeyFrameVec3(k)
        | NodeKind::AnimKeyFrameVec4(k) => Some(k),
        _ => None,
    }
}

fn kf_time(h: &NodeHandle) -> f64 {
    as_keyframe(&h.borrow()).expect("animkf slot holds a non-keyframe node").time
}

fn kf_value(h: &NodeHandle) -> [f32; 4] {
    as_keyframe(&h.borrow()).expect("animkf slot holds a non-keyframe node").value
}

fn kf_easing(h: &NodeHandle) -> easing::Easing {
    as_keyframe(&h.borrow()).expect("animkf slot holds a non-keyframe node").easing
}

/// Samples `keyframes` (assumed sorted ascending by `time`, spec §3.5/§4.3)
/// at `t`, resuming the search from `*cursor` and updating it in place.
///
/// Component-wise `mix` is computed as `a + (b - a) * r` so that an exact
/// keyframe-boundary hit (`r == 0.0` or `r == 1.0`) reproduces the boundary
/// value bit-for-bit (spec §8.2).
#[must_use]
pub fn sample(keyframes: &[NodeHandle], cursor: &mut usize, t: f64) -> [f32; 4] {
    let n = keyframes.len();
    assert!(n > 0, "sample called with no keyframes");
    if n == 1 || t <= kf_time(&keyframes[0]) {
        *cursor = 0;
        return kf_value(&keyframes[0]);
    }
    if t >= kf_time(&keyframes[n - 1]) {
        *cursor = n - 2;
        return kf_value(&keyframes[n - 1]);
    }

    let bucket_holds = |i: usize, t: f64| kf_time(&keyframes[i]) <= t && t < kf_time(&keyframes[i + 1]);

    let mut i = (*cursor).min(n - 2);
    if !bucket_holds(i, t) {
        i = 0;
        while i + 1 < n - 1 && !bucket_holds(i, t) {
            i += 1;
        }
    }
    *cursor = i;

    let t0 = kf_time(&keyframes[i]);
    let t1 = kf_time(&keyframes[i + 1]);
    let u = (t - t0) / (t1 - t0);
    let r = kf_easing(&keyframes[i]).apply(u);

    let v0 = kf_value(&keyframes[i]);
    let v1 = kf_value(&keyframes[i + 1]);
    let mut out = [0.0f32; 4];
    for c in 0..4 {
        let a = f64::from(v0[c]);
        let b = f64::from(v1[c]);
        out[c] = (a + (b - a) * r) as f32;
    }
    out
}

/// Convenience wrapper returning just the scalar (component 0) channel.
#[must_use]
pub fn sample_scalar(keyframes: &[NodeHandle], cursor: &mut usize, t: f64) -> f64 {
    f64::from(sample(keyframes, cursor, t)[0])
}

/// Resolves `t` from a monotonic time-remap keyframe list (spec §4.3's
/// "resolution", used by the media node to remap playback time — spec §3.5
/// restricts these lists to `linear` easing, which is always invertible).
#[must_use]
pub fn resolve_time(keyframes: &[NodeHandle], cursor: &mut usize, t: f64) -> f64 {
    if keyframes.is_empty() {
        return t;
    }
    sample_scalar(keyframes, cursor, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::factory;

    #[test]
    fn boundary_hits_are_bit_exact() {
        let kfs = vec![
            factory::anim_keyframe_scalar(0.0, 0.0, easing::Easing::parse("quadratic_in_out").unwrap()),
            factory::anim_keyframe_scalar(2.0, 10.0, easing::Easing::linear()),
            factory::anim_keyframe_scalar(4.0, -3.0, easing::Easing::linear()),
        ];
        let mut cursor = 0;
        assert_eq!(sample(&kfs, &mut cursor, 0.0)[0], 0.0);
        assert_eq!(sample(&kfs, &mut cursor, 2.0)[0], 10.0);
        assert_eq!(sample(&kfs, &mut cursor, 4.0)[0], -3.0);
    }

    #[test]
    fn clamps_before_first_and_after_last() {
        let kfs = vec![
            factory::anim_keyframe_scalar(1.0, 5.0, easing::Easing::linear()),
            factory::anim_keyframe_scalar(3.0, 9.0, easing::Easing::linear()),
        ];
        let mut cursor = 0;
        assert_eq!(sample(&kfs, &mut cursor, -1.0)[0], 5.0);
        assert_eq!(sample(&kfs, &mut cursor, 30.0)[0], 9.0);
    }

    #[test]
    fn linear_midpoint_is_the_average() {
        let kfs = vec![
            factory::anim_keyframe_scalar(0.0, 0.0, easing::Easing::linear()),
            factory::anim_keyframe_scalar(2.0, 10.0, easing::Easing::linear()),
        ];
        let mut cursor = 0;
        let v = sample(&kfs, &mut cursor, 0.5)[0];
        assert!((f64::from(v) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn cursor_resumes_forward_and_restarts_on_seek_backward() {
        let kfs = vec![
            factory::anim_keyframe_scalar(0.0, 0.0, easing::Easing::linear()),
            factory::anim_keyframe_scalar(1.0, 1.0, easing::Easing::linear()),
            factory::anim_keyframe_scalar(2.0, 2.0, easing::Easing::linear()),
            factory::anim_keyframe_scalar(3.0, 3.0, easing::Easing::linear()),
        ];
        let mut cursor = 0;
        sample(&kfs, &mut cursor, 2.5);
        assert_eq!(cursor, 2);
        // Seeking backward must not find the wrong bucket by luck: restart.
        let v = sample(&kfs, &mut cursor, 0.5);
        assert_eq!(cursor, 0);
        assert!((f64::from(v) - 0.5).abs() < 1e-6);
    }
}
