//! Transform chain (spec §4.6, component G).
//!
//! `Identity`/`Translate`/`Rotate`/`Scale` each compute a local 4×4 matrix
//! (animated or constant), left-multiply it onto the parent's modelview,
//! write the result into `child.modelview_matrix`, forward
//! `projection_matrix` unchanged, and recurse into the child's own update.
//! Camera eye/center/up control points are three separate chains of exactly
//! this shape, each terminated by an `Identity` leaf whose accumulated
//! modelview *is* the control point (spec §4.6).

use crate::animation;
use crate::errors::{EngineError, Result};
use crate::node::kinds::structural::{Rotate, Scale, Translate};
use crate::node::{NodeHandle, NodeKind};
use glam::{Mat4, Vec3};

fn sample_or(anim: &[NodeHandle], cursor: &mut usize, t: f64, constant: [f32; 3]) -> Vec3 {
    if anim.is_empty() {
        Vec3::from(constant)
    } else {
        let v = animation::sample(anim, cursor, t);
        Vec3::new(v[0], v[1], v[2])
    }
}

fn translate_local(tr: &mut Translate, t: f64) -> Mat4 {
    let v = sample_or(&tr.anim, &mut tr.cursor, t, tr.vector);
    Mat4::from_translation(v)
}

fn rotate_local(r: &mut Rotate, t: f64) -> Mat4 {
    let angle_deg = if r.anim.is_empty() {
        r.angle_deg
    } else {
        animation::sample_scalar(&r.anim, &mut r.cursor, t)
    };
    let axis = Vec3::from(r.axis).normalize_or_zero();
    let anchor = Vec3::from(r.anchor);
    let spin = Mat4::from_axis_angle(axis, (angle_deg as f32).to_radians());
    Mat4::from_translation(anchor) * spin * Mat4::from_translation(-anchor)
}

fn scale_local(s: &mut Scale, t: f64) -> Mat4 {
    let factors = sample_or(&s.anim, &mut s.cursor, t, s.factors);
    let anchor = Vec3::from(s.anchor);
    Mat4::from_translation(anchor) * Mat4::from_scale(factors) * Mat4::from_translation(-anchor)
}

/// Computes `node`'s local matrix for this frame, composes it onto the
/// already-propagated `node.modelview_matrix`/`node.projection_matrix`,
/// writes the result into the single child reached through this kind, and
/// returns that child so the caller can recurse into its `update`.
///
/// Returns `Ok(None)` for `Identity` with no child (a dangling camera
/// control leaf) and for any non-transform kind (the caller shouldn't be
/// invoking this on one — see the `Unsupported` error below instead of a
/// silent no-op, since that would hide a configuration error).
pub fn propagate(node: &NodeHandle, t: f64) -> Result<Option<NodeHandle>> {
    let (parent_mv, proj) = {
        let n = node.borrow();
        (n.modelview_matrix, n.projection_matrix)
    };
    let mut n = node.borrow_mut();
    let (local, child) = match &mut n.kind {
        NodeKind::Identity(i) => (Mat4::IDENTITY, i.child.clone()),
        NodeKind::Translate(tr) => (translate_local(tr, t), Some(tr.child.clone())),
        NodeKind::Rotate(r) => (rotate_local(r, t), Some(r.child.clone())),
        NodeKind::Scale(s) => (scale_local(s, t), Some(s.child.clone())),
        other => {
            return Err(EngineError::InvalidUsage(format!(
                "transform::propagate called on a {} node",
                other.kind_id().name()
            )));
        }
    };
    drop(n);

    let Some(child) = child else { return Ok(None) };
    let mv = parent_mv * local;
    {
        let mut c = child.borrow_mut();
        c.modelview_matrix = mv;
        c.projection_matrix = proj;
    }
    Ok(Some(child))
}

/// A right-handed look-at view matrix from three world-space points (spec
/// §4.7 "Camera": "builds a right-handed look-at view").
#[must_use]
pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, center, up)
}

/// The perspective projection matrix for a camera (spec §4.7). `fov_deg` may
/// be constant or the current sample of an animated field of view.
#[must_use]
pub fn perspective(fov_deg: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
    Mat4::perspective_rh(
        (fov_deg as f32).to_radians(),
        aspect as f32,
        near as f32,
        far as f32,
    )
}

/// `normal_matrix = transpose(inverse(mat3(modelview)))` (spec §4.7
/// "TexturedShape" draw step).
#[must_use]
pub fn normal_matrix(modelview: Mat4) -> glam::Mat3 {
    let m3 = glam::Mat3::from_mat4(modelview);
    m3.inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::factory;

    #[test]
    fn translate_then_rotate_composes_as_expected() {
        // Translate(1,0,0) -> Rotate(90 deg about Z) -> Identity, evaluated
        // on a point (1,0,0) in the Identity's local space (spec §8.3.6).
        let leaf = factory::identity(None);
        let rotated = factory::rotate(leaf.clone(), 90.0, [0.0, 0.0, 1.0]);
        let root = factory::translate(rotated.clone(), [1.0, 0.0, 0.0]);

        let child = propagate(&root, 0.0).unwrap().unwrap();
        assert!(crate::node::same_node(&child, &rotated));
        let child2 = propagate(&rotated, 0.0).unwrap().unwrap();
        assert!(crate::node::same_node(&child2, &leaf));

        let world = leaf.borrow().modelview_matrix;
        let p = world.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5, "got {p:?}");
    }

    #[test]
    fn scale_respects_anchor() {
        let leaf = factory::identity(None);
        let mut scale_node = factory::scale(leaf.clone(), [2.0, 2.0, 2.0]);
        if let NodeKind::Scale(s) = &mut scale_node.borrow_mut().kind {
            s.anchor = [1.0, 0.0, 0.0];
        }
        propagate(&scale_node, 0.0).unwrap();
        let world = leaf.borrow().modelview_matrix;
        // A point at the anchor should stay fixed.
        let p = world.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5, "got {p:?}");
    }

    #[test]
    fn propagate_on_non_transform_kind_errors() {
        let shader = factory::shader();
        assert!(propagate(&shader, 0.0).is_err());
    }
}
