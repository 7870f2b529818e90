//! Node API (spec §6.2): parameter writes and shared-ownership helpers.
//!
//! `node_ref`/`node_unref` need no code here — `NodeHandle` is an `Rc`, so
//! `Clone`/`Drop` already implement spec §3.7's "strong reference taken on
//! assignment, released on reassignment or destruction". What *does* need
//! an explicit implementation is §4.1's write path: resolve the key against
//! schema, validate, mutate the typed field, then force the node back to
//! `Uninit` (spec §3.3invariant, §4.2) so the next lifecycle pass re-derives
//! from the new value.

use super::schema::schema_for;
use super::{NodeHandle, NodeKind, NodeKindId, NodeState};
use crate::errors::{EngineError, Result};
use crate::param::ParamType;

/// A dynamically-typed parameter value, covering every [`ParamType`] this
/// crate's closed kind set uses at the `set`/`add` boundary.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Int(i32),
    I64(i64),
    Double(f64),
    String(String),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
    Node(NodeHandle),
}

fn type_mismatch(expected: ParamType) -> EngineError {
    EngineError::InvalidArg(format!("expected a {expected} value"))
}

/// `node_param_set(h, key, value)` (spec §6.2, §4.1).
pub fn node_param_set(handle: &NodeHandle, key: &str, value: ParamValue) -> Result<()> {
    let kind_id = handle.borrow().kind_id();
    let schema = schema_for(kind_id);
    let descriptor = crate::param::resolve(schema, key)
        .ok_or_else(|| EngineError::InvalidArg(format!("unknown parameter '{key}' for {}", kind_id.name())))?;

    if let ParamValue::Node(child) = &value {
        if descriptor.ty == ParamType::NodeRef {
            let child_kind = child.borrow().kind_id();
            if !descriptor.accepts_kind(child_kind) {
                return Err(EngineError::InvalidArg(format!(
                    "{} does not accept a {} child in '{key}'",
                    kind_id.name(),
                    child_kind.name()
                )));
            }
        }
    }

    if key == "name" {
        let ParamValue::String(s) = value else { return Err(type_mismatch(ParamType::String)) };
        let mut node = handle.borrow_mut();
        node.name = Some(s);
        node.state = NodeState::Uninit;
        return Ok(());
    }

    let mut node = handle.borrow_mut();
    match (key, &mut node.kind) {
        ("value", NodeKind::UniformScalar(u)) => {
            let ParamValue::Double(d) = value else { return Err(type_mismatch(ParamType::Double)) };
            u.value = crate::node::kinds::values::UniformValue::Scalar(d);
        }
        ("value", NodeKind::UniformVec2(u)) => {
            let ParamValue::Vec2(v) = value else { return Err(type_mismatch(ParamType::Vec2)) };
            u.value = crate::node::kinds::values::UniformValue::Vec2(v);
        }
        ("value", NodeKind::UniformVec3(u)) => {
            let ParamValue::Vec3(v) = value else { return Err(type_mismatch(ParamType::Vec3)) };
            u.value = crate::node::kinds::values::UniformValue::Vec3(v);
        }
        ("value", NodeKind::UniformVec4(u)) => {
            let ParamValue::Vec4(v) = value else { return Err(type_mismatch(ParamType::Vec4)) };
            u.value = crate::node::kinds::values::UniformValue::Vec4(v);
        }
        ("value", NodeKind::UniformInt(u)) => {
            let ParamValue::Int(i) = value else { return Err(type_mismatch(ParamType::Int)) };
            u.value = crate::node::kinds::values::UniformValue::Int(i);
        }
        ("vector", NodeKind::Translate(t)) => {
            let ParamValue::Vec3(v) = value else { return Err(type_mismatch(ParamType::Vec3)) };
            t.vector = v;
        }
        ("factors", NodeKind::Scale(s)) => {
            let ParamValue::Vec3(v) = value else { return Err(type_mismatch(ParamType::Vec3)) };
            s.factors = v;
        }
        ("angle", NodeKind::Rotate(r)) => {
            let ParamValue::Double(d) = value else { return Err(type_mismatch(ParamType::Double)) };
            r.angle_deg = d;
        }
        ("start_time", NodeKind::RangeContinuous(r)) => {
            let ParamValue::Double(d) = value else { return Err(type_mismatch(ParamType::Double)) };
            r.start_time = d;
        }
        ("start_time", NodeKind::RangeNoRender(r)) => {
            let ParamValue::Double(d) = value else { return Err(type_mismatch(ParamType::Double)) };
            r.start_time = d;
        }
        ("start_time", NodeKind::RangeOnce(r)) => {
            let ParamValue::Double(d) = value else { return Err(type_mismatch(ParamType::Double)) };
            r.start_time = d;
        }
        ("texture", NodeKind::UniformSampler(s)) => {
            let ParamValue::Node(n) = value else { return Err(type_mismatch(ParamType::NodeRef)) };
            s.texture = Some(n);
        }
        ("corner", NodeKind::Quad(q)) => {
            let ParamValue::Vec3(v) = value else { return Err(type_mismatch(ParamType::Vec3)) };
            q.corner = v;
        }
        ("width", NodeKind::Quad(q)) => {
            let ParamValue::Vec3(v) = value else { return Err(type_mismatch(ParamType::Vec3)) };
            q.width = v;
        }
        ("height", NodeKind::Quad(q)) => {
            let ParamValue::Vec3(v) = value else { return Err(type_mismatch(ParamType::Vec3)) };
            q.height = v;
        }
        ("vertex", NodeKind::Shader(s)) => {
            let ParamValue::String(v) = value else { return Err(type_mismatch(ParamType::String)) };
            s.vertex_src = v;
        }
        ("fragment", NodeKind::Shader(s)) => {
            let ParamValue::String(v) = value else { return Err(type_mismatch(ParamType::String)) };
            s.fragment_src = v;
        }
        ("shape", NodeKind::TexturedShape(ts)) => {
            let ParamValue::Node(n) = value else { return Err(type_mismatch(ParamType::NodeRef)) };
            ts.shape = Some(n);
        }
        ("shader", NodeKind::TexturedShape(ts)) => {
            let ParamValue::Node(n) = value else { return Err(type_mismatch(ParamType::NodeRef)) };
            ts.shader = Some(n);
        }
        ("render_time", NodeKind::RangeOnce(r)) => {
            let ParamValue::Double(d) = value else { return Err(type_mismatch(ParamType::Double)) };
            r.render_time = d;
        }
        ("pipe_fd", NodeKind::Camera(c)) => {
            let ParamValue::Int(i) = value else { return Err(type_mismatch(ParamType::Int)) };
            c.pipe_fd = if i < 0 { None } else { Some(i) };
        }
        ("fov", NodeKind::Camera(c)) => {
            let ParamValue::Double(d) = value else { return Err(type_mismatch(ParamType::Double)) };
            c.perspective.fov_deg = d;
        }
        _ => return Err(EngineError::InvalidArg(format!("'{key}' is not settable on {}", kind_id.name()))),
    }
    node.state = NodeState::Uninit;
    Ok(())
}

/// `node_param_add(h, key, elems)` — appends to a `NodeList` slot, validated
/// against the slot's allowed-kinds whitelist (spec §3.3, §4.1).
pub fn node_param_add(handle: &NodeHandle, key: &str, elems: &[NodeHandle]) -> Result<()> {
    let kind_id = handle.borrow().kind_id();
    let schema = schema_for(kind_id);
    let descriptor = crate::param::resolve(schema, key)
        .ok_or_else(|| EngineError::InvalidArg(format!("unknown parameter '{key}' for {}", kind_id.name())))?;
    if descriptor.ty != ParamType::NodeList {
        return Err(EngineError::InvalidArg(format!("'{key}' is not a node list")));
    }
    for elem in elems {
        let elem_kind = elem.borrow().kind_id();
        if !descriptor.accepts_kind(elem_kind) {
            return Err(EngineError::InvalidArg(format!(
                "{} does not accept a {} element in '{key}'",
                kind_id.name(),
                elem_kind.name()
            )));
        }
    }

    if key == "glstates" || key == "ranges" {
        let mut node = handle.borrow_mut();
        if key == "glstates" {
            node.glstates.extend(elems.iter().cloned());
        } else {
            node.ranges.extend(elems.iter().cloned());
        }
        node.state = NodeState::Uninit;
        return Ok(());
    }

    let mut node = handle.borrow_mut();
    match (key, &mut node.kind) {
        ("animkf", NodeKind::UniformScalar(u) | NodeKind::UniformVec2(u) | NodeKind::UniformVec3(u) | NodeKind::UniformVec4(u) | NodeKind::UniformInt(u) | NodeKind::UniformMat4(u)) => {
            u.animkf.extend(elems.iter().cloned());
        }
        ("textures", NodeKind::TexturedShape(t)) => t.textures.extend(elems.iter().cloned()),
        ("uniforms", NodeKind::TexturedShape(t)) => t.uniforms.extend(elems.iter().cloned()),
        ("attributes", NodeKind::TexturedShape(t)) => t.attributes.extend(elems.iter().cloned()),
        ("children", NodeKind::Group(g)) => g.children.extend(elems.iter().cloned()),
        ("color_textures", NodeKind::Rtt(r)) => r.color_textures.extend(elems.iter().cloned()),
        ("time_remap", NodeKind::Media(m)) => m.time_remap.extend(elems.iter().cloned()),
        ("fov_anim", NodeKind::Camera(c)) => c.fov_anim.extend(elems.iter().cloned()),
        ("anim", NodeKind::Translate(t)) => t.anim.extend(elems.iter().cloned()),
        ("anim", NodeKind::Rotate(r)) => r.anim.extend(elems.iter().cloned()),
        ("anim", NodeKind::Scale(s)) => s.anim.extend(elems.iter().cloned()),
        _ => return Err(EngineError::InvalidArg(format!("'{key}' is not a list on {}", kind_id.name()))),
    }
    node.state = NodeState::Uninit;
    Ok(())
}

#[must_use]
pub fn kind_id_accepts(allowed: &[NodeKindId], kind: NodeKindId) -> bool {
    allowed.is_empty() || allowed.contains(&kind)
}
