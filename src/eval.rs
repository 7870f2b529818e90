//! Per-frame evaluation pipeline (spec §4.5, component H).
//!
//! `draw(Ctx, t)` runs two passes over the scene graph reachable from the
//! root:
//!
//! - **Pass 1** ([`check_resources`]): [`check_activity`] walks the whole
//!   graph once, merging activity across any node reachable from more than
//!   one parent (a node visited twice in the same frame is active if
//!   *either* visit says so — tracked via `Node::active_time`/`is_active`);
//!   [`honor_release_prefetch`] then walks again, children before parents,
//!   calling [`lifecycle::prefetch`]/[`lifecycle::release`] exactly once per
//!   physical node this frame (deduplicated by `Rc` pointer identity, since
//!   a shared subtree is one allocation reachable through many edges).
//! - **Pass 2** ([`update_and_draw`]): a single recursive visit per
//!   reachable node that fuses `update` and `draw` — spec §4.5 allows
//!   implementations to fuse them into one traversal rather than two.
//!
//! Both passes recurse through [`Node::reflected_children`]/
//! [`NodeKind::children`] rather than any kind-specific traversal order
//! table, so adding a new structural kind only means adding one arm to
//! `children()` (in `node::mod`) and one to [`update_kind`]/[`draw_kind`]
//! here.

use crate::backend::state_cache::{StateCache, StateOverride};
use crate::backend::{GraphicsBackend, IndexFormat, UniformData};
use crate::errors::{EngineError, Result};
use crate::node::kinds::values::{Uniform, UniformValue};
use crate::node::{NodeHandle, NodeKind, NodeKindId, NodeState};
use crate::{animation, lifecycle, render_range};
use crate::render_range::Selection;
use glam::{Mat3, Mat4, Vec3};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// How far ahead of a `NoRender` gap the pipeline starts prefetching the
/// subtree behind it (spec §4.5).
pub const PREFETCH_TIME: f64 = 1.0;
/// How long a subtree that's gone inactive stays `Ready` before being
/// released (spec §4.5).
pub const MAX_IDLE_TIME: f64 = PREFETCH_TIME + 3.0;

fn node_ptr(node: &NodeHandle) -> usize {
    Rc::as_ptr(node) as usize
}

fn compute_is_active(parent_active: bool, selection: Selection, state: NodeState) -> bool {
    if !parent_active {
        return false;
    }
    match selection {
        Selection::Unbounded | Selection::Continuous | Selection::Once { .. } => true,
        Selection::NoRender { next_start_delta } => match next_start_delta {
            Some(delta) if delta < PREFETCH_TIME => true,
            Some(delta) if delta < MAX_IDLE_TIME && state == NodeState::Ready => true,
            _ => false,
        },
    }
}

fn check_activity(node: &NodeHandle, t: f64, parent_active: bool) -> Result<()> {
    lifecycle::init(node)?;
    let local_active = {
        let mut n = node.borrow_mut();
        let selection = render_range::select(&mut n, t);
        compute_is_active(parent_active, selection, n.state)
    };
    let is_active = {
        let mut n = node.borrow_mut();
        if n.active_time == Some(t) {
            n.is_active = n.is_active || local_active;
        } else {
            n.active_time = Some(t);
            n.is_active = local_active;
        }
        n.is_active
    };
    // Once Idle and still inactive there's nothing further to derive: an
    // Idle subtree's own children were already released with it.
    if !is_active && node.borrow().state == NodeState::Idle {
        return Ok(());
    }
    let children = node.borrow().reflected_children();
    for child in &children {
        check_activity(child, t, is_active)?;
    }
    Ok(())
}

fn honor_release_prefetch(
    node: &NodeHandle,
    t: f64,
    backend: &mut dyn GraphicsBackend,
    visited: &mut HashSet<usize>,
) -> Result<()> {
    if !visited.insert(node_ptr(node)) {
        return Ok(());
    }
    let children = node.borrow().reflected_children();
    for child in &children {
        honor_release_prefetch(child, t, backend, visited)?;
    }
    let (active_time, is_active) = {
        let n = node.borrow();
        (n.active_time, n.is_active)
    };
    if active_time == Some(t) {
        if is_active {
            lifecycle::prefetch(node, backend)?;
        } else {
            lifecycle::release(node, backend);
        }
    }
    Ok(())
}

/// Pass 1 (spec §4.5): activity propagation, then a children-before-parents
/// prefetch/release sweep.
pub fn check_resources(root: &NodeHandle, t: f64, backend: &mut dyn GraphicsBackend) -> Result<()> {
    check_activity(root, t, true)?;
    let mut visited = HashSet::new();
    honor_release_prefetch(root, t, backend, &mut visited)
}

/// Pass 2 entry point (spec §4.5): fused `update` + `draw`, starting from
/// `root`'s own modelview/projection (the caller — [`crate::context::Ctx`] —
/// resets these to identity at the start of every `draw` call).
pub fn update_and_draw(
    root: &NodeHandle,
    t: f64,
    backend: &mut dyn GraphicsBackend,
    state_cache: &mut StateCache,
) -> Result<()> {
    visit(root, t, backend, state_cache)
}

fn forward_transform(child: &NodeHandle, mv: Mat4, proj: Mat4) {
    let mut c = child.borrow_mut();
    c.modelview_matrix = mv;
    c.projection_matrix = proj;
}

/// One recursive step: re-selects this node's render range, updates it if
/// its resolved time has changed since the last visit, then draws it if
/// `drawme` ends up set (spec §4.5).
fn visit(
    node: &NodeHandle,
    t: f64,
    backend: &mut dyn GraphicsBackend,
    state_cache: &mut StateCache,
) -> Result<()> {
    let selection = {
        let mut n = node.borrow_mut();
        render_range::select(&mut n, t)
    };
    let effective_t = match selection {
        Selection::NoRender { .. } => {
            node.borrow_mut().drawme = false;
            return Ok(());
        }
        Selection::Once { render_time, already_updated } => {
            if already_updated {
                node.borrow_mut().drawme = false;
                return Ok(());
            }
            render_range::mark_once_updated(&node.borrow());
            render_time
        }
        Selection::Unbounded | Selection::Continuous => t,
    };

    let needs_update = {
        let n = node.borrow();
        n.last_update_time < 0.0 || (n.last_update_time - effective_t).abs() > f64::EPSILON
    };
    if needs_update {
        lifecycle::prefetch(node, backend)?;
        update_kind(node, effective_t, backend, state_cache)?;
        node.borrow_mut().last_update_time = effective_t;
    }
    node.borrow_mut().drawme = true;

    draw_kind(node, effective_t, backend, state_cache)
}

fn update_kind(
    node: &NodeHandle,
    t: f64,
    backend: &mut dyn GraphicsBackend,
    state_cache: &mut StateCache,
) -> Result<()> {
    let kind_id = node.borrow().kind_id();
    match kind_id {
        NodeKindId::Group => {
            let (mv, proj, children) = {
                let n = node.borrow();
                (n.modelview_matrix, n.projection_matrix, n.children())
            };
            for child in &children {
                forward_transform(child, mv, proj);
                visit(child, t, backend, state_cache)?;
            }
        }
        NodeKindId::Identity | NodeKindId::Translate | NodeKindId::Rotate | NodeKindId::Scale => {
            if let Some(child) = crate::transform::propagate(node, t)? {
                visit(&child, t, backend, state_cache)?;
            }
        }
        NodeKindId::Camera => update_camera(node, t, backend, state_cache)?,
        NodeKindId::Rtt => {
            // The child is visited from `draw_kind`, once this node's own
            // render target is bound (spec §4.7: "on draw: saves current
            // binding, binds its own, calls the child's draw, restores").
        }
        NodeKindId::Fps => update_fps(node, t, backend, state_cache)?,
        NodeKindId::TexturedShape => update_textured_shape(node, t)?,
        NodeKindId::Media => update_media(node, t, backend)?,
        _ => {}
    }
    Ok(())
}

fn draw_kind(
    node: &NodeHandle,
    t: f64,
    backend: &mut dyn GraphicsBackend,
    state_cache: &mut StateCache,
) -> Result<()> {
    if !node.borrow().drawme {
        return Ok(());
    }
    let overrides = push_glstates(node, state_cache);
    let kind_id = node.borrow().kind_id();
    let result = match kind_id {
        NodeKindId::TexturedShape => draw_textured_shape(node, backend),
        NodeKindId::Camera => draw_camera_pipe_capture(node, backend),
        NodeKindId::Rtt => draw_rtt(node, t, backend, state_cache),
        _ => Ok(()),
    };
    pop_glstates(state_cache, overrides);
    result
}

fn push_glstates(node: &NodeHandle, cache: &mut StateCache) -> Vec<StateOverride> {
    let glstates = node.borrow().glstates.clone();
    glstates
        .iter()
        .map(|g| {
            let over = match &g.borrow().kind {
                NodeKind::GlBlendState(b) => b.as_override(),
                NodeKind::GlColorState(c) => c.as_override(),
                NodeKind::GlStencilState(s) => s.as_override(),
                NodeKind::GlState(s) => s.as_override(),
                other => unreachable!("glstates[] slot holds a {}", other.kind_id().name()),
            };
            cache.push_override(over)
        })
        .collect()
}

fn pop_glstates(cache: &mut StateCache, saved: Vec<StateOverride>) {
    for over in saved.into_iter().rev() {
        cache.pop_override(over);
    }
}

/// Converts a node-side uniform value to the backend-side one (spec §4.7
/// "uploads current uniform values by type"). The two types have the same
/// shape; kept distinct so `backend/` has no dependency on `node/`.
fn to_uniform_data(v: UniformValue) -> UniformData {
    match v {
        UniformValue::Scalar(x) => UniformData::Scalar(x),
        UniformValue::Vec2(x) => UniformData::Vec2(x),
        UniformValue::Vec3(x) => UniformData::Vec3(x),
        UniformValue::Vec4(x) => UniformData::Vec4(x),
        UniformValue::Int(x) => UniformData::Int(x),
        UniformValue::Mat4(x) => UniformData::Mat4(x),
    }
}

/// Binds a `TexturedShape` for drawing (spec §4.7 "on draw"): pushes every
/// bound uniform's current value, binds each texture with its coordinate
/// matrix and dimensions, uploads attribute buffers, then the conventional
/// `ngl_modelview_matrix`/`ngl_projection_matrix`/`ngl_normal_matrix`
/// uniforms, before issuing the indexed draw. A uniform/attribute/texture
/// node with no `name` set has no backend slot to bind to — spec §7 treats
/// an unresolved name as a warning, not a failure, so it's simply skipped.
fn draw_textured_shape(node: &NodeHandle, backend: &mut dyn GraphicsBackend) -> Result<()> {
    let n = node.borrow();
    let NodeKind::TexturedShape(ts) = &n.kind else { unreachable!() };
    let shader = ts
        .shader
        .as_ref()
        .ok_or_else(|| EngineError::InvalidUsage("TexturedShape has no shader bound".into()))?;
    let pipeline = match &shader.borrow().kind {
        NodeKind::Shader(s) => s.pipeline,
        _ => None,
    }
    .ok_or_else(|| EngineError::InvalidUsage("TexturedShape's shader has not been prefetched".into()))?;
    let ibo = ts
        .ibo
        .ok_or_else(|| EngineError::InvalidUsage("TexturedShape has not been prefetched".into()))?;
    let shape = ts
        .shape
        .as_ref()
        .ok_or_else(|| EngineError::InvalidUsage("TexturedShape has no shape bound".into()))?;
    let index_count = match &shape.borrow().kind {
        NodeKind::Quad(q) => q.mesh.indices.len(),
        NodeKind::Triangle(tr) => tr.mesh.indices.len(),
        NodeKind::ShapePrimitive(s) => s.mesh.indices.len(),
        NodeKind::Shape(s) => s.mesh.indices.len(),
        other => return Err(EngineError::InvalidArg(format!("{} is not a shape node", other.kind_id().name()))),
    } as u32;
    let uniforms = ts.uniforms.clone();
    let textures = ts.textures.clone();
    let attributes = ts.attributes.clone();
    let modelview = n.modelview_matrix;
    let projection = n.projection_matrix;
    drop(n);

    for u in &uniforms {
        let un = u.borrow();
        let Some(name) = un.name.clone() else { continue };
        let value = match &un.kind {
            NodeKind::UniformScalar(uv)
            | NodeKind::UniformVec2(uv)
            | NodeKind::UniformVec3(uv)
            | NodeKind::UniformVec4(uv)
            | NodeKind::UniformInt(uv)
            | NodeKind::UniformMat4(uv) => Some(to_uniform_data(uv.current)),
            _ => None,
        };
        if let Some(value) = value {
            backend.update_uniform(pipeline, &name, value)?;
        }
    }

    for (i, tex_node) in textures.iter().enumerate() {
        let tn = tex_node.borrow();
        let NodeKind::Texture(tex) = &tn.kind else { continue };
        let Some(handle) = tex.handle else { continue };
        let name = tn.name.clone().unwrap_or_else(|| format!("tex{i}"));
        backend.bind_texture(pipeline, &name, handle, tex.coords_matrix.to_cols_array(), (tex.width, tex.height))?;
    }

    for a in &attributes {
        let an = a.borrow();
        let Some(name) = an.name.clone() else { continue };
        let dim_data = match &an.kind {
            NodeKind::AttributeVec2(attr) | NodeKind::AttributeVec3(attr) | NodeKind::AttributeVec4(attr) => {
                Some((attr.dim, &attr.data))
            }
            _ => None,
        };
        if let Some((dim, data)) = dim_data {
            backend.update_attribute(pipeline, &name, dim, data)?;
        }
    }

    backend.update_uniform(pipeline, "ngl_modelview_matrix", UniformData::Mat4(modelview.to_cols_array()))?;
    backend.update_uniform(pipeline, "ngl_projection_matrix", UniformData::Mat4(projection.to_cols_array()))?;
    let normal_matrix = Mat4::from_mat3(Mat3::from_mat4(modelview).inverse().transpose());
    backend.update_uniform(pipeline, "ngl_normal_matrix", UniformData::Mat4(normal_matrix.to_cols_array()))?;

    backend.draw_indexed(pipeline, ibo, IndexFormat::U16, index_count, 1)
}

fn update_textured_shape(node: &NodeHandle, t: f64) -> Result<()> {
    let uniforms = {
        let n = node.borrow();
        let NodeKind::TexturedShape(ts) = &n.kind else { unreachable!() };
        ts.uniforms.clone()
    };
    for u in &uniforms {
        let mut un = u.borrow_mut();
        match &mut un.kind {
            NodeKind::UniformScalar(u)
            | NodeKind::UniformVec2(u)
            | NodeKind::UniformVec3(u)
            | NodeKind::UniformVec4(u)
            | NodeKind::UniformInt(u)
            | NodeKind::UniformMat4(u) => refresh_uniform(u, t),
            _ => {}
        }
    }
    Ok(())
}

/// Refreshes `current` for this frame: the constant `value` if no keyframes
/// are bound, otherwise the keyframe evaluator's sample (spec §4.3, §4.7).
fn refresh_uniform(u: &mut Uniform, t: f64) {
    if u.animkf.is_empty() {
        u.current = u.value;
        return;
    }
    let sampled = animation::sample(&u.animkf, &mut u.cursor, t);
    u.current = match u.value {
        UniformValue::Scalar(_) => UniformValue::Scalar(f64::from(sampled[0])),
        UniformValue::Vec2(_) => UniformValue::Vec2([sampled[0], sampled[1]]),
        UniformValue::Vec3(_) => UniformValue::Vec3([sampled[0], sampled[1], sampled[2]]),
        UniformValue::Vec4(_) => UniformValue::Vec4(sampled),
        UniformValue::Int(_) => UniformValue::Int(sampled[0] as i32),
        // A 4x4 matrix has no meaningful 4-channel keyframe representation;
        // animating one is out of scope (spec §6.3 lists `animkf` uniformly
        // but a Mat4 slot simply ignores it).
        UniformValue::Mat4(_) => u.value,
    };
}

fn update_media(node: &NodeHandle, t: f64, backend: &mut dyn GraphicsBackend) -> Result<()> {
    let texture = {
        let n = node.borrow();
        let NodeKind::Media(m) = &n.kind else { unreachable!() };
        m.texture.clone()
    };
    let frame = {
        let mut n = node.borrow_mut();
        let NodeKind::Media(m) = &mut n.kind else { unreachable!() };
        let media_t = animation::resolve_time(&m.time_remap, &mut m.time_remap_cursor, t);
        if m.last_frame_time == Some(media_t) {
            return Ok(());
        }
        let Some(source) = m.source.as_mut() else { return Ok(()) };
        let Some(frame) = source.frame_at(media_t) else { return Ok(()) };
        m.last_frame_time = Some(media_t);
        frame
    };
    let mut tex_n = texture.borrow_mut();
    let NodeKind::Texture(tex) = &mut tex_n.kind else {
        return Err(EngineError::InvalidUsage("media's texture slot is not a Texture node".into()));
    };
    let handle = tex
        .handle
        .ok_or_else(|| EngineError::InvalidUsage("media's texture has not been prefetched".into()))?;
    backend.upload_texture(handle, &frame.data)?;
    tex.coords_matrix = frame.coords_matrix;
    Ok(())
}

fn update_fps(
    node: &NodeHandle,
    t: f64,
    backend: &mut dyn GraphicsBackend,
    state_cache: &mut StateCache,
) -> Result<()> {
    let (child, mv, proj) = {
        let n = node.borrow();
        let NodeKind::Fps(f) = &n.kind else { unreachable!() };
        (f.child.clone(), n.modelview_matrix, n.projection_matrix)
    };
    forward_transform(&child, mv, proj);
    // The fused update+draw recursion makes it impossible to time "update"
    // and "draw" separately for the wrapped subtree without re-walking it
    // twice; the whole visit is attributed to `draw` here.
    let start = Instant::now();
    let result = visit(&child, t, backend, state_cache);
    let elapsed = start.elapsed();
    if let NodeKind::Fps(f) = &mut node.borrow_mut().kind {
        f.record(Duration::ZERO, elapsed);
    }
    result
}

/// Walks a transform chain from `root` down to the `Identity` leaf that
/// terminates it, composing each local matrix onto `mv` along the way, and
/// returns the leaf's accumulated translation — the chain's "control point"
/// (spec §4.6, §4.7: Camera's eye/center/up).
fn resolve_control_point(root: &NodeHandle, mv: Mat4, proj: Mat4, t: f64) -> Result<Vec3> {
    forward_transform(root, mv, proj);
    let mut current = root.clone();
    loop {
        let is_identity = matches!(current.borrow().kind, NodeKind::Identity(_));
        if is_identity {
            break;
        }
        match crate::transform::propagate(&current, t)? {
            Some(next) => current = next,
            None => break,
        }
    }
    let world = current.borrow().modelview_matrix;
    Ok(world.transform_point3(Vec3::ZERO))
}

fn update_camera(
    node: &NodeHandle,
    t: f64,
    backend: &mut dyn GraphicsBackend,
    state_cache: &mut StateCache,
) -> Result<()> {
    let (parent_mv, parent_proj, eye_h, center_h, up_h, child_h, aspect, near, far, fov_const, fov_anim, mut fov_cursor) = {
        let n = node.borrow();
        let NodeKind::Camera(c) = &n.kind else { unreachable!() };
        (
            n.modelview_matrix,
            n.projection_matrix,
            c.eye.clone(),
            c.center.clone(),
            c.up.clone(),
            c.child.clone(),
            c.perspective.aspect,
            c.perspective.near,
            c.perspective.far,
            c.perspective.fov_deg,
            c.fov_anim.clone(),
            c.fov_cursor,
        )
    };

    let eye = resolve_control_point(&eye_h, parent_mv, parent_proj, t)?;
    let center = resolve_control_point(&center_h, parent_mv, parent_proj, t)?;
    let up = resolve_control_point(&up_h, parent_mv, parent_proj, t)?;

    let fov_deg = if fov_anim.is_empty() {
        fov_const
    } else {
        animation::sample_scalar(&fov_anim, &mut fov_cursor, t)
    };
    if let NodeKind::Camera(c) = &mut node.borrow_mut().kind {
        c.fov_cursor = fov_cursor;
    }

    let view = crate::transform::look_at(eye, center, up);
    let proj = crate::transform::perspective(fov_deg, aspect, near, far);
    forward_transform(&child_h, view, proj);
    visit(&child_h, t, backend, state_cache)
}

fn draw_camera_pipe_capture(node: &NodeHandle, backend: &mut dyn GraphicsBackend) -> Result<()> {
    let (pipe_fd, width, height) = {
        let n = node.borrow();
        let NodeKind::Camera(c) = &n.kind else { unreachable!() };
        (c.pipe_fd, c.pipe_width, c.pipe_height)
    };
    let Some(fd) = pipe_fd else { return Ok(()) };
    if width == 0 || height == 0 {
        return Ok(());
    }
    let pixels = backend.read_pixels_rgba8(0, 0, width, height)?;
    write_pipe(fd, &pixels)
}

#[cfg(unix)]
fn write_pipe(fd: i32, data: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::fd::FromRawFd;
    // SAFETY: the caller (spec §6.4) retains ownership of `fd` across the
    // camera's lifetime; wrapping it in a `File` only to `write_all` and
    // then forgetting it avoids closing a descriptor we don't own.
    let mut file = unsafe { std::fs::File::from_raw_fd(fd) };
    let result = file.write_all(data).map_err(EngineError::from);
    std::mem::forget(file);
    result
}

#[cfg(not(unix))]
fn write_pipe(_fd: i32, _data: &[u8]) -> Result<()> {
    Err(EngineError::Unsupported("camera pipe capture requires a POSIX file descriptor".into()))
}

fn draw_rtt(
    node: &NodeHandle,
    t: f64,
    backend: &mut dyn GraphicsBackend,
    state_cache: &mut StateCache,
) -> Result<()> {
    let (child, render_target, mv, proj) = {
        let n = node.borrow();
        let NodeKind::Rtt(r) = &n.kind else { unreachable!() };
        (r.child.clone(), r.render_target, n.modelview_matrix, n.projection_matrix)
    };
    let Some(target) = render_target else {
        return Err(EngineError::InvalidUsage("RTT has not been prefetched".into()));
    };
    let previous = backend.current_render_target();
    backend.bind_render_target(Some(target))?;
    if let NodeKind::Rtt(r) = &mut node.borrow_mut().kind {
        r.prev_target = previous;
    }
    forward_transform(&child, mv, proj);
    let result = visit(&child, t, backend, state_cache);
    backend.resolve_render_target(target)?;
    backend.bind_render_target(previous)?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::node::api::node_param_add;
    use crate::node::factory;

    fn textured_quad() -> NodeHandle {
        let shape = factory::quad([-0.5, -0.5, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let shader = factory::shader();
        factory::textured_shape(shape, shader)
    }

    #[test]
    fn textured_shape_draws_through_a_group() {
        let mut backend = MockBackend::new();
        let mut cache = StateCache::new();
        let ts = textured_quad();
        let root = factory::group(vec![ts]);
        lifecycle::attach_ctx(&root, 1).unwrap();

        check_resources(&root, 0.0, &mut backend).unwrap();
        {
            let mut r = root.borrow_mut();
            r.modelview_matrix = Mat4::IDENTITY;
            r.projection_matrix = Mat4::IDENTITY;
        }
        update_and_draw(&root, 0.0, &mut backend, &mut cache).unwrap();

        assert_eq!(backend.draw_indexed_calls, 1);
    }

    #[test]
    fn shared_subtree_is_prefetched_once_per_frame() {
        let mut backend = MockBackend::new();
        let shape = factory::quad([-0.5, -0.5, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let shader_a = factory::shader();
        let shader_b = factory::shader();
        let ts_a = factory::textured_shape(shape.clone(), shader_a);
        let ts_b = factory::textured_shape(shape, shader_b);
        let root = factory::group(vec![ts_a, ts_b]);
        lifecycle::attach_ctx(&root, 1).unwrap();

        check_resources(&root, 0.0, &mut backend).unwrap();

        assert_eq!(backend.buffers.len(), 4); // one vbo + ibo per TexturedShape
        assert_eq!(backend.pipelines.len(), 2);
    }

    #[test]
    fn no_render_range_withholds_draw_until_prefetch_window() {
        let mut backend = MockBackend::new();
        let mut cache = StateCache::new();
        let ts = textured_quad();
        node_param_add(&ts, "ranges", &[factory::range_no_render(0.0), factory::range_continuous(5.0)]).unwrap();
        lifecycle::attach_ctx(&ts, 1).unwrap();

        check_resources(&ts, 0.0, &mut backend).unwrap();
        {
            let mut n = ts.borrow_mut();
            n.modelview_matrix = Mat4::IDENTITY;
            n.projection_matrix = Mat4::IDENTITY;
        }
        update_and_draw(&ts, 0.0, &mut backend, &mut cache).unwrap();
        assert_eq!(backend.draw_indexed_calls, 0);
        assert_eq!(ts.borrow().state, NodeState::Uninit);

        // Within PREFETCH_TIME of the next range, resources are fetched but
        // nothing is drawn yet.
        check_resources(&ts, 4.5, &mut backend).unwrap();
        assert_eq!(ts.borrow().state, NodeState::Ready);

        check_resources(&ts, 5.1, &mut backend).unwrap();
        update_and_draw(&ts, 5.1, &mut backend, &mut cache).unwrap();
        assert_eq!(backend.draw_indexed_calls, 1);
    }

    struct ConstantFrame {
        frame: crate::node::kinds::render::Frame,
    }

    impl crate::node::kinds::render::FrameSource for ConstantFrame {
        fn frame_at(&mut self, _t: f64) -> Option<crate::node::kinds::render::Frame> {
            Some(self.frame.clone())
        }
    }

    #[test]
    fn media_uploads_into_its_bound_texture() {
        let mut backend = MockBackend::new();
        let tex = factory::texture(2, 2, crate::backend::PixelFormat::Rgba8Unorm);
        let source = Box::new(ConstantFrame {
            frame: crate::node::kinds::render::Frame {
                width: 2,
                height: 2,
                format: crate::backend::PixelFormat::Rgba8Unorm,
                data: vec![0u8; 16],
                coords_matrix: Mat4::IDENTITY,
            },
        });
        let media = factory::media(tex.clone(), Some(source));
        lifecycle::attach_ctx(&media, 1).unwrap();

        check_resources(&media, 0.0, &mut backend).unwrap();
        update_kind(&media, 0.0, &mut backend, &mut StateCache::new()).unwrap();

        assert!(tex.borrow().state == NodeState::Uninit || matches!(tex.borrow().kind, NodeKind::Texture(_)));
        if let NodeKind::Texture(t) = &tex.borrow().kind {
            assert!(t.handle.is_some());
        }
    }

    #[test]
    fn camera_resolves_eye_center_up_through_identity_leaves() {
        let mut backend = MockBackend::new();
        let mut cache = StateCache::new();
        let child = textured_quad();
        let eye_leaf = factory::identity(None);
        let eye = factory::translate(eye_leaf, [0.0, 0.0, 5.0]);
        let center = factory::identity(None);
        let up = factory::identity(None);
        let camera = factory::camera(
            child,
            eye,
            center,
            up,
            crate::node::kinds::render::Perspective { fov_deg: 60.0, aspect: 1.0, near: 0.1, far: 100.0 },
        );
        lifecycle::attach_ctx(&camera, 1).unwrap();

        check_resources(&camera, 0.0, &mut backend).unwrap();
        {
            let mut n = camera.borrow_mut();
            n.modelview_matrix = Mat4::IDENTITY;
            n.projection_matrix = Mat4::IDENTITY;
        }
        update_and_draw(&camera, 0.0, &mut backend, &mut cache).unwrap();
        assert_eq!(backend.draw_indexed_calls, 1);
    }

    #[test]
    fn rtt_binds_and_restores_its_render_target() {
        let mut backend = MockBackend::new();
        let mut cache = StateCache::new();
        let child = textured_quad();
        let rtt = factory::rtt(child, 4, 4);
        let color = factory::texture(4, 4, crate::backend::PixelFormat::Rgba8Unorm);
        node_param_add(&rtt, "color_textures", &[color]).unwrap();
        lifecycle::attach_ctx(&rtt, 1).unwrap();

        check_resources(&rtt, 0.0, &mut backend).unwrap();
        {
            let mut n = rtt.borrow_mut();
            n.modelview_matrix = Mat4::IDENTITY;
            n.projection_matrix = Mat4::IDENTITY;
        }
        update_and_draw(&rtt, 0.0, &mut backend, &mut cache).unwrap();

        assert_eq!(backend.draw_indexed_calls, 1);
        assert_eq!(backend.current_render_target(), None);
    }

    #[test]
    fn fps_forwards_lifecycle_and_records_timing() {
        let mut backend = MockBackend::new();
        let mut cache = StateCache::new();
        let child = textured_quad();
        let fps = factory::fps(child, 8);
        lifecycle::attach_ctx(&fps, 1).unwrap();

        check_resources(&fps, 0.0, &mut backend).unwrap();
        {
            let mut n = fps.borrow_mut();
            n.modelview_matrix = Mat4::IDENTITY;
            n.projection_matrix = Mat4::IDENTITY;
        }
        update_and_draw(&fps, 0.0, &mut backend, &mut cache).unwrap();

        assert_eq!(backend.draw_indexed_calls, 1);
        if let NodeKind::Fps(f) = &fps.borrow().kind {
            assert_eq!(f.history.len(), 1);
        }
    }
}
