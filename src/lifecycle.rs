//! Node lifecycle FSM (spec §3.4, §4.2, component D).
//!
//! `attach_ctx`/`detach_ctx` are the only way a [`CtxId`] propagates to a
//! node — nodes never receive it out-of-band (spec §4.2). `init`/
//! `prefetch`/`release`/`uninit` drive the per-node state machine
//! `Uninit → Init → Ready → Idle`; the class-specific derivation/GPU-object
//! work is dispatched per [`NodeKind`] variant in this file rather than
//! through a runtime class-descriptor table (REDESIGN FLAGS point 3).

use crate::backend::{
    BufferUsage, FilterMode, GraphicsBackend, PipelineDesc, PixelFormat, PrimitiveTopology,
    RenderTargetAttachment, RenderTargetDesc, TextureDesc, TextureDimension, TextureStorageMode,
    WrapMode,
};
use crate::errors::{EngineError, Result};
use crate::node::kinds::geometry::{MeshData, Topology};
use crate::node::{CtxId, NodeHandle, NodeKind, NodeState};

fn topology_to_primitive(t: Topology) -> PrimitiveTopology {
    match t {
        Topology::Triangles => PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => PrimitiveTopology::TriangleStrip,
        Topology::TriangleFan => PrimitiveTopology::TriangleFan,
    }
}

/// Reads the interleaved mesh data off a geometry node (`Quad`/`Triangle`/
/// `ShapePrimitive`/`Shape`), cloning it for buffer upload. `TexturedShape`
/// is the only caller — it borrows the shape, it doesn't own it (spec
/// §3.7).
fn shape_mesh(shape: &NodeHandle) -> Result<MeshData> {
    match &shape.borrow().kind {
        NodeKind::Quad(q) => Ok(q.mesh.clone()),
        NodeKind::Triangle(t) => Ok(t.mesh.clone()),
        NodeKind::ShapePrimitive(s) => Ok(s.mesh.clone()),
        NodeKind::Shape(s) => Ok(s.mesh.clone()),
        other => Err(EngineError::InvalidArg(format!(
            "{} is not a shape node",
            other.kind_id().name()
        ))),
    }
}

/// Class `init` hook (spec §4.2): derives fields that follow purely from
/// constructor parameters, with no context/GPU dependency. Idempotent —
/// called again after a forced re-`Uninit`.
fn class_init(kind: &mut NodeKind) -> Result<()> {
    match kind {
        NodeKind::Quad(q) => q.derive_mesh(),
        NodeKind::Triangle(t) => t.derive_mesh(),
        _ => {}
    }
    Ok(())
}

/// Resets the fields `class_init`/`class_prefetch` derived, so the next
/// `init` starts from a known-clean post-parameter state (spec §4.2's
/// "zero non-parameter portion", realized per-field instead of by memset —
/// REDESIGN FLAGS point 2).
fn class_reset_derived(kind: &mut NodeKind) {
    match kind {
        NodeKind::Quad(q) => q.mesh = MeshData::default(),
        NodeKind::Triangle(t) => t.mesh = MeshData::default(),
        NodeKind::Shader(s) => s.pipeline = None,
        NodeKind::Texture(t) => t.handle = None,
        NodeKind::TexturedShape(ts) => {
            ts.vbo = None;
            ts.ibo = None;
        }
        NodeKind::Rtt(r) => {
            r.render_target = None;
            r.auto_depth = None;
        }
        _ => {}
    }
}

/// Class `prefetch` hook (spec §4.2, §4.7, §4.8): creates the GPU objects
/// this node owns. No-op (`Ok(())`) if already created, so repeated calls
/// within a frame (spec §4.5's activity-merging) are cheap.
fn class_prefetch(kind: &mut NodeKind, backend: &mut dyn GraphicsBackend) -> Result<()> {
    match kind {
        NodeKind::Shader(s) => {
            if s.pipeline.is_none() {
                let desc = PipelineDesc {
                    vertex_src: s.vertex_src.clone(),
                    fragment_src: s.fragment_src.clone(),
                    topology: PrimitiveTopology::TriangleList,
                };
                s.pipeline = Some(backend.create_pipeline(&desc)?);
            }
        }
        NodeKind::Texture(t) => {
            if t.handle.is_none() {
                let desc = TextureDesc {
                    width: t.width,
                    height: t.height,
                    depth: 1,
                    dimension: TextureDimension::D2,
                    format: t.format,
                    storage_mode: t.storage_mode,
                    min_filter: t.min_filter,
                    mag_filter: t.mag_filter,
                    wrap_s: t.wrap_s,
                    wrap_t: t.wrap_t,
                    generate_mipmaps: matches!(t.min_filter, FilterMode::LinearMipmapLinear),
                };
                let handle = backend.create_texture(&desc)?;
                if let Some(data) = &t.data {
                    backend.upload_texture(handle, data)?;
                }
                t.handle = Some(handle);
            }
        }
        NodeKind::TexturedShape(ts) => {
            if ts.vbo.is_none() {
                let shape = ts
                    .shape
                    .as_ref()
                    .ok_or_else(|| EngineError::InvalidUsage("TexturedShape has no shape bound".into()))?;
                let mesh = shape_mesh(shape)?;
                let vbo = backend.create_buffer(BufferUsage::Vertex, std::mem::size_of_val(mesh.vertices.as_slice()))?;
                backend.upload_buffer(vbo, 0, bytemuck::cast_slice(&mesh.vertices))?;
                let ibo = backend.create_buffer(BufferUsage::Index, std::mem::size_of_val(mesh.indices.as_slice()))?;
                backend.upload_buffer(ibo, 0, bytemuck::cast_slice(&mesh.indices))?;
                ts.vbo = Some(vbo);
                ts.ibo = Some(ibo);
                let _ = topology_to_primitive(mesh.topology);
            }
        }
        NodeKind::Rtt(r) => {
            if r.render_target.is_none() {
                let mut color_attachments = Vec::with_capacity(r.color_textures.len());
                for tex in &r.color_textures {
                    let handle = match &mut tex.borrow_mut().kind {
                        NodeKind::Texture(t) => {
                            if t.handle.is_none() {
                                let desc = TextureDesc {
                                    width: t.width,
                                    height: t.height,
                                    depth: 1,
                                    dimension: TextureDimension::D2,
                                    format: t.format,
                                    storage_mode: t.storage_mode,
                                    min_filter: t.min_filter,
                                    mag_filter: t.mag_filter,
                                    wrap_s: t.wrap_s,
                                    wrap_t: t.wrap_t,
                                    generate_mipmaps: false,
                                };
                                t.handle = Some(backend.create_texture(&desc)?);
                            }
                            t.handle.unwrap()
                        }
                        other => {
                            return Err(EngineError::InvalidArg(format!(
                                "RTT color attachment must be a Texture, got {}",
                                other.kind_id().name()
                            )));
                        }
                    };
                    color_attachments.push(RenderTargetAttachment { texture: handle, resolve_target: None });
                }
                // Spec §9 Open Question, preserved: "if a depth texture is
                // provided, attach it; else create a renderbuffer."
                let depth_attachment = if let Some(depth_node) = &r.depth {
                    let handle = match &mut depth_node.borrow_mut().kind {
                        NodeKind::Texture(t) => {
                            if t.handle.is_none() {
                                let desc = TextureDesc {
                                    width: t.width,
                                    height: t.height,
                                    depth: 1,
                                    dimension: TextureDimension::D2,
                                    format: t.format,
                                    storage_mode: t.storage_mode,
                                    min_filter: t.min_filter,
                                    mag_filter: t.mag_filter,
                                    wrap_s: t.wrap_s,
                                    wrap_t: t.wrap_t,
                                    generate_mipmaps: false,
                                };
                                t.handle = Some(backend.create_texture(&desc)?);
                            }
                            t.handle.unwrap()
                        }
                        other => {
                            return Err(EngineError::InvalidArg(format!(
                                "RTT depth attachment must be a Texture, got {}",
                                other.kind_id().name()
                            )));
                        }
                    };
                    Some(handle)
                } else {
                    let desc = TextureDesc {
                        width: r.width,
                        height: r.height,
                        depth: 1,
                        dimension: TextureDimension::D2,
                        format: PixelFormat::Depth24Stencil8,
                        storage_mode: TextureStorageMode::Immutable,
                        min_filter: FilterMode::Nearest,
                        mag_filter: FilterMode::Nearest,
                        wrap_s: WrapMode::ClampToEdge,
                        wrap_t: WrapMode::ClampToEdge,
                        generate_mipmaps: false,
                    };
                    let handle = backend.create_texture(&desc)?;
                    r.auto_depth = Some(handle);
                    Some(handle)
                };
                let desc = RenderTargetDesc {
                    color_attachments,
                    depth_attachment,
                    width: r.width,
                    height: r.height,
                };
                r.render_target = Some(backend.create_render_target(&desc)?);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Class `release` hook (spec §4.2): frees GPU objects created by
/// `class_prefetch`. Textures referenced by other nodes (e.g. an RTT's
/// color attachment) are *not* freed here — they are owned by their own
/// `Texture` node and released independently through the generic recursion
/// (spec §3.7: "no GPU object is cross-owned").
fn class_release(kind: &mut NodeKind, backend: &mut dyn GraphicsBackend) {
    match kind {
        NodeKind::Shader(s) => {
            if let Some(p) = s.pipeline.take() {
                backend.free_pipeline(p);
            }
        }
        NodeKind::Texture(t) => {
            if let Some(h) = t.handle.take() {
                backend.free_texture(h);
            }
        }
        NodeKind::TexturedShape(ts) => {
            if let Some(b) = ts.vbo.take() {
                backend.free_buffer(b);
            }
            if let Some(b) = ts.ibo.take() {
                backend.free_buffer(b);
            }
        }
        NodeKind::Rtt(r) => {
            if let Some(rt) = r.render_target.take() {
                backend.free_render_target(rt);
            }
            if let Some(tex) = r.auto_depth.take() {
                backend.free_texture(tex);
            }
        }
        _ => {}
    }
}

/// `attach_ctx(node, ctx)` (spec §4.2). Fails with [`EngineError::InvalidUsage`]
/// if the node is already attached to a *different* context; attaching the
/// same context twice is a no-op recursion (harmless, matches the sample's
/// idempotent attach).
pub fn attach_ctx(node: &NodeHandle, ctx: CtxId) -> Result<()> {
    {
        let n = node.borrow();
        if let Some(existing) = n.ctx {
            if existing != ctx {
                return Err(EngineError::InvalidUsage(
                    "node is already attached to a different context".into(),
                ));
            }
            return Ok(());
        }
    }
    node.borrow_mut().ctx = Some(ctx);
    let children = node.borrow().reflected_children();
    for child in children {
        attach_ctx(&child, ctx)?;
    }
    Ok(())
}

/// `detach_ctx(node)` (spec §4.2): forces a transitive `uninit`, then clears
/// the context pointer down the subtree.
pub fn detach_ctx(node: &NodeHandle, backend: &mut dyn GraphicsBackend) {
    uninit(node, backend);
    node.borrow_mut().ctx = None;
    let children = node.borrow().reflected_children();
    for child in children {
        detach_ctx(&child, backend);
    }
}

/// `init(node)` (spec §4.2, §3.4). Idempotent once `Init`/`Ready`/`Idle`
/// (only `Uninit` actually runs the hook — `Idle` keeps its init-time
/// derivations per spec §3.4's "Ready → Idle on release(), ... keeping
/// Init-time derivations").
pub fn init(node: &NodeHandle) -> Result<()> {
    let needs_init = node.borrow().state == NodeState::Uninit;
    if !needs_init {
        return Ok(());
    }
    if node.borrow().ctx.is_none() {
        return Err(EngineError::InvalidUsage("init() requires an attached context".into()));
    }
    {
        let mut n = node.borrow_mut();
        class_init(&mut n.kind)?;
        n.ranges.sort_by(|a, b| {
            crate::render_range::start_time(a)
                .partial_cmp(&crate::render_range::start_time(b))
                .expect("range start_time is never NaN")
        });
        n.current_range = 0;
    }
    let glstates = node.borrow().glstates.clone();
    for g in &glstates {
        init(g)?;
    }
    node.borrow_mut().state = NodeState::Init;
    Ok(())
}

/// `prefetch(node)` (spec §4.2, §3.4): ensures `Init`, creates GPU objects,
/// transitions to `Ready`. Idempotent if already `Ready`.
pub fn prefetch(node: &NodeHandle, backend: &mut dyn GraphicsBackend) -> Result<()> {
    init(node)?;
    if node.borrow().state == NodeState::Ready {
        return Ok(());
    }
    {
        let mut n = node.borrow_mut();
        class_prefetch(&mut n.kind, backend)?;
        n.state = NodeState::Ready;
    }
    Ok(())
}

/// `release(node)` (spec §4.2, §3.4): no-op unless `Ready`; frees GPU
/// objects and transitions to `Idle`.
pub fn release(node: &NodeHandle, backend: &mut dyn GraphicsBackend) {
    if node.borrow().state != NodeState::Ready {
        return;
    }
    let mut n = node.borrow_mut();
    class_release(&mut n.kind, backend);
    n.state = NodeState::Idle;
}

/// `uninit(node)` (spec §4.2, §3.4): no-op if already `Uninit`; otherwise
/// `release`s first, resets derived fields, and transitions to `Uninit`.
pub fn uninit(node: &NodeHandle, backend: &mut dyn GraphicsBackend) {
    if node.borrow().state == NodeState::Uninit {
        return;
    }
    release(node, backend);
    let mut n = node.borrow_mut();
    class_reset_derived(&mut n.kind);
    n.last_update_time = -1.0;
    n.drawme = false;
    n.current_range = 0;
    n.state = NodeState::Uninit;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::node::factory;

    #[test]
    fn attach_propagates_through_reflected_children() {
        let shader = factory::shader();
        let shape = factory::quad([-0.5, -0.5, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let ts = factory::textured_shape(shape, shader.clone());
        attach_ctx(&ts, 1).unwrap();
        assert_eq!(shader.borrow().ctx, Some(1));
    }

    #[test]
    fn attach_to_second_context_fails() {
        let node = factory::shader();
        attach_ctx(&node, 1).unwrap();
        assert!(attach_ctx(&node, 2).is_err());
    }

    #[test]
    fn full_lifecycle_round_trip() {
        let mut backend = MockBackend::new();
        let node = factory::shader();
        attach_ctx(&node, 1).unwrap();
        prefetch(&node, &mut backend).unwrap();
        assert_eq!(node.borrow().state, NodeState::Ready);
        release(&node, &mut backend);
        assert_eq!(node.borrow().state, NodeState::Idle);
        uninit(&node, &mut backend);
        assert_eq!(node.borrow().state, NodeState::Uninit);
        if let NodeKind::Shader(s) = &node.borrow().kind {
            assert!(s.pipeline.is_none());
        }
    }

    #[test]
    fn param_mutation_forces_uninit_and_reinit_recovers() {
        let mut backend = MockBackend::new();
        let node = factory::quad([-0.5, -0.5, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        attach_ctx(&node, 1).unwrap();
        prefetch(&node, &mut backend).unwrap();
        crate::node::api::node_param_set(
            &node,
            "corner",
            crate::node::api::ParamValue::Vec3([0.0, 0.0, 0.0]),
        )
        .unwrap();
        assert_eq!(node.borrow().state, NodeState::Uninit);
        prefetch(&node, &mut backend).unwrap();
        if let NodeKind::Quad(q) = &node.borrow().kind {
            assert_eq!(q.mesh.vertices[0].position[0], 0.0);
        }
    }
}
