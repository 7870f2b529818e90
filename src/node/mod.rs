//! The node runtime: typed-node data model (spec §3), reflected across
//! components B (registry/factory) and C (reference-counted handle).
//!
//! A node is `Rc<RefCell<Node>>` (REDESIGN FLAGS: replace the manual atomic
//! refcount with a shared-ownership handle whose cycle freedom is preserved
//! by construction — the builder API below only ever yields parent→child
//! edges). `NodeKind` is a tagged sum over the closed kind set of spec §6.3
//! rather than a runtime-dispatched class table, so the compiler checks
//! exhaustiveness on every `match` over it.

pub mod api;
pub mod factory;
pub mod kinds;
pub mod schema;

use kinds::{anim::AnimKeyFrame, geometry, ranges, render, state, structural, values};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

/// Identifies the [`crate::context::Ctx`] a node is attached to. Plain
/// numeric identity — nodes never hold a reference back to their context
/// (REDESIGN FLAGS: make attach/detach distinct operations rather than a
/// nullable context pointer); the evaluation pipeline always threads the
/// context's backend in explicitly instead.
pub type CtxId = u64;

pub type NodeHandle = Rc<RefCell<Node>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Uninit,
    Init,
    Ready,
    Idle,
}

/// Tag identifying a node's kind — the closed set of spec §6.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKindId {
    AnimKeyFrameScalar,
    AnimKeyFrameVec2,
    AnimKeyFrameVec3,
    AnimKeyFrameVec4,
    UniformScalar,
    UniformVec2,
    UniformVec3,
    UniformVec4,
    UniformInt,
    UniformMat4,
    UniformSampler,
    AttributeVec2,
    AttributeVec3,
    AttributeVec4,
    Quad,
    Triangle,
    ShapePrimitive,
    Shape,
    Shader,
    Texture,
    Media,
    TexturedShape,
    Camera,
    Rtt,
    Fps,
    GlState,
    GlBlendState,
    GlColorState,
    GlStencilState,
    Group,
    Identity,
    Translate,
    Rotate,
    Scale,
    RangeContinuous,
    RangeNoRender,
    RangeOnce,
}

impl NodeKindId {
    #[must_use]
    pub const fn name(self) -> &'static str {
        use NodeKindId::*;
        match self {
            AnimKeyFrameScalar => "AnimKeyFrameScalar",
            AnimKeyFrameVec2 => "AnimKeyFrameVec2",
            AnimKeyFrameVec3 => "AnimKeyFrameVec3",
            AnimKeyFrameVec4 => "AnimKeyFrameVec4",
            UniformScalar => "UniformScalar",
            UniformVec2 => "UniformVec2",
            UniformVec3 => "UniformVec3",
            UniformVec4 => "UniformVec4",
            UniformInt => "UniformInt",
            UniformMat4 => "UniformMat4",
            UniformSampler => "UniformSampler",
            AttributeVec2 => "AttributeVec2",
            AttributeVec3 => "AttributeVec3",
            AttributeVec4 => "AttributeVec4",
            Quad => "Quad",
            Triangle => "Triangle",
            ShapePrimitive => "ShapePrimitive",
            Shape => "Shape",
            Shader => "Shader",
            Texture => "Texture",
            Media => "Media",
            TexturedShape => "TexturedShape",
            Camera => "Camera",
            Rtt => "RTT",
            Fps => "FPS",
            GlState => "GLState",
            GlBlendState => "GLBlendState",
            GlColorState => "GLColorState",
            GlStencilState => "GLStencilState",
            Group => "Group",
            Identity => "Identity",
            Translate => "Translate",
            Rotate => "Rotate",
            Scale => "Scale",
            RangeContinuous => "RenderRangeContinuous",
            RangeNoRender => "RenderRangeNoRender",
            RangeOnce => "RenderRangeOnce",
        }
    }
}

/// The per-kind private-data region (spec §3.2), as a tagged sum instead of
/// a byte-offset `priv_data` blob.
#[derive(Debug)]
pub enum NodeKind {
    AnimKeyFrameScalar(AnimKeyFrame),
    AnimKeyFrameVec2(AnimKeyFrame),
    AnimKeyFrameVec3(AnimKeyFrame),
    AnimKeyFrameVec4(AnimKeyFrame),
    UniformScalar(values::Uniform),
    UniformVec2(values::Uniform),
    UniformVec3(values::Uniform),
    UniformVec4(values::Uniform),
    UniformInt(values::Uniform),
    UniformMat4(values::Uniform),
    UniformSampler(values::UniformSampler),
    AttributeVec2(values::Attribute),
    AttributeVec3(values::Attribute),
    AttributeVec4(values::Attribute),
    Quad(geometry::Quad),
    Triangle(geometry::Triangle),
    ShapePrimitive(geometry::ShapePrimitive),
    Shape(geometry::Shape),
    Shader(render::Shader),
    Texture(render::Texture),
    Media(Box<render::Media>),
    TexturedShape(render::TexturedShape),
    Camera(Box<render::Camera>),
    Rtt(Box<render::Rtt>),
    Fps(Box<render::Fps>),
    GlState(state::GlState),
    GlBlendState(state::GlBlendState),
    GlColorState(state::GlColorState),
    GlStencilState(state::GlStencilState),
    Group(structural::Group),
    Identity(structural::Identity),
    Translate(Box<structural::Translate>),
    Rotate(Box<structural::Rotate>),
    Scale(Box<structural::Scale>),
    RangeContinuous(ranges::RangeContinuous),
    RangeNoRender(ranges::RangeNoRender),
    RangeOnce(ranges::RangeOnce),
}

impl NodeKind {
    #[must_use]
    pub fn kind_id(&self) -> NodeKindId {
        match self {
            NodeKind::AnimKeyFrameScalar(_) => NodeKindId::AnimKeyFrameScalar,
            NodeKind::AnimKeyFrameVec2(_) => NodeKindId::AnimKeyFrameVec2,
            NodeKind::AnimKeyFrameVec3(_) => NodeKindId::AnimKeyFrameVec3,
            NodeKind::AnimKeyFrameVec4(_) => NodeKindId::AnimKeyFrameVec4,
            NodeKind::UniformScalar(_) => NodeKindId::UniformScalar,
            NodeKind::UniformVec2(_) => NodeKindId::UniformVec2,
            NodeKind::UniformVec3(_) => NodeKindId::UniformVec3,
            NodeKind::UniformVec4(_) => NodeKindId::UniformVec4,
            NodeKind::UniformInt(_) => NodeKindId::UniformInt,
            NodeKind::UniformMat4(_) => NodeKindId::UniformMat4,
            NodeKind::UniformSampler(_) => NodeKindId::UniformSampler,
            NodeKind::AttributeVec2(_) => NodeKindId::AttributeVec2,
            NodeKind::AttributeVec3(_) => NodeKindId::AttributeVec3,
            NodeKind::AttributeVec4(_) => NodeKindId::AttributeVec4,
            NodeKind::Quad(_) => NodeKindId::Quad,
            NodeKind::Triangle(_) => NodeKindId::Triangle,
            NodeKind::ShapePrimitive(_) => NodeKindId::ShapePrimitive,
            NodeKind::Shape(_) => NodeKindId::Shape,
            NodeKind::Shader(_) => NodeKindId::Shader,
            NodeKind::Texture(_) => NodeKindId::Texture,
            NodeKind::Media(_) => NodeKindId::Media,
            NodeKind::TexturedShape(_) => NodeKindId::TexturedShape,
            NodeKind::Camera(_) => NodeKindId::Camera,
            NodeKind::Rtt(_) => NodeKindId::Rtt,
            NodeKind::Fps(_) => NodeKindId::Fps,
            NodeKind::GlState(_) => NodeKindId::GlState,
            NodeKind::GlBlendState(_) => NodeKindId::GlBlendState,
            NodeKind::GlColorState(_) => NodeKindId::GlColorState,
            NodeKind::GlStencilState(_) => NodeKindId::GlStencilState,
            NodeKind::Group(_) => NodeKindId::Group,
            NodeKind::Identity(_) => NodeKindId::Identity,
            NodeKind::Translate(_) => NodeKindId::Translate,
            NodeKind::Rotate(_) => NodeKindId::Rotate,
            NodeKind::Scale(_) => NodeKindId::Scale,
            NodeKind::RangeContinuous(_) => NodeKindId::RangeContinuous,
            NodeKind::RangeNoRender(_) => NodeKindId::RangeNoRender,
            NodeKind::RangeOnce(_) => NodeKindId::RangeOnce,
        }
    }

    /// The kind-specific children reachable through this node's own
    /// parameter slots (not including the common `glstates`/`ranges`
    /// lists — see [`Node::reflected_children`]). This is what the
    /// evaluation pipeline (component H) recurses through.
    #[must_use]
    pub fn children(&self) -> SmallVec<[NodeHandle; 4]> {
        match self {
            NodeKind::UniformScalar(u)
            | NodeKind::UniformVec2(u)
            | NodeKind::UniformVec3(u)
            | NodeKind::UniformVec4(u)
            | NodeKind::UniformInt(u)
            | NodeKind::UniformMat4(u) => u.children(),
            NodeKind::UniformSampler(s) => s.children(),
            NodeKind::Media(m) => m.children(),
            NodeKind::TexturedShape(t) => t.children().into_iter().collect(),
            NodeKind::Camera(c) => c.children().into_iter().collect(),
            NodeKind::Rtt(r) => r.children().into_iter().collect(),
            NodeKind::Fps(f) => f.children().into_iter().collect(),
            NodeKind::Group(g) => g.children(),
            NodeKind::Identity(i) => i.children(),
            NodeKind::Translate(t) => t.children(),
            NodeKind::Rotate(r) => r.children(),
            NodeKind::Scale(s) => s.children(),
            NodeKind::AnimKeyFrameScalar(_)
            | NodeKind::AnimKeyFrameVec2(_)
            | NodeKind::AnimKeyFrameVec3(_)
            | NodeKind::AnimKeyFrameVec4(_)
            | NodeKind::AttributeVec2(_)
            | NodeKind::AttributeVec3(_)
            | NodeKind::AttributeVec4(_)
            | NodeKind::Quad(_)
            | NodeKind::Triangle(_)
            | NodeKind::ShapePrimitive(_)
            | NodeKind::Shape(_)
            | NodeKind::Shader(_)
            | NodeKind::Texture(_)
            | NodeKind::GlState(_)
            | NodeKind::GlBlendState(_)
            | NodeKind::GlColorState(_)
            | NodeKind::GlStencilState(_)
            | NodeKind::RangeContinuous(_)
            | NodeKind::RangeNoRender(_)
            | NodeKind::RangeOnce(_) => SmallVec::new(),
        }
    }
}

/// The common fields every node carries regardless of kind (spec §3.1).
pub struct Node {
    pub kind: NodeKind,
    pub name: Option<String>,
    pub modelview_matrix: glam::Mat4,
    pub projection_matrix: glam::Mat4,
    pub state: NodeState,
    pub ctx: Option<CtxId>,
    /// Negative sentinel ("never") per spec §3.1; `-1.0` plays that role.
    pub last_update_time: f64,
    pub drawme: bool,
    /// The frame epoch (the `t` of the current `draw` call) this node was
    /// last visited at, used to coalesce multi-parent visits (spec §4.5).
    pub active_time: Option<f64>,
    pub is_active: bool,
    pub glstates: Vec<NodeHandle>,
    pub ranges: Vec<NodeHandle>,
    pub current_range: usize,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind) -> NodeHandle {
        Rc::new(RefCell::new(Self {
            kind,
            name: None,
            modelview_matrix: glam::Mat4::IDENTITY,
            projection_matrix: glam::Mat4::IDENTITY,
            state: NodeState::Uninit,
            ctx: None,
            last_update_time: -1.0,
            drawme: false,
            active_time: None,
            is_active: false,
            glstates: Vec::new(),
            ranges: Vec::new(),
            current_range: 0,
        }))
    }

    #[must_use]
    pub fn kind_id(&self) -> NodeKindId {
        self.kind.kind_id()
    }

    /// Kind-specific children only — what the evaluation pipeline (H) walks.
    #[must_use]
    pub fn children(&self) -> SmallVec<[NodeHandle; 4]> {
        self.kind.children()
    }

    /// Kind-specific children plus the common-schema `glstates`/`ranges`
    /// lists (spec §4.2: `attach_ctx` "recursively attach[es] it to every
    /// child found through parameter reflection (both the class schema and
    /// the common schema)").
    #[must_use]
    pub fn reflected_children(&self) -> SmallVec<[NodeHandle; 8]> {
        let mut out: SmallVec<[NodeHandle; 8]> = self.kind.children().into_iter().collect();
        out.extend(self.glstates.iter().cloned());
        out.extend(self.ranges.iter().cloned());
        out
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind.kind_id().name())
            .field("name", &self.name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Two handles are the same node iff they reference the same allocation
/// (spec §3.1: "Node identity is nominal").
#[must_use]
pub fn same_node(a: &NodeHandle, b: &NodeHandle) -> bool {
    Rc::ptr_eq(a, b)
}
