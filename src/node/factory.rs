//! Node registry & factory (spec §4.1, component B).
//!
//! The original engine's factory takes a kind tag plus a variadic argument
//! pack matching the constructor parameters in schema order. In Rust, a
//! typed constructor function per kind plays that role directly — the
//! compiler enforces the argument types and count instead of a runtime
//! schema walk, while [`super::schema::schema_for`] still publishes the same
//! ordered constructor-parameter list for introspection callers.
//!
//! Every constructor returns a fresh node in [`NodeState::Uninit`] with
//! identity matrices and `refcount = 1` (implicit: the caller's `NodeHandle`
//! *is* the first strong reference, per spec §4.1).

use super::kinds::{anim::{AnimKeyFrame, KeyframeDim}, geometry, ranges, render, state, structural, values};
use super::{Node, NodeHandle, NodeKind};
use crate::animation::easing::Easing;
use crate::backend::PixelFormat;

#[must_use]
pub fn anim_keyframe_scalar(time: f64, value: f32, easing: Easing) -> NodeHandle {
    Node::new(NodeKind::AnimKeyFrameScalar(AnimKeyFrame { time, value: [value, 0.0, 0.0, 0.0], dim: KeyframeDim::Scalar, easing }))
}

#[must_use]
pub fn anim_keyframe_vec2(time: f64, value: [f32; 2], easing: Easing) -> NodeHandle {
    Node::new(NodeKind::AnimKeyFrameVec2(AnimKeyFrame { time, value: [value[0], value[1], 0.0, 0.0], dim: KeyframeDim::Vec2, easing }))
}

#[must_use]
pub fn anim_keyframe_vec3(time: f64, value: [f32; 3], easing: Easing) -> NodeHandle {
    Node::new(NodeKind::AnimKeyFrameVec3(AnimKeyFrame { time, value: [value[0], value[1], value[2], 0.0], dim: KeyframeDim::Vec3, easing }))
}

#[must_use]
pub fn anim_keyframe_vec4(time: f64, value: [f32; 4], easing: Easing) -> NodeHandle {
    Node::new(NodeKind::AnimKeyFrameVec4(AnimKeyFrame { time, value, dim: KeyframeDim::Vec4, easing }))
}

#[must_use]
pub fn uniform_scalar(value: f64) -> NodeHandle {
    Node::new(NodeKind::UniformScalar(values::Uniform::new(values::UniformValue::Scalar(value))))
}

#[must_use]
pub fn uniform_vec2(value: [f32; 2]) -> NodeHandle {
    Node::new(NodeKind::UniformVec2(values::Uniform::new(values::UniformValue::Vec2(value))))
}

#[must_use]
pub fn uniform_vec3(value: [f32; 3]) -> NodeHandle {
    Node::new(NodeKind::UniformVec3(values::Uniform::new(values::UniformValue::Vec3(value))))
}

#[must_use]
pub fn uniform_vec4(value: [f32; 4]) -> NodeHandle {
    Node::new(NodeKind::UniformVec4(values::Uniform::new(values::UniformValue::Vec4(value))))
}

#[must_use]
pub fn uniform_int(value: i32) -> NodeHandle {
    Node::new(NodeKind::UniformInt(values::Uniform::new(values::UniformValue::Int(value))))
}

#[must_use]
pub fn uniform_mat4(value: [f32; 16]) -> NodeHandle {
    Node::new(NodeKind::UniformMat4(values::Uniform::new(values::UniformValue::Mat4(value))))
}

#[must_use]
pub fn uniform_sampler() -> NodeHandle {
    Node::new(NodeKind::UniformSampler(values::UniformSampler::default()))
}

#[must_use]
pub fn attribute_vec2(data: Vec<f32>) -> NodeHandle {
    Node::new(NodeKind::AttributeVec2(values::Attribute::new(2, data)))
}

#[must_use]
pub fn attribute_vec3(data: Vec<f32>) -> NodeHandle {
    Node::new(NodeKind::AttributeVec3(values::Attribute::new(3, data)))
}

#[must_use]
pub fn attribute_vec4(data: Vec<f32>) -> NodeHandle {
    Node::new(NodeKind::AttributeVec4(values::Attribute::new(4, data)))
}

#[must_use]
pub fn quad(corner: [f32; 3], width: [f32; 3], height: [f32; 3]) -> NodeHandle {
    Node::new(NodeKind::Quad(geometry::Quad::new(corner, width, height)))
}

#[must_use]
pub fn triangle(e0: [f32; 3], e1: [f32; 3], e2: [f32; 3], uv0: [f32; 2], uv1: [f32; 2], uv2: [f32; 2]) -> NodeHandle {
    Node::new(NodeKind::Triangle(geometry::Triangle::new(e0, e1, e2, uv0, uv1, uv2)))
}

#[must_use]
pub fn shape_primitive(mesh: geometry::MeshData) -> NodeHandle {
    Node::new(NodeKind::ShapePrimitive(geometry::ShapePrimitive { mesh }))
}

#[must_use]
pub fn shape(mesh: geometry::MeshData) -> NodeHandle {
    Node::new(NodeKind::Shape(geometry::Shape { mesh }))
}

#[must_use]
pub fn shader() -> NodeHandle {
    Node::new(NodeKind::Shader(render::Shader::default()))
}

#[must_use]
pub fn shader_with_source(vertex_src: String, fragment_src: String) -> NodeHandle {
    Node::new(NodeKind::Shader(render::Shader { vertex_src, fragment_src, pipeline: None }))
}

#[must_use]
pub fn texture(width: u32, height: u32, format: PixelFormat) -> NodeHandle {
    Node::new(NodeKind::Texture(render::Texture::new(width, height, format)))
}

#[must_use]
pub fn texture_with_data(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> NodeHandle {
    let mut t = render::Texture::new(width, height, format);
    t.data = Some(data);
    Node::new(NodeKind::Texture(t))
}

#[must_use]
pub fn media(texture: NodeHandle, source: Option<Box<dyn render::FrameSource>>) -> NodeHandle {
    Node::new(NodeKind::Media(Box::new(render::Media {
        texture,
        source,
        time_remap: Vec::new(),
        time_remap_cursor: 0,
        last_frame_time: None,
    })))
}

#[must_use]
pub fn textured_shape(shape: NodeHandle, shader: NodeHandle) -> NodeHandle {
    Node::new(NodeKind::TexturedShape(render::TexturedShape {
        shape: Some(shape),
        shader: Some(shader),
        ..render::TexturedShape::default()
    }))
}

#[must_use]
pub fn camera(child: NodeHandle, eye: NodeHandle, center: NodeHandle, up: NodeHandle, perspective: render::Perspective) -> NodeHandle {
    Node::new(NodeKind::Camera(Box::new(render::Camera {
        child,
        eye,
        center,
        up,
        perspective,
        fov_anim: Vec::new(),
        fov_cursor: 0,
        pipe_fd: None,
        pipe_width: 0,
        pipe_height: 0,
    })))
}

#[must_use]
pub fn rtt(child: NodeHandle, width: u32, height: u32) -> NodeHandle {
    Node::new(NodeKind::Rtt(Box::new(render::Rtt {
        child,
        color_textures: Vec::new(),
        depth: None,
        width,
        height,
        samples: 1,
        render_target: None,
        prev_target: None,
        auto_depth: None,
    })))
}

#[must_use]
pub fn fps(child: NodeHandle, history_len: usize) -> NodeHandle {
    Node::new(NodeKind::Fps(Box::new(render::Fps::new(child, history_len))))
}

#[must_use]
pub fn gl_state(capability: u32, enabled: bool) -> NodeHandle {
    Node::new(NodeKind::GlState(state::GlState { capability, enabled }))
}

#[must_use]
pub fn gl_blend_state(blend: state::GlBlendState) -> NodeHandle {
    Node::new(NodeKind::GlBlendState(blend))
}

#[must_use]
pub fn gl_color_state(write_mask: [bool; 4]) -> NodeHandle {
    Node::new(NodeKind::GlColorState(state::GlColorState { write_mask }))
}

#[must_use]
pub fn gl_stencil_state(stencil: state::GlStencilState) -> NodeHandle {
    Node::new(NodeKind::GlStencilState(stencil))
}

#[must_use]
pub fn group(children: Vec<NodeHandle>) -> NodeHandle {
    Node::new(NodeKind::Group(structural::Group { children }))
}

#[must_use]
pub fn identity(child: Option<NodeHandle>) -> NodeHandle {
    Node::new(NodeKind::Identity(structural::Identity { child }))
}

#[must_use]
pub fn translate(child: NodeHandle, vector: [f32; 3]) -> NodeHandle {
    Node::new(NodeKind::Translate(Box::new(structural::Translate { child, vector, anim: Vec::new(), cursor: 0 })))
}

#[must_use]
pub fn rotate(child: NodeHandle, angle_deg: f64, axis: [f32; 3]) -> NodeHandle {
    Node::new(NodeKind::Rotate(Box::new(structural::Rotate { child, angle_deg, axis, anchor: [0.0; 3], anim: Vec::new(), cursor: 0 })))
}

#[must_use]
pub fn scale(child: NodeHandle, factors: [f32; 3]) -> NodeHandle {
    Node::new(NodeKind::Scale(Box::new(structural::Scale { child, factors, anchor: [0.0; 3], anim: Vec::new(), cursor: 0 })))
}

#[must_use]
pub fn range_continuous(start_time: f64) -> NodeHandle {
    Node::new(NodeKind::RangeContinuous(ranges::RangeContinuous { start_time }))
}

#[must_use]
pub fn range_no_render(start_time: f64) -> NodeHandle {
    Node::new(NodeKind::RangeNoRender(ranges::RangeNoRender { start_time }))
}

#[must_use]
pub fn range_once(start_time: f64, render_time: f64) -> NodeHandle {
    Node::new(NodeKind::RangeOnce(ranges::RangeOnce { start_time, render_time, updated: false }))
}
