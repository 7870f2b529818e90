//! Per-kind parameter schemas (spec §4.1, component A), one static table
//! per [`NodeKindId`](super::NodeKindId). These are consulted only at the
//! `node_param_set`/`node_param_add` validation boundary and by
//! introspection callers — never by the evaluation pipeline, which walks
//! [`super::Node::children`] instead.

use super::NodeKindId;
use crate::param::{DefaultValue, NodeSchema, ParamDescriptor, ParamType};

macro_rules! schema {
    ($name:ident, $params:expr) => {
        pub static $name: NodeSchema = NodeSchema { kind_name: stringify!($name), params: $params };
    };
}

const ANIMKF_PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::new("time", ParamType::Double, DefaultValue::Double(0.0)).constructor(),
    ParamDescriptor::new("value", ParamType::Vec4, DefaultValue::Vec4([0.0; 4])).constructor(),
    ParamDescriptor::new("easing", ParamType::String, DefaultValue::String("linear")),
];
schema!(ANIM_KEYFRAME_SCALAR, ANIMKF_PARAMS);
schema!(ANIM_KEYFRAME_VEC2, ANIMKF_PARAMS);
schema!(ANIM_KEYFRAME_VEC3, ANIMKF_PARAMS);
schema!(ANIM_KEYFRAME_VEC4, ANIMKF_PARAMS);

const UNIFORM_PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::new("value", ParamType::Vec4, DefaultValue::Vec4([0.0; 4])),
    ParamDescriptor::new("animkf", ParamType::NodeList, DefaultValue::None).with_allowed_kinds(&[
        NodeKindId::AnimKeyFrameScalar,
        NodeKindId::AnimKeyFrameVec2,
        NodeKindId::AnimKeyFrameVec3,
        NodeKindId::AnimKeyFrameVec4,
    ]),
];
schema!(UNIFORM_SCALAR, UNIFORM_PARAMS);
schema!(UNIFORM_VEC2, UNIFORM_PARAMS);
schema!(UNIFORM_VEC3, UNIFORM_PARAMS);
schema!(UNIFORM_VEC4, UNIFORM_PARAMS);
schema!(UNIFORM_INT, UNIFORM_PARAMS);
schema!(UNIFORM_MAT4, UNIFORM_PARAMS);

schema!(
    UNIFORM_SAMPLER,
    &[ParamDescriptor::new("texture", ParamType::NodeRef, DefaultValue::None)
        .with_allowed_kinds(&[NodeKindId::Texture])]
);

const ATTRIBUTE_PARAMS: &[ParamDescriptor] =
    &[ParamDescriptor::new("data", ParamType::DoubleList, DefaultValue::None).constructor()];
schema!(ATTRIBUTE_VEC2, ATTRIBUTE_PARAMS);
schema!(ATTRIBUTE_VEC3, ATTRIBUTE_PARAMS);
schema!(ATTRIBUTE_VEC4, ATTRIBUTE_PARAMS);

schema!(
    QUAD,
    &[
        ParamDescriptor::new("corner", ParamType::Vec3, DefaultValue::Vec3([-0.5, -0.5, 0.0])).constructor(),
        ParamDescriptor::new("width", ParamType::Vec3, DefaultValue::Vec3([1.0, 0.0, 0.0])).constructor(),
        ParamDescriptor::new("height", ParamType::Vec3, DefaultValue::Vec3([0.0, 1.0, 0.0])).constructor(),
    ]
);

schema!(
    TRIANGLE,
    &[
        ParamDescriptor::new("edge0", ParamType::Vec3, DefaultValue::None).constructor(),
        ParamDescriptor::new("edge1", ParamType::Vec3, DefaultValue::None).constructor(),
        ParamDescriptor::new("edge2", ParamType::Vec3, DefaultValue::None).constructor(),
    ]
);

schema!(SHAPE_PRIMITIVE, &[]);
schema!(SHAPE, &[]);

schema!(
    SHADER,
    &[
        ParamDescriptor::new("vertex", ParamType::String, DefaultValue::None),
        ParamDescriptor::new("fragment", ParamType::String, DefaultValue::None),
    ]
);

schema!(
    TEXTURE,
    &[
        ParamDescriptor::new("width", ParamType::Int, DefaultValue::Int(0)).constructor(),
        ParamDescriptor::new("height", ParamType::Int, DefaultValue::Int(0)).constructor(),
        ParamDescriptor::new("format", ParamType::Select(&["r8", "rg8", "rgba8", "rgba8_srgb", "rgba32f"]), DefaultValue::String("rgba8")),
    ]
);

schema!(
    MEDIA,
    &[
        ParamDescriptor::new("texture", ParamType::NodeRef, DefaultValue::None)
            .constructor()
            .with_allowed_kinds(&[NodeKindId::Texture]),
        ParamDescriptor::new("time_remap", ParamType::NodeList, DefaultValue::None).with_allowed_kinds(&[
            NodeKindId::AnimKeyFrameScalar,
        ]),
    ]
);

schema!(
    TEXTURED_SHAPE,
    &[
        ParamDescriptor::new("shape", ParamType::NodeRef, DefaultValue::None)
            .constructor()
            .with_allowed_kinds(&[NodeKindId::Quad, NodeKindId::Triangle, NodeKindId::ShapePrimitive, NodeKindId::Shape]),
        ParamDescriptor::new("shader", ParamType::NodeRef, DefaultValue::None)
            .constructor()
            .with_allowed_kinds(&[NodeKindId::Shader]),
        ParamDescriptor::new("textures", ParamType::NodeList, DefaultValue::None).with_allowed_kinds(&[NodeKindId::Texture]),
        ParamDescriptor::new("uniforms", ParamType::NodeList, DefaultValue::None),
        ParamDescriptor::new("attributes", ParamType::NodeList, DefaultValue::None),
    ]
);

schema!(
    CAMERA,
    &[
        ParamDescriptor::new("child", ParamType::NodeRef, DefaultValue::None).constructor(),
        ParamDescriptor::new("eye", ParamType::NodeRef, DefaultValue::None).with_allowed_kinds(&[NodeKindId::Identity]),
        ParamDescriptor::new("center", ParamType::NodeRef, DefaultValue::None).with_allowed_kinds(&[NodeKindId::Identity]),
        ParamDescriptor::new("up", ParamType::NodeRef, DefaultValue::None).with_allowed_kinds(&[NodeKindId::Identity]),
        ParamDescriptor::new("fov", ParamType::Double, DefaultValue::Double(60.0)),
        ParamDescriptor::new("fov_anim", ParamType::NodeList, DefaultValue::None).with_allowed_kinds(&[
            NodeKindId::AnimKeyFrameScalar,
        ]),
        ParamDescriptor::new("pipe_fd", ParamType::Int, DefaultValue::Int(-1)),
    ]
);

schema!(
    RTT,
    &[
        ParamDescriptor::new("child", ParamType::NodeRef, DefaultValue::None).constructor(),
        ParamDescriptor::new("color_textures", ParamType::NodeList, DefaultValue::None).with_allowed_kinds(&[NodeKindId::Texture]),
        ParamDescriptor::new("depth_texture", ParamType::NodeRef, DefaultValue::None).with_allowed_kinds(&[NodeKindId::Texture]),
        ParamDescriptor::new("samples", ParamType::Int, DefaultValue::Int(1)),
    ]
);

schema!(
    FPS,
    &[
        ParamDescriptor::new("child", ParamType::NodeRef, DefaultValue::None).constructor(),
        ParamDescriptor::new("history_len", ParamType::Int, DefaultValue::Int(60)),
    ]
);

schema!(
    GL_STATE,
    &[ParamDescriptor::new("enabled", ParamType::Int, DefaultValue::Int(1))]
);
schema!(
    GL_BLEND_STATE,
    &[ParamDescriptor::new("enabled", ParamType::Int, DefaultValue::Int(1))]
);
schema!(GL_COLOR_STATE, &[]);
schema!(GL_STENCIL_STATE, &[]);

schema!(
    GROUP,
    &[ParamDescriptor::new("children", ParamType::NodeList, DefaultValue::None)]
);
schema!(
    IDENTITY,
    &[ParamDescriptor::new("child", ParamType::NodeRef, DefaultValue::None)]
);
const ANIM_SCALAR_LIST: &[NodeKindId] = &[NodeKindId::AnimKeyFrameScalar];
const ANIM_VEC3_LIST: &[NodeKindId] = &[NodeKindId::AnimKeyFrameVec3];

schema!(
    TRANSLATE,
    &[
        ParamDescriptor::new("child", ParamType::NodeRef, DefaultValue::None).constructor(),
        ParamDescriptor::new("vector", ParamType::Vec3, DefaultValue::Vec3([0.0; 3])),
        ParamDescriptor::new("anim", ParamType::NodeList, DefaultValue::None).with_allowed_kinds(ANIM_VEC3_LIST),
    ]
);
schema!(
    ROTATE,
    &[
        ParamDescriptor::new("child", ParamType::NodeRef, DefaultValue::None).constructor(),
        ParamDescriptor::new("angle", ParamType::Double, DefaultValue::Double(0.0)),
        ParamDescriptor::new("axis", ParamType::Vec3, DefaultValue::Vec3([0.0, 0.0, 1.0])),
        ParamDescriptor::new("anim", ParamType::NodeList, DefaultValue::None).with_allowed_kinds(ANIM_SCALAR_LIST),
    ]
);
schema!(
    SCALE,
    &[
        ParamDescriptor::new("child", ParamType::NodeRef, DefaultValue::None).constructor(),
        ParamDescriptor::new("factors", ParamType::Vec3, DefaultValue::Vec3([1.0; 3])),
        ParamDescriptor::new("anim", ParamType::NodeList, DefaultValue::None).with_allowed_kinds(ANIM_VEC3_LIST),
    ]
);

schema!(
    RANGE_CONTINUOUS,
    &[ParamDescriptor::new("start_time", ParamType::Double, DefaultValue::Double(0.0)).constructor()]
);
schema!(
    RANGE_NO_RENDER,
    &[ParamDescriptor::new("start_time", ParamType::Double, DefaultValue::Double(0.0)).constructor()]
);
schema!(
    RANGE_ONCE,
    &[
        ParamDescriptor::new("start_time", ParamType::Double, DefaultValue::Double(0.0)).constructor(),
        ParamDescriptor::new("render_time", ParamType::Double, DefaultValue::Double(0.0)).constructor(),
    ]
);

/// The schema for a given kind (spec §4.1 "an ordered parameter schema").
#[must_use]
pub fn schema_for(kind: NodeKindId) -> &'static NodeSchema {
    match kind {
        NodeKindId::AnimKeyFrameScalar => &ANIM_KEYFRAME_SCALAR,
        NodeKindId::AnimKeyFrameVec2 => &ANIM_KEYFRAME_VEC2,
        NodeKindId::AnimKeyFrameVec3 => &ANIM_KEYFRAME_VEC3,
        NodeKindId::AnimKeyFrameVec4 => &ANIM_KEYFRAME_VEC4,
        NodeKindId::UniformScalar => &UNIFORM_SCALAR,
        NodeKindId::UniformVec2 => &UNIFORM_VEC2,
        NodeKindId::UniformVec3 => &UNIFORM_VEC3,
        NodeKindId::UniformVec4 => &UNIFORM_VEC4,
        NodeKindId::UniformInt => &UNIFORM_INT,
        NodeKindId::UniformMat4 => &UNIFORM_MAT4,
        NodeKindId::UniformSampler => &UNIFORM_SAMPLER,
        NodeKindId::AttributeVec2 => &ATTRIBUTE_VEC2,
        NodeKindId::AttributeVec3 => &ATTRIBUTE_VEC3,
        NodeKindId::AttributeVec4 => &ATTRIBUTE_VEC4,
        NodeKindId::Quad => &QUAD,
        NodeKindId::Triangle => &TRIANGLE,
        NodeKindId::ShapePrimitive => &SHAPE_PRIMITIVE,
        NodeKindId::Shape => &SHAPE,
        NodeKindId::Shader => &SHADER,
        NodeKindId::Texture => &TEXTURE,
        NodeKindId::Media => &MEDIA,
        NodeKindId::TexturedShape => &TEXTURED_SHAPE,
        NodeKindId::Camera => &CAMERA,
        NodeKindId::Rtt => &RTT,
        NodeKindId::Fps => &FPS,
        NodeKindId::GlState => &GL_STATE,
        NodeKindId::GlBlendState => &GL_BLEND_STATE,
        NodeKindId::GlColorState => &GL_COLOR_STATE,
        NodeKindId::GlStencilState => &GL_STENCIL_STATE,
        NodeKindId::Group => &GROUP,
        NodeKindId::Identity => &IDENTITY,
        NodeKindId::Translate => &TRANSLATE,
        NodeKindId::Rotate => &ROTATE,
        NodeKindId::Scale => &SCALE,
        NodeKindId::RangeContinuous => &RANGE_CONTINUOUS,
        NodeKindId::RangeNoRender => &RANGE_NO_RENDER,
        NodeKindId::RangeOnce => &RANGE_ONCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_schema_with_a_matching_name_prefix() {
        for kind in [NodeKindId::Quad, NodeKindId::Camera, NodeKindId::RangeOnce, NodeKindId::UniformSampler] {
            let schema = schema_for(kind);
            assert!(!schema.kind_name.is_empty());
        }
    }

    #[test]
    fn media_texture_slot_only_accepts_texture_kind() {
        let schema = schema_for(NodeKindId::Media);
        let texture_param = schema.find("texture").unwrap();
        assert!(texture_param.accepts_kind(NodeKindId::Texture));
        assert!(!texture_param.accepts_kind(NodeKindId::Quad));
    }
}
