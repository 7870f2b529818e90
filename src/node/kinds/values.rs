//! Uniform and attribute node kinds (spec §6.3 "Values").

use crate::node::NodeHandle;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Scalar(f64),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    Mat4([f32; 16]),
}

/// `UniformScalar/Vec2/Vec3/Vec4/Int/Mat4` (spec §6.3). `value` is the
/// constructor-supplied constant; `animkf`, when non-empty, drives `current`
/// every `update` via the keyframe evaluator (§4.3) instead.
#[derive(Debug, Clone)]
pub struct Uniform {
    pub value: UniformValue,
    pub animkf: Vec<NodeHandle>,
    pub current: UniformValue,
    /// Resumable search position into `animkf` (spec §4.3: "search resumes
    /// from a cached cursor to keep playback O(1) amortized").
    pub cursor: usize,
}

impl Uniform {
    #[must_use]
    pub fn new(value: UniformValue) -> Self {
        Self { value, animkf: Vec::new(), current: value, cursor: 0 }
    }

    pub fn children(&self) -> SmallVec<[NodeHandle; 4]> {
        self.animkf.iter().cloned().collect()
    }
}

/// `UniformSampler` — binds a `Texture` node to a shader sampler slot.
#[derive(Debug, Clone, Default)]
pub struct UniformSampler {
    pub texture: Option<NodeHandle>,
}

impl UniformSampler {
    pub fn children(&self) -> SmallVec<[NodeHandle; 4]> {
        self.texture.iter().cloned().collect()
    }
}

/// `AttributeVec2/Vec3/Vec4` — a caller-supplied per-vertex attribute buffer
/// bound alongside the shape's interleaved geometry in a `TexturedShape`.
#[derive(Debug, Clone, Default)]
pub struct Attribute {
    pub dim: u8,
    pub data: Vec<f32>,
}

impl Attribute {
    #[must_use]
    pub fn new(dim: u8, data: Vec<f32>) -> Self {
        Self { dim, data }
    }
}
