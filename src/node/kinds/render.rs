//! Rendering node kinds (spec §4.7, §6.3 "Rendering"): `Shader`, `Texture`,
//! `Media`, `TexturedShape`, `Camera`, `RTT`, `FPS`.

use crate::backend::{
    BufferHandle, FilterMode, PipelineHandle, PixelFormat, RenderTargetHandle, TextureHandle,
    TextureStorageMode, WrapMode,
};
use crate::node::NodeHandle;
use smallvec::SmallVec;
use std::time::Duration;

/// Default shader sources exposing the conventional attribute/uniform names
/// `ngl_position`, `ngl_normal`, `ngl_modelview_matrix`, `ngl_projection_matrix`,
/// `ngl_normal_matrix` (spec §4.7 "Shader").
pub const DEFAULT_VERTEX_SRC: &str = include_str!("../../shaders/default.vert.wgsl");
pub const DEFAULT_FRAGMENT_SRC: &str = include_str!("../../shaders/default.frag.wgsl");

#[derive(Debug, Clone)]
pub struct Shader {
    pub vertex_src: String,
    pub fragment_src: String,
    pub pipeline: Option<PipelineHandle>,
}

impl Default for Shader {
    fn default() -> Self {
        Self {
            vertex_src: DEFAULT_VERTEX_SRC.to_string(),
            fragment_src: DEFAULT_FRAGMENT_SRC.to_string(),
            pipeline: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub storage_mode: TextureStorageMode,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub generate_mipmaps: bool,
    /// Constructor-supplied initial pixel data, if any.
    pub data: Option<Vec<u8>>,
    /// Derived at `prefetch`.
    pub handle: Option<TextureHandle>,
    /// Coordinate transform matrix, refreshed per media frame (spec §6.4,
    /// "a 4×4 coordinate matrix is populated per frame").
    pub coords_matrix: glam::Mat4,
}

impl Texture {
    #[must_use]
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            storage_mode: TextureStorageMode::Classic,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
            generate_mipmaps: false,
            data: None,
            handle: None,
            coords_matrix: glam::Mat4::IDENTITY,
        }
    }
}

/// A decoded frame handed to the engine by an external frame source (spec
/// §1, §6.4 — demuxing/decoding itself stays out of scope; this is the
/// contract the core consumes).
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
    pub coords_matrix: glam::Mat4,
}

/// The external collaborator producing timestamped frames (spec §1: "an
/// external frame source producing timestamped frames in a known pixel
/// layout"). Opaque-handle frames (`MediaCodec`/`CVPixelBuffer`/dma-buf) are
/// out of scope for this crate; only the software path is implemented.
pub trait FrameSource {
    fn frame_at(&mut self, t: f64) -> Option<Frame>;
}

pub struct Media {
    pub texture: NodeHandle,
    pub source: Option<Box<dyn FrameSource>>,
    /// Linear-only keyframes remapping playback time before it reaches
    /// `source` (spec §3.5: "Only linear easing is allowed for kf lists used
    /// as time remappers on media nodes").
    pub time_remap: Vec<NodeHandle>,
    pub time_remap_cursor: usize,
    /// Last frame pulled from `source`, kept so a redundant `frame_at` isn't
    /// issued for a `t` already uploaded this playback.
    pub last_frame_time: Option<f64>,
}

impl std::fmt::Debug for Media {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Media")
            .field("texture", &"NodeHandle")
            .field("has_source", &self.source.is_some())
            .field("time_remap", &self.time_remap.len())
            .finish()
    }
}

impl Media {
    pub fn children(&self) -> SmallVec<[NodeHandle; 4]> {
        let mut out: SmallVec<[NodeHandle; 4]> = SmallVec::new();
        out.push(self.texture.clone());
        out.extend(self.time_remap.iter().cloned());
        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct TexturedShape {
    pub shape: Option<NodeHandle>,
    pub shader: Option<NodeHandle>,
    pub textures: Vec<NodeHandle>,
    pub uniforms: Vec<NodeHandle>,
    pub attributes: Vec<NodeHandle>,
    pub vbo: Option<BufferHandle>,
    pub ibo: Option<BufferHandle>,
}

impl TexturedShape {
    pub fn children(&self) -> SmallVec<[NodeHandle; 8]> {
        let mut out: SmallVec<[NodeHandle; 8]> = SmallVec::new();
        out.extend(self.shape.iter().cloned());
        out.extend(self.shader.iter().cloned());
        out.extend(self.textures.iter().cloned());
        out.extend(self.uniforms.iter().cloned());
        out.extend(self.attributes.iter().cloned());
        out
    }
}

#[derive(Debug, Clone)]
pub struct Perspective {
    pub fov_deg: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

pub struct Camera {
    pub child: NodeHandle,
    pub eye: NodeHandle,
    pub center: NodeHandle,
    pub up: NodeHandle,
    pub perspective: Perspective,
    pub fov_anim: Vec<NodeHandle>,
    pub fov_cursor: usize,
    /// A non-negative file descriptor enables per-frame pipe capture (spec
    /// §6.4). Held as a raw fd so the core stays POSIX-generic; the caller
    /// owns the fd's lifetime.
    pub pipe_fd: Option<i32>,
    pub pipe_width: u32,
    pub pipe_height: u32,
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera")
            .field("perspective", &self.perspective)
            .field("pipe_fd", &self.pipe_fd)
            .finish_non_exhaustive()
    }
}

impl Camera {
    pub fn children(&self) -> SmallVec<[NodeHandle; 6]> {
        let mut out: SmallVec<[NodeHandle; 6]> = SmallVec::new();
        out.push(self.child.clone());
        out.push(self.eye.clone());
        out.push(self.center.clone());
        out.push(self.up.clone());
        out.extend(self.fov_anim.iter().cloned());
        out
    }
}

pub struct Rtt {
    pub child: NodeHandle,
    pub color_textures: Vec<NodeHandle>,
    /// Per spec §9 Open Question: if a depth `Texture` node is supplied it
    /// is attached; otherwise a renderbuffer-equivalent is synthesized.
    pub depth: Option<NodeHandle>,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub render_target: Option<RenderTargetHandle>,
    pub prev_target: Option<RenderTargetHandle>,
    /// The renderbuffer-equivalent depth texture synthesized by
    /// `class_prefetch` when `depth` is `None`. Owned by this node (unlike
    /// `depth`, which borrows a caller-supplied `Texture` node per spec
    /// §3.7), so it is freed alongside `render_target` on release.
    pub auto_depth: Option<TextureHandle>,
}

impl std::fmt::Debug for Rtt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rtt")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("samples", &self.samples)
            .finish_non_exhaustive()
    }
}

impl Rtt {
    pub fn children(&self) -> SmallVec<[NodeHandle; 4]> {
        let mut out: SmallVec<[NodeHandle; 4]> = SmallVec::new();
        out.push(self.child.clone());
        out.extend(self.color_textures.iter().cloned());
        out.extend(self.depth.iter().cloned());
        out
    }
}

/// `FPS` — a transparent timing wrapper around a child subtree (closed set,
/// spec §6.3; not elaborated in §4, grounded in `original_source/`'s
/// `measure_update`/`measure_draw` fields). Forwards every lifecycle hook to
/// `child` and records elapsed wall-clock time into a ring buffer.
#[derive(Debug)]
pub struct Fps {
    pub child: NodeHandle,
    pub history_len: usize,
    pub history: std::collections::VecDeque<(Duration, Duration)>,
}

impl Fps {
    #[must_use]
    pub fn new(child: NodeHandle, history_len: usize) -> Self {
        Self { child, history_len, history: std::collections::VecDeque::with_capacity(history_len) }
    }

    pub fn record(&mut self, update: Duration, draw: Duration) {
        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history.push_back((update, draw));
    }

    #[must_use]
    pub fn average_frame_time(&self) -> Duration {
        if self.history.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.history.iter().map(|(u, d)| *u + *d).sum();
        total / u32::try_from(self.history.len()).unwrap_or(1)
    }

    pub fn children(&self) -> SmallVec<[NodeHandle; 1]> {
        smallvec::smallvec![self.child.clone()]
    }
}
