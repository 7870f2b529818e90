//! Graphics-context abstraction (spec §4.8 — component J)
//!
//! The engine never calls a GPU API directly; every mutating or
//! resource-creating operation is dispatched through the [`GraphicsBackend`]
//! trait. Concrete backends live in [`wgpu_backend`] (the real thing, built
//! on `wgpu`, which is itself already an abstraction over GL/Vulkan/Metal/
//! D3D — the "OpenGL/OpenGLES/External-GL" tag of spec §4.8 becomes a
//! `wgpu::Backend` selection) and [`mock`] (a headless double used by this
//! crate's own tests and available to downstream callers who want to drive
//! a scene without a GPU).

pub mod formats;
pub mod mock;
pub mod state_cache;
pub mod wgpu_backend;

use crate::errors::Result;
use slotmap::new_key_type;

new_key_type! {
    /// Handle to a backend-owned GPU buffer.
    pub struct BufferHandle;
    /// Handle to a backend-owned GPU texture.
    pub struct TextureHandle;
    /// Handle to a backend-owned render target (framebuffer).
    pub struct RenderTargetHandle;
    /// Handle to a backend-owned graphics or compute pipeline.
    pub struct PipelineHandle;
}

/// Which physical backend family is in use (spec §4.8's `backend` tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    OpenGl,
    OpenGlEs,
    ExternalGl,
}

/// Which windowing platform the surface was created for. Purely
/// informational at this layer — platform bring-up itself is out of scope
/// (spec §1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    X11,
    Wayland,
    Win32,
    MacOs,
    Ios,
    Android,
    Offscreen,
}

/// Backend configuration (spec §6.1 `configure(Ctx, Config)`).
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub platform: PlatformKind,
    pub offscreen: bool,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub swap_interval: i32,
    pub viewport: Option<Viewport>,
    pub clear_color: [f32; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::OpenGl,
            platform: PlatformKind::Offscreen,
            offscreen: true,
            width: 1,
            height: 1,
            samples: 1,
            swap_interval: 1,
            viewport: None,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scissor {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

bitflags::bitflags! {
    /// Feature flags probed at context bring-up (spec §4.8 "Probing").
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u32 {
        const INSTANCING            = 1 << 0;
        const UNIFORM_BUFFER_OBJECT = 1 << 1;
        const STORAGE_BUFFER_OBJECT = 1 << 2;
        const IMAGE_LOAD_STORE      = 1 << 3;
        const VERTEX_ARRAY_OBJECT   = 1 << 4;
        const MULTIPLE_RENDER_TARGETS = 1 << 5;
        const FRAMEBUFFER_INVALIDATE = 1 << 6;
        const TEXTURE_3D            = 1 << 7;
        const TEXTURE_NPOT          = 1 << 8;
        const TEXTURE_STORAGE       = 1 << 9;
        const SYNC                  = 1 << 10;
        const EXTERNAL_OES          = 1 << 11;
        const EGL_IMAGE             = 1 << 12;
        const DMA_BUF_IMPORT        = 1 << 13;
        const COMPUTE               = 1 << 14;
    }
}

/// Pixel format, translated per-backend by [`formats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    R8Unorm,
    Rg8Unorm,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Rgba32Float,
    Depth24Stencil8,
    Depth32Float,
}

/// How a texture's storage is managed (spec §4.8 "three storage modes").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureStorageMode {
    /// No engine-side allocation; an externally imported handle (Android
    /// `MediaCodec` surface, CVPixelBuffer, dma-buf, external-OES).
    Opaque,
    /// Fixed storage allocated once (`TexStorage2D/3D` equivalent).
    Immutable,
    /// Storage allocated on init and respecified on every upload
    /// (`TexImage`/`TexSubImage` equivalent).
    Classic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureDimension {
    D2,
    D3,
    Cube,
}

#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub dimension: TextureDimension,
    pub format: PixelFormat,
    pub storage_mode: TextureStorageMode,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub generate_mipmaps: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
    LinearMipmapLinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
    Uniform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

#[derive(Debug, Clone)]
pub struct PipelineDesc {
    pub vertex_src: String,
    pub fragment_src: String,
    pub topology: PrimitiveTopology,
}

/// A value pushed to a pipeline's uniform slot by name (spec §4.7's
/// "uploads current uniform values by type"). Mirrors
/// [`crate::node::kinds::values::UniformValue`] one-for-one; kept as a
/// separate type here so the backend module has no dependency on the node
/// tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData {
    Scalar(f64),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    Mat4([f32; 16]),
}

#[derive(Debug, Clone)]
pub struct RenderTargetAttachment {
    pub texture: TextureHandle,
    pub resolve_target: Option<TextureHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct RenderTargetDesc {
    pub color_attachments: Vec<RenderTargetAttachment>,
    pub depth_attachment: Option<TextureHandle>,
    pub width: u32,
    pub height: u32,
}

/// The dispatch table a scene is drawn against (spec §4.8).
///
/// Methods return `Result<_>` for every fallible operation, per spec §7;
/// callers (the drawable node `prefetch`/`draw` implementations) propagate
/// the first error encountered and unwind through the paired `uninit` path.
pub trait GraphicsBackend {
    // -- Lifecycle ------------------------------------------------------
    fn configure(&mut self, config: &Config) -> Result<()>;
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
    fn make_current(&mut self, current: bool) -> Result<()>;
    fn swap_buffers(&mut self) -> Result<()>;
    fn set_swap_interval(&mut self, n: i32) -> Result<()>;
    fn set_surface_pts(&mut self, pts: f64) -> Result<()>;
    fn destroy(&mut self);

    // -- State ------------------------------------------------------------
    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>) -> Result<()>;
    fn current_render_target(&self) -> Option<RenderTargetHandle>;
    fn set_viewport(&mut self, viewport: Viewport);
    fn viewport(&self) -> Viewport;
    fn set_scissor(&mut self, scissor: Option<Scissor>);
    fn scissor(&self) -> Option<Scissor>;
    fn set_clear_color(&mut self, color: [f32; 4]);
    fn clear_color_value(&self) -> [f32; 4];
    fn clear_color(&mut self);
    fn clear_depth_stencil(&mut self, depth: f32, stencil: i32);
    fn invalidate_depth_stencil(&mut self) -> Result<()>;

    // -- Resources --------------------------------------------------------
    fn create_buffer(&mut self, usage: BufferUsage, size: usize) -> Result<BufferHandle>;
    fn upload_buffer(&mut self, handle: BufferHandle, offset: usize, data: &[u8]) -> Result<()>;
    fn free_buffer(&mut self, handle: BufferHandle);

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle>;
    fn upload_texture(&mut self, handle: TextureHandle, data: &[u8]) -> Result<()>;
    fn free_texture(&mut self, handle: TextureHandle);

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetHandle>;
    fn free_render_target(&mut self, handle: RenderTargetHandle);
    fn resolve_render_target(&mut self, handle: RenderTargetHandle) -> Result<()>;

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle>;
    fn free_pipeline(&mut self, handle: PipelineHandle);

    /// Updates a pipeline's named uniform slot (spec §4.7 "on draw: ...
    /// uploads current uniform values by type"). An unresolved name is a
    /// warning, not a failure (spec §7) — implementations simply drop the
    /// value rather than erroring.
    fn update_uniform(&mut self, pipeline: PipelineHandle, name: &str, value: UniformData) -> Result<()>;
    /// Binds a texture to a pipeline's named sampler slot together with its
    /// coordinate matrix and `(width, height)` dimensions (spec §4.7's
    /// `texi_sampler`/`texi_coords_matrix`/`texi_dimensions` trio, collapsed
    /// into one call since this abstraction has no separate location
    /// query).
    fn bind_texture(
        &mut self,
        pipeline: PipelineHandle,
        name: &str,
        texture: TextureHandle,
        coords_matrix: [f32; 16],
        dimensions: (u32, u32),
    ) -> Result<()>;
    /// Updates a pipeline's named vertex attribute buffer (spec §4.7 "sets
    /// vertex attribute pointers against the interleaved buffer").
    fn update_attribute(&mut self, pipeline: PipelineHandle, name: &str, dim: u8, data: &[f32]) -> Result<()>;

    fn draw(&mut self, pipeline: PipelineHandle, vertex_count: u32, instance_count: u32) -> Result<()>;
    fn draw_indexed(
        &mut self,
        pipeline: PipelineHandle,
        index_buffer: BufferHandle,
        index_format: IndexFormat,
        index_count: u32,
        instance_count: u32,
    ) -> Result<()>;
    fn dispatch(&mut self, pipeline: PipelineHandle, x: u32, y: u32, z: u32) -> Result<()>;

    /// Reads back a `width x height` RGBA8 region starting at `(x, y)` from
    /// the currently bound render target (spec §6.4's camera pipe-capture
    /// path). `Err(Unsupported)` if no render target is bound — reading the
    /// default framebuffer back is out of scope (spec §1: no windowing).
    fn read_pixels_rgba8(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>>;

    // -- Probing ------------------------------------------------------------
    fn features(&self) -> Features;
    fn max_compute_work_group_counts(&self) -> [u32; 3];
}
