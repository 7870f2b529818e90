//! A headless [`GraphicsBackend`] with no real GPU (REDESIGN FLAGS: "a mock
//! for tests").
//!
//! `MockBackend` allocates nothing on a device; it just bookkeeps what was
//! asked of it (bound render target, viewport, clear color, draw-call
//! counts per pipeline) so tests can assert on the evaluation pipeline's
//! *behavior* — what gets prefetched, released, and drawn, and in what
//! order — without needing an actual rasterizer.

use super::{
    BackendKind, BufferHandle, BufferUsage, Config, Features, GraphicsBackend, IndexFormat,
    PipelineDesc, PipelineHandle, PlatformKind, RenderTargetDesc, RenderTargetHandle, Scissor,
    TextureDesc, TextureHandle, UniformData, Viewport,
};
use crate::errors::Result;
use slotmap::SlotMap;
use std::collections::HashMap;

#[derive(Default)]
pub struct MockBackend {
    pub configured: bool,
    pub viewport: Viewport,
    pub scissor: Option<Scissor>,
    pub clear_color: [f32; 4],
    pub current_target: Option<RenderTargetHandle>,
    pub swap_count: u32,
    pub draw_calls: u32,
    pub draw_indexed_calls: u32,
    pub dispatch_calls: u32,
    pub buffers: SlotMap<BufferHandle, Vec<u8>>,
    pub textures: SlotMap<TextureHandle, TextureDesc>,
    pub render_targets: SlotMap<RenderTargetHandle, RenderTargetDesc>,
    pub pipelines: SlotMap<PipelineHandle, PipelineDesc>,
    pub uniform_updates: u32,
    pub texture_binds: u32,
    pub attribute_updates: u32,
    /// Last uniform value pushed per name, across all pipelines — enough
    /// for tests to assert a value actually reached the backend without
    /// needing a full per-pipeline binding model.
    pub last_uniforms: HashMap<String, UniformData>,
    /// Buffer handed back by the next `read_pixels_rgba8` call; defaults to
    /// `width * height * 4` zero bytes when unset.
    pub pixel_readback: Option<Vec<u8>>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphicsBackend for MockBackend {
    fn configure(&mut self, config: &Config) -> Result<()> {
        self.configured = true;
        self.viewport = Viewport { x: 0, y: 0, width: config.width, height: config.height };
        self.clear_color = config.clear_color;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.viewport = Viewport { x: 0, y: 0, width, height };
        Ok(())
    }

    fn make_current(&mut self, _current: bool) -> Result<()> {
        Ok(())
    }

    fn swap_buffers(&mut self) -> Result<()> {
        self.swap_count += 1;
        Ok(())
    }

    fn set_swap_interval(&mut self, _n: i32) -> Result<()> {
        Ok(())
    }

    fn set_surface_pts(&mut self, _pts: f64) -> Result<()> {
        Ok(())
    }

    fn destroy(&mut self) {
        self.configured = false;
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

    fn clear_color(&mut self) {}

    fn clear_depth_stencil(&mut self, _depth: f32, _stencil: i32) {}

    fn invalidate_depth_stencil(&mut self) -> Result<()> {
        Ok(())
    }

    fn create_buffer(&mut self, _usage: BufferUsage, size: usize) -> Result<BufferHandle> {
        Ok(self.buffers.insert(vec![0u8; size]))
    }

    fn upload_buffer(&mut self, handle: BufferHandle, offset: usize, data: &[u8]) -> Result<()> {
        let buf = self
            .buffers
            .get_mut(handle)
            .ok_or_else(|| crate::errors::EngineError::InvalidArg("unknown buffer".into()))?;
        let end = offset + data.len();
        if end > buf.len() {
            buf.resize(end, 0);
        }
        buf[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn free_buffer(&mut self, handle: BufferHandle) {
        self.buffers.remove(handle);
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        Ok(self.textures.insert(desc.clone()))
    }

    fn upload_texture(&mut self, handle: TextureHandle, _data: &[u8]) -> Result<()> {
        if self.textures.contains_key(handle) {
            Ok(())
        } else {
            Err(crate::errors::EngineError::InvalidArg("unknown texture".into()))
        }
    }

    fn free_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(handle);
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetHandle> {
        Ok(self.render_targets.insert(desc.clone()))
    }

    fn free_render_target(&mut self, handle: RenderTargetHandle) {
        self.render_targets.remove(handle);
    }

    fn resolve_render_target(&mut self, _handle: RenderTargetHandle) -> Result<()> {
        Ok(())
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle> {
        Ok(self.pipelines.insert(desc.clone()))
    }

    fn free_pipeline(&mut self, handle: PipelineHandle) {
        self.pipelines.remove(handle);
    }

    fn update_uniform(&mut self, pipeline: PipelineHandle, name: &str, value: UniformData) -> Result<()> {
        if !self.pipelines.contains_key(pipeline) {
            return Err(crate::errors::EngineError::InvalidArg("unknown pipeline".into()));
        }
        self.uniform_updates += 1;
        self.last_uniforms.insert(name.to_string(), value);
        Ok(())
    }

    fn bind_texture(
        &mut self,
        pipeline: PipelineHandle,
        _name: &str,
        texture: TextureHandle,
        _coords_matrix: [f32; 16],
        _dimensions: (u32, u32),
    ) -> Result<()> {
        if !self.pipelines.contains_key(pipeline) {
            return Err(crate::errors::EngineError::InvalidArg("unknown pipeline".into()));
        }
        if !self.textures.contains_key(texture) {
            return Err(crate::errors::EngineError::InvalidArg("unknown texture".into()));
        }
        self.texture_binds += 1;
        Ok(())
    }

    fn update_attribute(&mut self, pipeline: PipelineHandle, _name: &str, _dim: u8, _data: &[f32]) -> Result<()> {
        if !self.pipelines.contains_key(pipeline) {
            return Err(crate::errors::EngineError::InvalidArg("unknown pipeline".into()));
        }
        self.attribute_updates += 1;
        Ok(())
    }

    fn draw(&mut self, pipeline: PipelineHandle, _vertex_count: u32, _instance_count: u32) -> Result<()> {
        if !self.pipelines.contains_key(pipeline) {
            return Err(crate::errors::EngineError::InvalidArg("unknown pipeline".into()));
        }
        self.draw_calls += 1;
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        pipeline: PipelineHandle,
        _index_buffer: BufferHandle,
        _index_format: IndexFormat,
        _index_count: u32,
        _instance_count: u32,
    ) -> Result<()> {
        if !self.pipelines.contains_key(pipeline) {
            return Err(crate::errors::EngineError::InvalidArg("unknown pipeline".into()));
        }
        self.draw_indexed_calls += 1;
        Ok(())
    }

    fn dispatch(&mut self, _pipeline: PipelineHandle, _x: u32, _y: u32, _z: u32) -> Result<()> {
        self.dispatch_calls += 1;
        Ok(())
    }

    fn read_pixels_rgba8(&mut self, _x: u32, _y: u32, width: u32, height: u32) -> Result<Vec<u8>> {
        if self.current_target.is_none() {
            return Err(crate::errors::EngineError::Unsupported(
                "read_pixels_rgba8 with no render target bound".into(),
            ));
        }
        Ok(self
            .pixel_readback
            .clone()
            .unwrap_or_else(|| vec![0u8; (width * height * 4) as usize]))
    }

    fn features(&self) -> Features {
        Features::all()
    }

    fn max_compute_work_group_counts(&self) -> [u32; 3] {
        [65535, 65535, 65535]
    }
}

/// Convenience default config for tests (offscreen, mock backend).
#[must_use]
pub fn test_config(width: u32, height: u32) -> Config {
    Config {
        backend: BackendKind::ExternalGl,
        platform: PlatformKind::Offscreen,
        offscreen: true,
        width,
        height,
        samples: 1,
        swap_interval: 0,
        viewport: None,
        clear_color: [0.0, 0.0, 0.0, 1.0],
    }
}
