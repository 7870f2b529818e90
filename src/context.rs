//! The Context API (spec §6.1) — the crate's single public entry point,
//! wiring components A–L together behind `create`/`configure`/`resize`/
//! `set_scene`/`draw`/`free`.
//!
//! `Ctx` owns a `Box<dyn GraphicsBackend>` so a caller can plug in
//! [`crate::backend::wgpu_backend::WgpuBackend`] for real rendering or
//! [`crate::backend::mock::MockBackend`] for GPU-less tests, mirroring the
//! teacher engine's split between its real renderer and the test doubles it
//! exercises its scene graph against.

use crate::backend::state_cache::StateCache;
use crate::backend::{Config, GraphicsBackend, Scissor, Viewport};
use crate::errors::{EngineError, Result};
use crate::node::{CtxId, NodeHandle};
use crate::{eval, lifecycle};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CTX_ID: AtomicU64 = AtomicU64::new(1);

/// A render context (spec §6.1). Owns the backend, the scene root (a strong
/// reference, spec §3.7), and the GL-state cache (component K) the
/// evaluation pipeline draws through.
pub struct Ctx {
    id: CtxId,
    backend: Box<dyn GraphicsBackend>,
    config: Config,
    configured: bool,
    scene: Option<NodeHandle>,
    state_cache: StateCache,
}

impl Ctx {
    /// `create() -> Ctx` (spec §6.1): allocates a context; no GPU work yet.
    #[must_use]
    pub fn new(backend: impl GraphicsBackend + 'static) -> Self {
        Self {
            id: NEXT_CTX_ID.fetch_add(1, Ordering::Relaxed),
            backend: Box::new(backend),
            config: Config::default(),
            configured: false,
            scene: None,
            state_cache: StateCache::new(),
        }
    }

    /// `configure(Ctx, Config)` (spec §6.1): sets backend/platform kind,
    /// dimensions, samples, swap interval, viewport override, clear color;
    /// creates the graphics context and probes features.
    pub fn configure(&mut self, config: Config) -> Result<()> {
        self.backend.configure(&config)?;
        if let Some(viewport) = config.viewport {
            self.backend.set_viewport(viewport);
        } else {
            self.backend.set_viewport(Viewport { x: 0, y: 0, width: config.width, height: config.height });
        }
        self.backend.set_clear_color(config.clear_color);
        self.config = config;
        self.configured = true;
        Ok(())
    }

    /// `resize(Ctx, w, h, [viewport])` (spec §6.1): resizes the swap surface
    /// and updates the current viewport.
    pub fn resize(&mut self, width: u32, height: u32, viewport: Option<Viewport>) -> Result<()> {
        self.backend.resize(width, height)?;
        self.config.width = width;
        self.config.height = height;
        self.backend.set_viewport(viewport.unwrap_or(Viewport { x: 0, y: 0, width, height }));
        Ok(())
    }

    /// `set_scene(Ctx, root)` (spec §6.1): detaches the previous scene,
    /// attaches the new root (taking a strong reference), transitively
    /// `attach_ctx`.
    pub fn set_scene(&mut self, root: NodeHandle) -> Result<()> {
        if let Some(previous) = self.scene.take() {
            lifecycle::detach_ctx(&previous, &mut *self.backend);
        }
        lifecycle::attach_ctx(&root, self.id)?;
        self.scene = Some(root);
        Ok(())
    }

    /// The current scene root, if any.
    #[must_use]
    pub fn scene(&self) -> Option<&NodeHandle> {
        self.scene.as_ref()
    }

    /// `draw(Ctx, t_seconds)` (spec §6.1): runs Pass 1 then Pass 2, then
    /// swaps buffers. Fails with [`EngineError::InvalidUsage`] if no scene
    /// has been set or the context hasn't been configured (spec §7's
    /// "`draw` before `set_scene`" out-of-order case).
    pub fn draw(&mut self, t: f64) -> Result<()> {
        if !self.configured {
            return Err(EngineError::InvalidUsage("draw() called before configure()".into()));
        }
        let root = self
            .scene
            .clone()
            .ok_or_else(|| EngineError::InvalidUsage("draw() called before set_scene()".into()))?;

        {
            let mut n = root.borrow_mut();
            n.modelview_matrix = glam::Mat4::IDENTITY;
            n.projection_matrix = glam::Mat4::IDENTITY;
        }

        eval::check_resources(&root, t, &mut *self.backend)?;
        eval::update_and_draw(&root, t, &mut *self.backend, &mut self.state_cache)?;
        self.backend.swap_buffers()?;
        Ok(())
    }

    /// `free(Ctx)` (spec §6.1): detaches the scene and destroys the
    /// graphics context. `Ctx` itself is then dropped by the caller; this
    /// method exists so teardown order matches the spec (detach before
    /// destroy) rather than relying on field-drop order.
    pub fn free(mut self) {
        if let Some(root) = self.scene.take() {
            lifecycle::detach_ctx(&root, &mut *self.backend);
        }
        self.backend.destroy();
    }

    /// (ADDED, SPEC_FULL §6 "`set_glcontext`-equivalent") Replaces this
    /// context's backend with an already-constructed one — e.g. one wired
    /// to an externally owned `wgpu::Device`/`Surface` — without this `Ctx`
    /// taking ownership of whatever GPU resources that backend itself does
    /// not already own. Mirrors spec §6.1's `set_glcontext(Ctx, display,
    /// window, handle, platform, api)` at the trait-abstraction level this
    /// engine actually works at: the caller builds the `GraphicsBackend`
    /// against the foreign context, `adopt_backend` just swaps it in.
    pub fn adopt_backend(&mut self, backend: Box<dyn GraphicsBackend>) {
        self.backend = backend;
        self.configured = true;
    }

    /// Current scissor rectangle, if any (exposed for callers that want to
    /// read back context state, e.g. a windowing integration resizing a
    /// sub-viewport).
    #[must_use]
    pub fn scissor(&self) -> Option<Scissor> {
        self.backend.scissor()
    }

    /// Read-only access to the backend, e.g. for `read_pixels_rgba8` in
    /// tests or an offscreen capture harness.
    #[must_use]
    pub fn backend(&self) -> &dyn GraphicsBackend {
        &*self.backend
    }

    /// Mutable access to the backend. Prefer the typed `Ctx` methods above;
    /// this exists for backend-specific operations that have no
    /// `GraphicsBackend` vocabulary (e.g. reading `wgpu`-specific state off
    /// a concrete backend via `downcast`-style access in a caller's own
    /// windowing integration).
    pub fn backend_mut(&mut self) -> &mut dyn GraphicsBackend {
        &mut *self.backend
    }

    /// This context's identity, as threaded through node `ctx` fields by
    /// [`lifecycle::attach_ctx`]. Exposed for callers building their own
    /// diagnostics; ordinary scene code never needs it.
    #[must_use]
    pub fn id(&self) -> CtxId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{test_config, MockBackend};
    use crate::node::factory;

    #[test]
    fn draw_before_set_scene_fails() {
        let mut ctx = Ctx::new(MockBackend::new());
        ctx.configure(test_config(4, 4)).unwrap();
        assert!(matches!(ctx.draw(0.0), Err(EngineError::InvalidUsage(_))));
    }

    #[test]
    fn draw_before_configure_fails() {
        let mut ctx = Ctx::new(MockBackend::new());
        let quad = factory::quad([-0.5, -0.5, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        ctx.set_scene(quad).unwrap();
        assert!(matches!(ctx.draw(0.0), Err(EngineError::InvalidUsage(_))));
    }

    #[test]
    fn static_scene_draws_without_error() {
        let mut ctx = Ctx::new(MockBackend::new());
        ctx.configure(test_config(4, 4)).unwrap();
        let shader = factory::shader();
        let shape = factory::quad([-0.5, -0.5, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let ts = factory::textured_shape(shape, shader);
        ctx.set_scene(ts).unwrap();
        ctx.draw(0.0).unwrap();
    }

    #[test]
    fn set_scene_twice_detaches_previous_root() {
        let mut ctx = Ctx::new(MockBackend::new());
        ctx.configure(test_config(4, 4)).unwrap();
        let first = factory::group(vec![]);
        ctx.set_scene(first.clone()).unwrap();
        ctx.draw(0.0).unwrap();
        let second = factory::group(vec![]);
        ctx.set_scene(second).unwrap();
        assert!(first.borrow().ctx.is_none());
    }

    #[test]
    fn free_detaches_scene() {
        let mut ctx = Ctx::new(MockBackend::new());
        ctx.configure(test_config(4, 4)).unwrap();
        let root = factory::group(vec![]);
        ctx.set_scene(root.clone()).unwrap();
        ctx.free();
        assert!(root.borrow().ctx.is_none());
    }
}
