//! GL-state override node kinds (spec §6.3 "State"). These are the nodes a
//! drawable lists in its `glstates` common-schema slot; the lifecycle/eval
//! pipeline applies them around `draw` through [`crate::backend::state_cache`].

use crate::backend::state_cache::{BlendFactor, BlendState, StateOverride, StencilState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlState {
    /// Opaque capability id (depth test, cull face, ...); the concrete
    /// capability enumeration is backend-specific, so the node just carries
    /// the tag the backend was probed with.
    pub capability: u32,
    pub enabled: bool,
}

impl GlState {
    #[must_use]
    pub fn as_override(&self) -> StateOverride {
        StateOverride::Capability { id: self.capability, enabled: self.enabled }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlBlendState {
    pub enabled: bool,
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl Default for GlBlendState {
    fn default() -> Self {
        let d = BlendState::default();
        Self { enabled: d.enabled, src_rgb: d.src_rgb, dst_rgb: d.dst_rgb, src_alpha: d.src_alpha, dst_alpha: d.dst_alpha }
    }
}

impl GlBlendState {
    #[must_use]
    pub fn as_override(&self) -> StateOverride {
        StateOverride::Blend(BlendState {
            enabled: self.enabled,
            src_rgb: self.src_rgb,
            dst_rgb: self.dst_rgb,
            src_alpha: self.src_alpha,
            dst_alpha: self.dst_alpha,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlColorState {
    pub write_mask: [bool; 4],
}

impl GlColorState {
    #[must_use]
    pub fn as_override(&self) -> StateOverride {
        StateOverride::Color { write_mask: self.write_mask }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlStencilState {
    pub enabled: bool,
    pub reference: i32,
    pub read_mask: u32,
    pub write_mask: u32,
}

impl GlStencilState {
    #[must_use]
    pub fn as_override(&self) -> StateOverride {
        StateOverride::Stencil(StencilState {
            enabled: self.enabled,
            reference: self.reference,
            read_mask: self.read_mask,
            write_mask: self.write_mask,
        })
    }
}
