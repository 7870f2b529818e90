//! GL-state cache (spec §4.9 — component K)
//!
//! Remembers the last-applied program/pipeline, blend state, stencil
//! state, and scissor-test enable, so a backend can elide redundant driver
//! calls. A glstate override on a node records both the requested value and
//! the previous one (so `draw` can restore it afterwards); `clear_color`/
//! `clear_depth_stencil` transparently disable scissor-test for the
//! duration of the clear and restore it.
//!
//! The engine's concurrency model is single-threaded cooperative (spec §5),
//! so the cache lives directly on the owning [`crate::context::Ctx`] rather
//! than in thread-local storage — there is exactly one context per thread of
//! use, and it never migrates mid-draw.

use super::{PipelineHandle, Scissor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendState {
    pub enabled: bool,
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src_rgb: BlendFactor::One,
            dst_rgb: BlendFactor::Zero,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StencilState {
    pub enabled: bool,
    pub reference: i32,
    pub read_mask: u32,
    pub write_mask: u32,
}

/// One pushed/popped GL-state override (spec §3.1 "glstates").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOverride {
    Blend(BlendState),
    Color { write_mask: [bool; 4] },
    Stencil(StencilState),
    /// A bare capability toggle (depth test, cull face, ...).
    Capability { id: u32, enabled: bool },
}

#[derive(Debug, Default)]
pub struct StateCache {
    current_pipeline: Option<PipelineHandle>,
    blend: BlendState,
    stencil: StencilState,
    scissor: Option<Scissor>,
    scissor_saved_for_clear: Option<Option<Scissor>>,
}

impl StateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `pipeline` differs from the cached current one
    /// (i.e. a driver-level bind is actually required), and updates the
    /// cache to `pipeline`.
    pub fn bind_pipeline(&mut self, pipeline: PipelineHandle) -> bool {
        if self.current_pipeline == Some(pipeline) {
            false
        } else {
            self.current_pipeline = Some(pipeline);
            true
        }
    }

    pub fn set_scissor(&mut self, scissor: Option<Scissor>) {
        self.scissor = scissor;
    }

    #[must_use]
    pub fn scissor(&self) -> Option<Scissor> {
        self.scissor
    }

    /// Pushes a state override, returning the previous value to restore
    /// after `draw` (spec §4.5 "applies this node's glstates overrides
    /// (saving previous GL state)").
    pub fn push_override(&mut self, state: StateOverride) -> StateOverride {
        match state {
            StateOverride::Blend(new) => {
                let prev = self.blend;
                self.blend = new;
                StateOverride::Blend(prev)
            }
            StateOverride::Stencil(new) => {
                let prev = self.stencil;
                self.stencil = new;
                StateOverride::Stencil(prev)
            }
            other => other,
        }
    }

    pub fn pop_override(&mut self, previous: StateOverride) {
        match previous {
            StateOverride::Blend(prev) => self.blend = prev,
            StateOverride::Stencil(prev) => self.stencil = prev,
            _ => {}
        }
    }

    /// Disables scissor-test transparently around a clear, to be restored
    /// by [`Self::end_clear`] (spec §4.9).
    pub fn begin_clear(&mut self) {
        self.scissor_saved_for_clear = Some(self.scissor.take());
    }

    pub fn end_clear(&mut self) {
        if let Some(saved) = self.scissor_saved_for_clear.take() {
            self.scissor = saved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn rebinding_same_pipeline_is_elided() {
        let mut sm: SlotMap<PipelineHandle, ()> = SlotMap::with_key();
        let h = sm.insert(());
        let mut cache = StateCache::new();
        assert!(cache.bind_pipeline(h));
        assert!(!cache.bind_pipeline(h));
    }

    #[test]
    fn clear_restores_scissor() {
        let mut cache = StateCache::new();
        let s = Scissor { x: 1, y: 2, width: 3, height: 4 };
        cache.set_scissor(Some(s));
        cache.begin_clear();
        assert_eq!(cache.scissor(), None);
        cache.end_clear();
        assert_eq!(cache.scissor(), Some(s));
    }
}
