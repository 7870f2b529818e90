//! Structural and transform node kinds (spec §4.6, §6.3 "Structural").
//!
//! `Identity`, `Translate`, `Rotate`, `Scale` each compute a local 4×4
//! matrix, multiply it into the parent's modelview, and forward the result
//! to `child` (component G, implemented in [`crate::transform`]). `Group`
//! simply fans out to an unordered list of children with no transform of its
//! own.

use crate::node::NodeHandle;
use smallvec::SmallVec;

#[derive(Debug, Clone, Default)]
pub struct Group {
    pub children: Vec<NodeHandle>,
}

impl Group {
    pub fn children(&self) -> SmallVec<[NodeHandle; 4]> {
        self.children.iter().cloned().collect()
    }
}

/// A transform-chain terminal. Camera eye/center/up chains must end in one
/// of these (spec §4.6); elsewhere it behaves as a transparent pass-through
/// node with its own (identity) local matrix.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub child: Option<NodeHandle>,
}

impl Identity {
    pub fn children(&self) -> SmallVec<[NodeHandle; 1]> {
        self.child.iter().cloned().collect()
    }
}

#[derive(Debug, Clone)]
pub struct Translate {
    pub child: NodeHandle,
    pub vector: [f32; 3],
    pub anim: Vec<NodeHandle>,
    pub cursor: usize,
}

impl Translate {
    pub fn children(&self) -> SmallVec<[NodeHandle; 4]> {
        let mut out: SmallVec<[NodeHandle; 4]> = SmallVec::new();
        out.push(self.child.clone());
        out.extend(self.anim.iter().cloned());
        out
    }
}

#[derive(Debug, Clone)]
pub struct Rotate {
    pub child: NodeHandle,
    pub angle_deg: f64,
    pub axis: [f32; 3],
    pub anchor: [f32; 3],
    pub anim: Vec<NodeHandle>,
    pub cursor: usize,
}

impl Rotate {
    pub fn children(&self) -> SmallVec<[NodeHandle; 4]> {
        let mut out: SmallVec<[NodeHandle; 4]> = SmallVec::new();
        out.push(self.child.clone());
        out.extend(self.anim.iter().cloned());
        out
    }
}

#[derive(Debug, Clone)]
pub struct Scale {
    pub child: NodeHandle,
    pub factors: [f32; 3],
    pub anchor: [f32; 3],
    pub anim: Vec<NodeHandle>,
    pub cursor: usize,
}

impl Scale {
    pub fn children(&self) -> SmallVec<[NodeHandle; 4]> {
        let mut out: SmallVec<[NodeHandle; 4]> = SmallVec::new();
        out.push(self.child.clone());
        out.extend(self.anim.iter().cloned());
        out
    }
}
