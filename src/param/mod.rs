//! Parameter reflection (spec §3.2, §4.1 — component A)
//!
//! Every node kind publishes an ordered, declarative schema describing its
//! fields: key, semantic type, default, flags, and — for `NodeRef`/
//! `NodeList` slots — a whitelist of the child kinds it will accept. The
//! schema is not derived from struct byte offsets (that trick does not
//! typecheck in Rust and the REDESIGN FLAGS call it out explicitly); it is a
//! plain data table returned by each kind's `schema()` function and used
//! only at the validation boundary (`node_param_set`/`node_param_add`) and by
//! introspection callers. The hot path (the evaluation pipeline) never
//! touches it — it walks children through the `children()` method instead.

use crate::node::NodeKindId;
use std::fmt;

/// The semantic type of a single parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    I64,
    Double,
    String,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    NodeRef,
    NodeList,
    DoubleList,
    /// A closed enumeration presented as a string at the API boundary
    /// (e.g. a GL-state capability name); carries the allowed tag names.
    Select(&'static [&'static str]),
}

bitflags::bitflags! {
    /// Presentation / validation flags (spec §3.2).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParamFlags: u8 {
        /// Must be supplied to `node_create`, in schema order.
        const CONSTRUCTOR = 1 << 0;
        /// Presentation hint: pack with the next field in a display tool.
        const DOT_DISPLAY_PACKED = 1 << 1;
        /// Presentation hint: show the struct field name, not the key.
        const DOT_DISPLAY_FIELDNAME = 1 << 2;
    }
}

/// A default value for a parameter, covering every [`ParamType`] this
/// engine's closed kind set actually uses.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Int(i32),
    I64(i64),
    Double(f64),
    String(&'static str),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
    None,
}

/// One entry in a node kind's schema.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    pub key: &'static str,
    pub ty: ParamType,
    pub default: DefaultValue,
    pub flags: ParamFlags,
    /// For `NodeRef`/`NodeList`: the allowed child kinds. Empty means
    /// unrestricted.
    pub allowed_kinds: &'static [NodeKindId],
}

impl ParamDescriptor {
    #[must_use]
    pub const fn new(key: &'static str, ty: ParamType, default: DefaultValue) -> Self {
        Self {
            key,
            ty,
            default,
            flags: ParamFlags::empty(),
            allowed_kinds: &[],
        }
    }

    #[must_use]
    pub const fn constructor(mut self) -> Self {
        self.flags = ParamFlags::from_bits_truncate(self.flags.bits() | ParamFlags::CONSTRUCTOR.bits());
        self
    }

    #[must_use]
    pub const fn with_allowed_kinds(mut self, kinds: &'static [NodeKindId]) -> Self {
        self.allowed_kinds = kinds;
        self
    }

    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.flags.contains(ParamFlags::CONSTRUCTOR)
    }

    /// Whether `kind` is permitted in this `NodeRef`/`NodeList` slot.
    #[must_use]
    pub fn accepts_kind(&self, kind: NodeKindId) -> bool {
        self.allowed_kinds.is_empty() || self.allowed_kinds.contains(&kind)
    }
}

/// The ordered schema for one node kind, plus the common fields every node
/// carries regardless of kind (glstates, ranges, name — spec §4.1, "the
/// base-node common schema").
#[derive(Debug, Clone)]
pub struct NodeSchema {
    pub kind_name: &'static str,
    pub params: &'static [ParamDescriptor],
}

impl NodeSchema {
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&ParamDescriptor> {
        self.params.iter().find(|p| p.key == key)
    }

    /// Constructor parameters, in schema order — the order `node_create`'s
    /// argument pack must match.
    pub fn constructor_params(&self) -> impl Iterator<Item = &ParamDescriptor> {
        self.params.iter().filter(|p| p.is_constructor())
    }
}

/// The common parameters every node accepts regardless of kind.
pub const COMMON_SCHEMA: &[ParamDescriptor] = &[
    ParamDescriptor::new("name", ParamType::String, DefaultValue::None),
    ParamDescriptor::new("glstates", ParamType::NodeList, DefaultValue::None),
    ParamDescriptor::new("ranges", ParamType::NodeList, DefaultValue::None),
];

/// Resolves `key` first against [`COMMON_SCHEMA`], then against `schema`
/// (spec §4.1: "Resolve the key first against the base-node common schema
/// ... then against the class schema").
#[must_use]
pub fn resolve<'a>(schema: &'a NodeSchema, key: &str) -> Option<&'a ParamDescriptor> {
    COMMON_SCHEMA
        .iter()
        .find(|p| p.key == key)
        .or_else(|| schema.find(key))
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Int => write!(f, "int"),
            ParamType::I64 => write!(f, "i64"),
            ParamType::Double => write!(f, "double"),
            ParamType::String => write!(f, "string"),
            ParamType::Vec2 => write!(f, "vec2"),
            ParamType::Vec3 => write!(f, "vec3"),
            ParamType::Vec4 => write!(f, "vec4"),
            ParamType::Mat4 => write!(f, "mat4"),
            ParamType::NodeRef => write!(f, "node"),
            ParamType::NodeList => write!(f, "node_list"),
            ParamType::DoubleList => write!(f, "double_list"),
            ParamType::Select(_) => write!(f, "select"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_common_schema() {
        let schema = NodeSchema {
            kind_name: "Test",
            params: &[ParamDescriptor::new("name", ParamType::Int, DefaultValue::None)],
        };
        // "name" exists in both; common schema wins, so the type is String.
        let found = resolve(&schema, "name").unwrap();
        assert_eq!(found.ty, ParamType::String);
    }

    #[test]
    fn constructor_params_are_filtered_in_order() {
        let schema = NodeSchema {
            kind_name: "Test",
            params: &[
                ParamDescriptor::new("a", ParamType::Int, DefaultValue::None).constructor(),
                ParamDescriptor::new("b", ParamType::Int, DefaultValue::None),
                ParamDescriptor::new("c", ParamType::Int, DefaultValue::None).constructor(),
            ],
        };
        let keys: Vec<_> = schema.constructor_params().map(|p| p.key).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
