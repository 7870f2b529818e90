//! `ngfx` — a declarative, time-driven graphics engine that evaluates a
//! scene graph of typed nodes and produces GPU draw work against a
//! pluggable [`backend::GraphicsBackend`].
//!
//! A caller builds a DAG of [`node`]s off-line (geometry, shaders,
//! textures, transforms, uniforms, cameras, render-to-texture, ...), hands
//! the root to a [`context::Ctx`] via [`context::Ctx::set_scene`], then
//! drives playback with [`context::Ctx::draw`] once per frame.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::too_many_lines)]

pub mod animation;
pub mod backend;
pub mod config;
pub mod context;
pub mod errors;
pub mod eval;
pub mod lifecycle;
pub mod logging;
pub mod node;
pub mod param;
pub mod render_range;
pub mod transform;

pub use backend::{BackendKind, Config as BackendConfig, GraphicsBackend, PlatformKind};
pub use context::Ctx;
pub use errors::{EngineError, Result};
pub use logging::{set_log_callback, set_min_log_level, LogLevel};
pub use node::api::{node_param_add, node_param_set, ParamValue};
pub use node::{NodeHandle, NodeKind, NodeKindId};
