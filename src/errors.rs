//! Error Types
//!
//! All fallible engine operations return [`Result<T>`], an alias for
//! `std::result::Result<T, EngineError>`. [`EngineError`] enumerates the
//! error kinds specified by the engine: schema violations, out-of-order API
//! usage, unresolved names, allocation failures, backend errors, unsupported
//! features, and driver-reported limits.

use thiserror::Error;

/// The engine's error type. One variant per error kind.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Schema violation: unknown key, wrong type, disallowed child kind,
    /// negative dimension, and similar caller mistakes caught at the
    /// parameter-reflection boundary.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Out-of-order API calls, e.g. `draw` before `set_scene`, or attaching
    /// a node to a second context.
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// An unresolved uniform/attribute/extension name.
    #[error("not found: {0}")]
    NotFound(String),

    /// Allocation failure.
    #[error("out of memory: {0}")]
    Memory(String),

    /// A backend (GPU) error: shader compile/link failure, device/surface
    /// creation failure, or any other driver-reported error.
    #[error("backend error: {0}")]
    External(String),

    /// The running backend does not provide a requested feature.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A driver-reported limit was exceeded (texture units, work-group
    /// count, color attachments, uniform block size, ...).
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Failure to create or configure the GPU device.
    #[error("device request failed: {0}")]
    DeviceRequestFailed(#[from] wgpu::RequestDeviceError),

    /// I/O failure, notably on the camera pipe-capture path.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure loading layered configuration.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;
