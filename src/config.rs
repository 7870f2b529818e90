//! Layered configuration loading (SPEC_FULL §1 "Configuration").
//!
//! [`backend::Config`] is primarily a plain builder struct (spec §6.1), but
//! this module additionally lets a caller load/override it through the
//! `config` crate: defaults, then an optional file, then environment
//! variables prefixed `NGFX_` — the way the teacher engine's render-context
//! setup layers its own config. This is an additive convenience on top of
//! the builder, not a replacement for it; [`crate::context::Ctx::configure`]
//! still takes a plain [`backend::Config`] value.

use crate::backend::{BackendKind, Config, PlatformKind};
use crate::errors::Result;
use ::config::{Config as ConfigSource, Environment, File};
use serde::Deserialize;

/// Mirrors [`Config`] field-for-field but with every field optional, so a
/// layer only needs to specify what it overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct RawConfig {
    backend: Option<String>,
    platform: Option<String>,
    offscreen: Option<bool>,
    width: Option<u32>,
    height: Option<u32>,
    samples: Option<u32>,
    swap_interval: Option<i32>,
    clear_color: Option<[f32; 4]>,
}

fn parse_backend(s: &str) -> Option<BackendKind> {
    match s.to_ascii_lowercase().as_str() {
        "opengl" | "gl" => Some(BackendKind::OpenGl),
        "opengles" | "gles" => Some(BackendKind::OpenGlEs),
        "externalgl" | "external_gl" | "external" => Some(BackendKind::ExternalGl),
        _ => None,
    }
}

fn parse_platform(s: &str) -> Option<PlatformKind> {
    match s.to_ascii_lowercase().as_str() {
        "x11" => Some(PlatformKind::X11),
        "wayland" => Some(PlatformKind::Wayland),
        "win32" | "windows" => Some(PlatformKind::Win32),
        "macos" => Some(PlatformKind::MacOs),
        "ios" => Some(PlatformKind::Ios),
        "android" => Some(PlatformKind::Android),
        "offscreen" => Some(PlatformKind::Offscreen),
        _ => None,
    }
}

fn apply(base: &mut Config, raw: &RawConfig) {
    if let Some(b) = raw.backend.as_deref().and_then(parse_backend) {
        base.backend = b;
    }
    if let Some(p) = raw.platform.as_deref().and_then(parse_platform) {
        base.platform = p;
    }
    if let Some(v) = raw.offscreen {
        base.offscreen = v;
    }
    if let Some(v) = raw.width {
        base.width = v;
    }
    if let Some(v) = raw.height {
        base.height = v;
    }
    if let Some(v) = raw.samples {
        base.samples = v;
    }
    if let Some(v) = raw.swap_interval {
        base.swap_interval = v;
    }
    if let Some(v) = raw.clear_color {
        base.clear_color = v;
    }
}

/// Loads a [`Config`], starting from [`Config::default`], then layering an
/// optional config file (`path`, any format the `config` crate recognizes by
/// extension) and environment variables prefixed `NGFX_` (e.g.
/// `NGFX_WIDTH=1920`) on top. `path = None` skips the file layer.
pub fn load(path: Option<&str>) -> Result<Config> {
    let mut builder = ConfigSource::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path).required(false));
    }
    builder = builder.add_source(Environment::with_prefix("NGFX").try_parsing(true));
    let source = builder.build()?;
    let raw: RawConfig = source.try_deserialize().unwrap_or_default();
    let mut cfg = Config::default();
    apply(&mut cfg, &raw);
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_layered() {
        let cfg = load(None).unwrap();
        assert_eq!(cfg.width, Config::default().width);
    }

    #[test]
    fn environment_overrides_defaults() {
        unsafe {
            std::env::set_var("NGFX_WIDTH", "640");
            std::env::set_var("NGFX_HEIGHT", "480");
        }
        let cfg = load(None).unwrap();
        assert_eq!(cfg.width, 640);
        assert_eq!(cfg.height, 480);
        unsafe {
            std::env::remove_var("NGFX_WIDTH");
            std::env::remove_var("NGFX_HEIGHT");
        }
    }
}
