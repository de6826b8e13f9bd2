use crate::cfgfile;
use anyhow::Result;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Parses a `WIDTHxHEIGHT` override string. Anything malformed (empty, junk,
/// missing separator, zero or non-numeric components) is treated as "no
/// override", never as an error: bad user input must not block a launch.
pub fn parse_override(raw: &str) -> Option<Resolution> {
    let (width, height) = raw.split_once('x')?;
    let width: u32 = width.trim().parse().ok()?;
    let height: u32 = height.trim().parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(Resolution { width, height })
}

/// A well-formed override wins; otherwise the measured surface size passes
/// through unchanged.
pub fn resolve(surface: Resolution, override_raw: &str) -> Resolution {
    parse_override(override_raw).unwrap_or(surface)
}

/// Persists the resolved pair into settings.cfg.
pub fn persist(resolution: Resolution, settings_cfg: &Path) -> Result<()> {
    cfgfile::write_value(settings_cfg, "resolution x", &resolution.width.to_string())?;
    cfgfile::write_value(settings_cfg, "resolution y", &resolution.height.to_string())?;
    Ok(())
}
