use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Writes `key=value` into a managed config file. An existing line with the
/// exact `key=` prefix is replaced in place; unrelated lines (comments,
/// sections, other keys) are preserved byte-for-byte in their original order.
/// A missing key is appended at the end. Last write wins.
pub fn write_value(path: &Path, key: &str, value: &str) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    let prefix = format!("{key}=");

    let mut lines: Vec<String> = raw.lines().map(|line| line.to_string()).collect();
    let mut replaced = false;
    for line in lines.iter_mut() {
        if line.starts_with(&prefix) {
            *line = format!("{key}={value}");
            replaced = true;
            break;
        }
    }
    if !replaced {
        lines.push(format!("{key}={value}"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    fs::write(path, out).with_context(|| format!("write config file {}", path.display()))?;
    Ok(())
}

/// Value of the first line matching `key=`, or None. Everything after the
/// first `=` counts as the value.
pub fn read_value(path: &Path, key: &str) -> Result<Option<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    let prefix = format!("{key}=");
    Ok(raw
        .lines()
        .find(|line| line.starts_with(&prefix))
        .map(|line| line[prefix.len()..].to_string()))
}
