use crate::{
    assets::AssetCatalog,
    paths::{StoragePaths, CONFIG_BUNDLE, ENGINE_BUNDLE, RESOURCES_BUNDLE},
};
use anyhow::{Context, Result};
use std::{fs, path::Path};
use walkdir::WalkDir;

/// Repairs missing managed config files by wiping and restaging the user
/// config subtree from the default bundle. Returns true when a reset ran.
pub fn ensure_defaults(paths: &StoragePaths, catalog: &AssetCatalog) -> Result<bool> {
    if paths.engine_cfg.exists() && paths.settings_cfg.exists() {
        return Ok(false);
    }
    reset_user_config(paths, catalog)?;
    Ok(true)
}

/// Unconditional wipe-and-restage of the user config subtree. Only invoked on
/// first-run bootstrap or explicit user request; ordinary launches leave user
/// config alone.
pub fn reset_user_config(paths: &StoragePaths, catalog: &AssetCatalog) -> Result<()> {
    remove_tree(&paths.config_dir)?;
    catalog
        .copy_bundle(CONFIG_BUNDLE, &paths.storage_root)
        .context("restage config bundle")?;
    Ok(())
}

/// Wipes and restages the generated engine and resource subtrees. Runs before
/// every launch so stale files from a previous session never leak into a new
/// one.
pub fn reset_wipeable_state(paths: &StoragePaths, catalog: &AssetCatalog) -> Result<()> {
    remove_tree(&paths.engine_dir)?;
    remove_tree(&paths.resources_dir)?;
    catalog
        .copy_bundle(ENGINE_BUNDLE, &paths.storage_root)
        .context("restage engine bundle")?;
    catalog
        .copy_bundle(RESOURCES_BUNDLE, &paths.storage_root)
        .context("restage resources bundle")?;
    Ok(())
}

/// Deletes a tree, children before parents. A missing path is success.
pub fn remove_tree(root: &Path) -> Result<()> {
    if !root.exists() {
        return Ok(());
    }
    if !root.is_dir() {
        return fs::remove_file(root).with_context(|| format!("remove {}", root.display()));
    }

    for entry in WalkDir::new(root).contents_first(true).follow_links(false) {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        let path = entry.path();
        if entry.file_type().is_dir() {
            fs::remove_dir(path).with_context(|| format!("remove dir {}", path.display()))?;
        } else {
            fs::remove_file(path).with_context(|| format!("remove file {}", path.display()))?;
        }
    }
    Ok(())
}
