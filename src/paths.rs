use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

pub const ENGINE_CFG: &str = "engine.cfg";
pub const SETTINGS_CFG: &str = "settings.cfg";

pub const CONFIG_BUNDLE: &str = "config";
pub const ENGINE_BUNDLE: &str = "engine";
pub const RESOURCES_BUNDLE: &str = "resources";

const STORAGE_ENV: &str = "LAUNCHSMITH_STORAGE";
const ASSETS_ENV: &str = "LAUNCHSMITH_ASSETS";

/// Layout of the writable engine storage root. The `config` subtree holds
/// user-authored files and survives ordinary launches; `engine` and
/// `resources` are wiped and restaged on every launch.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub storage_root: PathBuf,
    pub config_dir: PathBuf,
    pub engine_cfg: PathBuf,
    pub settings_cfg: PathBuf,
    pub engine_dir: PathBuf,
    pub resources_dir: PathBuf,
    pub catalog_root: PathBuf,
}

pub fn detect_paths(
    storage_root_override: Option<&Path>,
    catalog_root_override: Option<&Path>,
) -> Result<StoragePaths> {
    let storage_root = match storage_root_override {
        Some(path) => path.to_path_buf(),
        None => find_storage_root().context("locate engine storage root")?,
    };

    let catalog_root = match catalog_root_override {
        Some(path) => path.to_path_buf(),
        None => find_catalog_root().context("locate asset catalog")?,
    };

    if !looks_like_catalog_root(&catalog_root) {
        bail!(
            "invalid asset catalog: expected config/ bundle in {}",
            catalog_root.display()
        );
    }

    Ok(build_paths(storage_root, catalog_root))
}

fn build_paths(storage_root: PathBuf, catalog_root: PathBuf) -> StoragePaths {
    let config_dir = storage_root.join("config");
    let engine_cfg = config_dir.join(ENGINE_CFG);
    let settings_cfg = config_dir.join(SETTINGS_CFG);
    let engine_dir = storage_root.join("engine");
    let resources_dir = storage_root.join("resources");

    StoragePaths {
        storage_root,
        config_dir,
        engine_cfg,
        settings_cfg,
        engine_dir,
        resources_dir,
        catalog_root,
    }
}

fn find_storage_root() -> Option<PathBuf> {
    if let Some(root) = std::env::var_os(STORAGE_ENV) {
        return Some(PathBuf::from(root));
    }
    let base = BaseDirs::new()?;
    Some(
        base.data_local_dir()
            .join("launchsmith")
            .join("engine-files"),
    )
}

fn find_catalog_root() -> Option<PathBuf> {
    if let Some(root) = std::env::var_os(ASSETS_ENV) {
        return Some(PathBuf::from(root));
    }
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("assets"))
}

pub fn looks_like_catalog_root(path: &Path) -> bool {
    path.join(CONFIG_BUNDLE).is_dir()
}

pub fn app_data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base.data_local_dir().join("launchsmith"))
}
