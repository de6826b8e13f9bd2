use crate::{
    assets::AssetCatalog,
    bootstrap, cfgfile,
    paths::StoragePaths,
    prefs::{
        Preferences, PREF_CAPSULE_SHAPE, PREF_DATA_FILES, PREF_ENCODING, PREF_PRELOAD,
        PREF_UI_SCALING,
    },
};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::mpsc::Sender, thread};
use thiserror::Error;

/// One launch attempt walks these phases in order. `Failed` is terminal and
/// reachable from any non-terminal phase; hand-off never happens after a
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchPhase {
    Idle,
    Bootstrapping,
    StagingAssets,
    SyncingConfig,
    ResolvingResolution,
    ReadyToLaunch,
    Launched,
    Failed(String),
}

impl LaunchPhase {
    pub fn label(&self) -> &'static str {
        match self {
            LaunchPhase::Idle => "idle",
            LaunchPhase::Bootstrapping => "bootstrapping",
            LaunchPhase::StagingAssets => "staging assets",
            LaunchPhase::SyncingConfig => "syncing config",
            LaunchPhase::ResolvingResolution => "resolving resolution",
            LaunchPhase::ReadyToLaunch => "ready to launch",
            LaunchPhase::Launched => "launched",
            LaunchPhase::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LaunchPhase::Launched | LaunchPhase::Failed(_))
    }
}

#[derive(Debug, Error)]
#[error("launch aborted while {phase}: {message}")]
pub struct LaunchAbortedError {
    pub phase: &'static str,
    pub message: String,
}

/// Worker-to-coordinator messages for one launch attempt.
#[derive(Debug)]
pub enum LaunchMessage {
    Phase(LaunchPhase),
    /// Blocking preparation finished; the coordinator may resolve the
    /// resolution and hand off.
    Finished,
    Failed(LaunchAbortedError),
}

/// Display-surface collaborator. Chrome is hidden before the worker starts so
/// the size measured after it finishes reflects the final render surface.
pub trait SurfaceHost {
    fn hide_chrome(&self);
    fn surface_size(&self) -> (u32, u32);
}

/// Engine hand-off collaborator: called exactly once per successful pass,
/// fire-and-forget. Nothing is awaited after it returns.
pub trait EngineHandoff {
    fn launch(&self, paths: &StoragePaths) -> Result<()>;
}

/// Spawns the staged engine binary and does not wait on it.
pub struct ProcessHandoff {
    binary: PathBuf,
}

impl ProcessHandoff {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    pub fn from_paths(paths: &StoragePaths) -> Self {
        Self {
            binary: paths.engine_dir.join("bin").join("engine"),
        }
    }
}

impl EngineHandoff for ProcessHandoff {
    fn launch(&self, paths: &StoragePaths) -> Result<()> {
        std::process::Command::new(&self.binary)
            .arg("--config")
            .arg(&paths.config_dir)
            .spawn()
            .with_context(|| format!("spawn engine {}", self.binary.display()))?;
        Ok(())
    }
}

/// Spawns the per-attempt worker. It runs Bootstrapping, StagingAssets and
/// SyncingConfig in strict sequence, reporting each transition over the
/// channel, and stops at the first error. There is no cancellation and no
/// timeout: a launch attempt runs to completion or to first failure, and a
/// stalled filesystem operation stalls the attempt with it.
pub fn spawn_worker(
    paths: StoragePaths,
    catalog: AssetCatalog,
    prefs: Preferences,
    tx: Sender<LaunchMessage>,
) {
    thread::spawn(move || {
        let result = run_prepare_steps(&paths, &catalog, &prefs, &tx);
        match result {
            Ok(()) => {
                let _ = tx.send(LaunchMessage::Finished);
            }
            Err(err) => {
                let _ = tx.send(LaunchMessage::Failed(err));
            }
        }
    });
}

fn run_prepare_steps(
    paths: &StoragePaths,
    catalog: &AssetCatalog,
    prefs: &Preferences,
    tx: &Sender<LaunchMessage>,
) -> std::result::Result<(), LaunchAbortedError> {
    let _ = tx.send(LaunchMessage::Phase(LaunchPhase::Bootstrapping));
    bootstrap::ensure_defaults(paths, catalog).map_err(|err| aborted("bootstrapping", err))?;

    // Generated runtime files are refreshed every launch, even when the
    // managed config files already existed.
    let _ = tx.send(LaunchMessage::Phase(LaunchPhase::StagingAssets));
    bootstrap::reset_wipeable_state(paths, catalog)
        .map_err(|err| aborted("staging assets", err))?;

    let _ = tx.send(LaunchMessage::Phase(LaunchPhase::SyncingConfig));
    sync_config(paths, prefs).map_err(|err| aborted("syncing config", err))?;

    Ok(())
}

fn aborted(phase: &'static str, err: anyhow::Error) -> LaunchAbortedError {
    LaunchAbortedError {
        phase,
        message: format!("{err:#}"),
    }
}

/// Merges preference values into the two managed files. User-supplied values
/// are written as-is, an empty data path included: validating them is the
/// engine's job, not ours.
pub fn sync_config(paths: &StoragePaths, prefs: &Preferences) -> Result<()> {
    let resources = paths.resources_dir.to_string_lossy();
    cfgfile::write_value(&paths.engine_cfg, "resources", &resources)?;
    cfgfile::write_value(&paths.engine_cfg, "data", &prefs.get(PREF_DATA_FILES))?;
    cfgfile::write_value(&paths.engine_cfg, "encoding", &prefs.get(PREF_ENCODING))?;

    cfgfile::write_value(
        &paths.settings_cfg,
        "scaling factor",
        &prefs.get(PREF_UI_SCALING),
    )?;
    cfgfile::write_value(
        &paths.settings_cfg,
        "allow capsule shape",
        &prefs.get(PREF_CAPSULE_SHAPE),
    )?;
    cfgfile::write_value(
        &paths.settings_cfg,
        "preload enabled",
        &prefs.get(PREF_PRELOAD),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{paths, prefs::PREF_DATA_FILES};
    use std::{fs, path::Path, sync::mpsc};
    use tempfile::TempDir;

    fn seed_catalog(root: &Path) {
        for bundle in ["config", "engine", "resources"] {
            fs::create_dir_all(root.join(bundle)).unwrap();
        }
        fs::write(root.join("config/engine.cfg"), "# defaults\n").unwrap();
        fs::write(root.join("config/settings.cfg"), "# defaults\n").unwrap();
        fs::write(root.join("engine/runtime.bin"), "runtime").unwrap();
        fs::write(root.join("resources/core.pak"), "core").unwrap();
    }

    fn fixture() -> (TempDir, TempDir, StoragePaths, AssetCatalog) {
        let storage = TempDir::new().unwrap();
        let catalog_dir = TempDir::new().unwrap();
        seed_catalog(catalog_dir.path());
        let paths =
            paths::detect_paths(Some(storage.path()), Some(catalog_dir.path())).unwrap();
        let catalog = AssetCatalog::new(catalog_dir.path());
        (storage, catalog_dir, paths, catalog)
    }

    fn drain(rx: &mpsc::Receiver<LaunchMessage>) -> Vec<LaunchMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.recv_timeout(std::time::Duration::from_secs(10)) {
            let done = matches!(
                message,
                LaunchMessage::Finished | LaunchMessage::Failed(_)
            );
            messages.push(message);
            if done {
                break;
            }
        }
        messages
    }

    #[test]
    fn worker_walks_prepare_phases_in_order() {
        let (_storage, _catalog_dir, paths, catalog) = fixture();
        let prefs = Preferences::from_entries(&[(PREF_DATA_FILES, "/sdcard/data")]);
        let (tx, rx) = mpsc::channel();

        spawn_worker(paths.clone(), catalog, prefs, tx);
        let messages = drain(&rx);

        let labels: Vec<&str> = messages
            .iter()
            .map(|message| match message {
                LaunchMessage::Phase(phase) => phase.label(),
                LaunchMessage::Finished => "finished",
                LaunchMessage::Failed(_) => "failed",
            })
            .collect();
        assert_eq!(
            labels,
            vec![
                "bootstrapping",
                "staging assets",
                "syncing config",
                "finished"
            ]
        );

        assert_eq!(
            cfgfile::read_value(&paths.engine_cfg, "data")
                .unwrap()
                .as_deref(),
            Some("/sdcard/data")
        );
        assert!(paths.engine_dir.join("runtime.bin").exists());
    }

    #[test]
    fn failed_staging_stops_before_config_sync() {
        let storage = TempDir::new().unwrap();
        let catalog_dir = TempDir::new().unwrap();
        // Config bundle only: the engine/resources bundles are missing, so
        // staging must fail after bootstrap succeeds.
        fs::create_dir_all(catalog_dir.path().join("config")).unwrap();
        fs::write(catalog_dir.path().join("config/engine.cfg"), "# d\n").unwrap();
        fs::write(catalog_dir.path().join("config/settings.cfg"), "# d\n").unwrap();

        let paths =
            paths::detect_paths(Some(storage.path()), Some(catalog_dir.path())).unwrap();
        let catalog = AssetCatalog::new(catalog_dir.path());
        let (tx, rx) = mpsc::channel();

        spawn_worker(paths.clone(), catalog, Preferences::from_entries(&[]), tx);
        let messages = drain(&rx);

        let last = messages.last().unwrap();
        match last {
            LaunchMessage::Failed(err) => assert_eq!(err.phase, "staging assets"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!messages
            .iter()
            .any(|m| matches!(m, LaunchMessage::Phase(LaunchPhase::SyncingConfig))));
        // Managed files stay syntactically valid for the next attempt.
        assert_eq!(
            fs::read_to_string(&paths.engine_cfg).unwrap(),
            "# d\n"
        );
    }

    #[test]
    fn sync_config_writes_preferences_into_both_files() {
        let (_storage, _catalog_dir, paths, catalog) = fixture();
        bootstrap::ensure_defaults(&paths, &catalog).unwrap();
        let prefs = Preferences::from_entries(&[
            (PREF_DATA_FILES, "/sdcard/data"),
            ("ui_scaling", "2.0"),
        ]);

        sync_config(&paths, &prefs).unwrap();

        assert_eq!(
            cfgfile::read_value(&paths.engine_cfg, "resources").unwrap(),
            Some(paths.resources_dir.to_string_lossy().to_string())
        );
        assert_eq!(
            cfgfile::read_value(&paths.engine_cfg, "encoding")
                .unwrap()
                .as_deref(),
            Some("win1252")
        );
        assert_eq!(
            cfgfile::read_value(&paths.settings_cfg, "scaling factor")
                .unwrap()
                .as_deref(),
            Some("2.0")
        );
        assert_eq!(
            cfgfile::read_value(&paths.settings_cfg, "allow capsule shape")
                .unwrap()
                .as_deref(),
            Some("true")
        );
        assert_eq!(
            cfgfile::read_value(&paths.settings_cfg, "preload enabled")
                .unwrap()
                .as_deref(),
            Some("false")
        );
    }

    #[test]
    fn empty_data_path_is_written_as_is() {
        let (_storage, _catalog_dir, paths, catalog) = fixture();
        bootstrap::ensure_defaults(&paths, &catalog).unwrap();
        sync_config(&paths, &Preferences::from_entries(&[])).unwrap();
        assert_eq!(
            cfgfile::read_value(&paths.engine_cfg, "data")
                .unwrap()
                .as_deref(),
            Some("")
        );
    }
}
