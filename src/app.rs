use crate::{
    assets::AssetCatalog,
    bootstrap,
    launch::{self, EngineHandoff, LaunchMessage, LaunchPhase, SurfaceHost},
    paths::{self, StoragePaths},
    prefs::{Preferences, PREF_CUSTOM_RESOLUTION},
    resolution::{self, Resolution},
};
use anyhow::{Context, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    time::Duration,
};

const LOG_CAPACITY: usize = 500;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

pub struct App {
    pub paths: StoragePaths,
    pub catalog: AssetCatalog,
    pub prefs: Preferences,
    pub status: String,
    pub launch_phase: LaunchPhase,
    launch_active: bool,
    launch_tx: Sender<LaunchMessage>,
    launch_rx: Receiver<LaunchMessage>,
    logs: Vec<LogEntry>,
    log_path: PathBuf,
}

impl App {
    pub fn initialize(
        storage_root_override: Option<&Path>,
        catalog_root_override: Option<&Path>,
    ) -> Result<Self> {
        let storage_paths = paths::detect_paths(storage_root_override, catalog_root_override)?;
        let data_dir = paths::app_data_dir()?;
        fs::create_dir_all(&data_dir).context("create app data dir")?;
        let prefs = Preferences::load_or_create(&data_dir)?;
        let log_path = data_dir.join("launchsmith.log");
        Ok(Self::assemble(storage_paths, prefs, log_path))
    }

    fn assemble(storage_paths: StoragePaths, prefs: Preferences, log_path: PathBuf) -> Self {
        let catalog = AssetCatalog::new(storage_paths.catalog_root.clone());
        let (launch_tx, launch_rx) = mpsc::channel();
        App {
            paths: storage_paths,
            catalog,
            prefs,
            status: String::new(),
            launch_phase: LaunchPhase::Idle,
            launch_active: false,
            launch_tx,
            launch_rx,
            logs: Vec::new(),
            log_path,
        }
    }

    /// Kicks off one launch attempt. Chrome is hidden up front so the surface
    /// size read after the worker finishes reflects the final render surface.
    /// A request while an attempt is already in flight is ignored: two
    /// attempts would race on the managed config files.
    pub fn start_launch(&mut self, surface: &dyn SurfaceHost) {
        if self.launch_active {
            self.log_warn("Launch already in progress, ignoring request".to_string());
            return;
        }
        self.launch_active = true;
        self.launch_phase = LaunchPhase::Idle;
        self.status = "Preparing for launch...".to_string();
        self.log_info("Launch requested".to_string());

        surface.hide_chrome();

        launch::spawn_worker(
            self.paths.clone(),
            self.catalog.clone(),
            self.prefs.clone(),
            self.launch_tx.clone(),
        );
    }

    /// Drains worker messages. On `Finished` it runs the foreground
    /// continuation: measure the surface, resolve and persist the resolution,
    /// then hand off to the engine exactly once.
    pub fn poll_launch(&mut self, surface: &dyn SurfaceHost, handoff: &dyn EngineHandoff) {
        loop {
            match self.launch_rx.try_recv() {
                Ok(LaunchMessage::Phase(phase)) => {
                    self.status = format!("Preparing for launch: {}...", phase.label());
                    self.launch_phase = phase;
                }
                Ok(LaunchMessage::Finished) => {
                    self.finish_launch(surface, handoff);
                }
                Ok(LaunchMessage::Failed(err)) => {
                    self.fail_launch(err.to_string());
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Runs one full attempt to a terminal phase. Used by the CLI entry.
    pub fn run_launch_blocking(
        &mut self,
        surface: &dyn SurfaceHost,
        handoff: &dyn EngineHandoff,
    ) -> LaunchPhase {
        self.start_launch(surface);
        while !self.launch_phase.is_terminal() {
            self.poll_launch(surface, handoff);
            if self.launch_phase.is_terminal() {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        self.launch_phase.clone()
    }

    fn finish_launch(&mut self, surface: &dyn SurfaceHost, handoff: &dyn EngineHandoff) {
        self.launch_phase = LaunchPhase::ResolvingResolution;
        let (width, height) = surface.surface_size();
        let resolved = resolution::resolve(
            Resolution { width, height },
            &self.prefs.get(PREF_CUSTOM_RESOLUTION),
        );
        if let Err(err) = resolution::persist(resolved, &self.paths.settings_cfg) {
            self.fail_launch(format!("persist resolution: {err:#}"));
            return;
        }
        self.log_info(format!(
            "Resolution set to {}x{}",
            resolved.width, resolved.height
        ));

        self.log_config_snapshot();

        self.launch_phase = LaunchPhase::ReadyToLaunch;
        match handoff.launch(&self.paths) {
            Ok(()) => {
                self.launch_phase = LaunchPhase::Launched;
                self.launch_active = false;
                self.status = "Engine launched".to_string();
                self.log_info("Hand-off complete".to_string());
            }
            Err(err) => {
                self.fail_launch(format!("engine hand-off: {err:#}"));
            }
        }
    }

    fn fail_launch(&mut self, message: String) {
        self.log_error(format!("Launch failed: {message}"));
        self.status = format!("Launch failed: {message}");
        self.launch_phase = LaunchPhase::Failed(message);
        self.launch_active = false;
    }

    /// Explicit user command, independent of the pre-launch repair path.
    pub fn reset_user_config(&mut self) -> Result<()> {
        bootstrap::reset_user_config(&self.paths, &self.catalog)?;
        self.status = "Config was reset to defaults".to_string();
        self.log_info("User config reset to defaults".to_string());
        Ok(())
    }

    /// Appends the current engine.cfg contents to the diagnostics log so a
    /// failed engine start can be diagnosed after the fact. Best-effort:
    /// snapshot trouble never fails a launch. Fallback lines are noise and
    /// skipped.
    fn log_config_snapshot(&mut self) {
        let Ok(raw) = fs::read_to_string(&self.paths.engine_cfg) else {
            return;
        };
        self.log_info(format!("{} snapshot:", paths::ENGINE_CFG));
        for line in raw.lines() {
            if line.contains("fallback=") {
                continue;
            }
            let _ = append_log_file(&self.log_path, LogLevel::Info, line);
        }
    }

    pub fn log_info(&mut self, message: String) {
        self.push_log(LogLevel::Info, message);
    }

    pub fn log_warn(&mut self, message: String) {
        self.push_log(LogLevel::Warn, message);
    }

    pub fn log_error(&mut self, message: String) {
        self.push_log(LogLevel::Error, message);
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        self.logs.push(LogEntry {
            level,
            message: message.clone(),
        });
        if self.logs.len() > LOG_CAPACITY {
            let overflow = self.logs.len() - LOG_CAPACITY;
            self.logs.drain(0..overflow);
        }
        let _ = append_log_file(&self.log_path, level, &message);
    }
}

fn log_level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error => "ERROR",
    }
}

fn log_timestamp() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

fn append_log_file(path: &PathBuf, level: LogLevel, message: &str) -> std::io::Result<()> {
    let label = log_level_label(level);
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{} [{label}] {message}", log_timestamp())
}
