mod app;
mod assets;
mod bootstrap;
mod cfgfile;
mod launch;
mod paths;
mod prefs;
mod resolution;

use anyhow::Result;
use launch::{LaunchPhase, ProcessHandoff, SurfaceHost};
use std::path::PathBuf;

/// Headless surface for CLI runs: there is no chrome to hide, and the
/// "surface" is the desktop resolution the engine defaults to when the
/// launcher cannot measure one.
struct HeadlessSurface;

impl SurfaceHost for HeadlessSurface {
    fn hide_chrome(&self) {}

    fn surface_size(&self) -> (u32, u32) {
        (1920, 1080)
    }
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1).peekable();
    let mut storage_root: Option<PathBuf> = None;
    let mut catalog_root: Option<PathBuf> = None;
    let mut do_launch = false;
    let mut do_reset = false;
    let mut sets: Vec<(String, String)> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--launch" | "-l" => do_launch = true,
            "--reset-config" => do_reset = true,
            "--set" => {
                let key = args.next();
                let value = args.next();
                match (key, value) {
                    (Some(key), Some(value)) => sets.push((key, value)),
                    _ => eprintln!("--set requires KEY and VALUE"),
                }
            }
            "--storage-root" => match args.next() {
                Some(path) => storage_root = Some(PathBuf::from(path)),
                None => eprintln!("--storage-root requires a path"),
            },
            "--assets" => match args.next() {
                Some(path) => catalog_root = Some(PathBuf::from(path)),
                None => eprintln!("--assets requires a path"),
            },
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => eprintln!("Unknown argument: {other}"),
        }
    }

    if !do_launch && !do_reset && sets.is_empty() {
        print_help();
        return Ok(());
    }

    let mut app = app::App::initialize(storage_root.as_deref(), catalog_root.as_deref())?;

    if !sets.is_empty() {
        for (key, value) in &sets {
            app.prefs.set(key, value);
        }
        app.prefs.save()?;
        println!("Saved {} preference(s)", sets.len());
    }

    if do_reset {
        app.reset_user_config()?;
        println!("{}", app.status);
    }

    if do_launch {
        let surface = HeadlessSurface;
        let handoff = ProcessHandoff::from_paths(&app.paths);
        match app.run_launch_blocking(&surface, &handoff) {
            LaunchPhase::Launched => println!("{}", app.status),
            LaunchPhase::Failed(message) => {
                eprintln!("Launch failed: {message}");
                std::process::exit(1);
            }
            other => eprintln!("Launch ended in unexpected phase: {}", other.label()),
        }
    }

    Ok(())
}

fn print_help() {
    println!("launchsmith");
    println!("  --launch                Prepare config and hand off to the engine");
    println!("  --reset-config          Restore the user config to bundled defaults");
    println!("  --set KEY VALUE         Store a launcher preference");
    println!("  --storage-root <path>   Override the engine storage root");
    println!("  --assets <path>         Override the asset catalog directory");
}
