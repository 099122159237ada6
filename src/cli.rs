//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::OrreryConfig;

/// Orrery command-line arguments.
///
/// CLI values override settings loaded from the config file.
#[derive(Parser, Debug)]
#[command(name = "orrery", about = "A toy solar system rendered with wgpu")]
pub struct CliArgs {
    /// RON config file. Built-in defaults are used when omitted.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Start with the simulation paused.
    #[arg(long)]
    pub paused: bool,

    /// Angular step of the sphere tessellation, in radians.
    #[arg(long)]
    pub step: Option<f32>,

    /// Use radial vertex normals instead of the constant placeholder.
    #[arg(long)]
    pub outward_normals: bool,

    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Print the effective configuration as RON and exit.
    #[arg(long)]
    pub dump_config: bool,
}

impl OrreryConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if args.paused {
            self.scene.start_paused = true;
        }
        if let Some(step) = args.step {
            self.scene.sphere_step = step;
        }
        if args.outward_normals {
            self.scene.outward_normals = true;
        }
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
    }
}
