use std::process::ExitCode;

use clap::Parser;

use orrery::{AppError, CliArgs, OrreryConfig};

const DEFAULT_LOG_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .init();

    let args = CliArgs::parse();

    match start(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn start(args: &CliArgs) -> Result<(), AppError> {
    let mut config = match &args.config {
        Some(path) => OrreryConfig::load(path)?,
        None => OrreryConfig::default(),
    };
    config.apply_cli_overrides(args);

    if args.dump_config {
        println!("{}", config.to_ron()?);
        return Ok(());
    }

    log::info!(
        "Starting orrery: {} bodies, {}x{} window",
        config.bodies.len(),
        config.window.width,
        config.window.height
    );
    orrery::run(config)
}
