mod cli;
mod commands;
mod error;
mod logging;
mod settings;

use std::path::Path;
use std::process::ExitCode;

use aus_platform::AppPaths;
use clap::Parser;
use serde::Serialize;

use crate::cli::{Cli, Command};
use crate::error::AppError;
use crate::settings::ServiceSettings;

fn render<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|error| AppError::output_failed("JSON", error))
}

async fn run(
    cli: &Cli,
    settings: &ServiceSettings,
    settings_path: Option<&Path>,
    paths: Option<&AppPaths>,
) -> Result<String, AppError> {
    match &cli.command {
        Command::Evaluate(args) => render(&commands::evaluate(args, settings, paths).await?),
        Command::CheckUrl(args) => render(&commands::check_url(args, settings)),
        Command::InitSettings(args) => {
            let path = settings_path.ok_or_else(AppError::settings_path_unavailable)?;
            render(&commands::init_settings(args, settings, path)?)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let paths = match AppPaths::new() {
        Ok(paths) => Some(paths),
        Err(error) => {
            eprintln!("warning: {error}; using explicit paths only");
            None
        }
    };

    let settings_path = cli
        .settings
        .clone()
        .or_else(|| paths.as_ref().map(AppPaths::settings_file));
    let (settings, settings_error) = match settings_path.as_deref() {
        Some(path) => match ServiceSettings::load_from(path) {
            Ok(settings) => (settings, None),
            Err(error) => (ServiceSettings::default(), Some(error)),
        },
        None => (ServiceSettings::default(), None),
    };

    let log_path = paths.as_ref().map(AppPaths::log_file);
    logging::init_logging(
        log_path.as_deref(),
        cli.debug || settings.debug_logging,
        settings.max_log_size_bytes,
    );
    if let Some(error) = settings_error {
        log::warn!("{error}; falling back to default settings");
    }

    match run(&cli, &settings, settings_path.as_deref(), paths.as_ref()).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            log::error!("{error}");
            ExitCode::FAILURE
        }
    }
}
