use std::path::PathBuf;

use aus_backend::{ForceResult, UpdateQuery};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "aus", version, about = "Decide which update a client should receive")]
pub struct Cli {
    /// Settings file. Defaults to the platform config directory.
    #[arg(long, global = true, env = "AUS_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate the rules of a data set for one update query.
    Evaluate(EvaluateArgs),
    /// Check a download URL against the domain allowlist and special hosts.
    CheckUrl(CheckUrlArgs),
    /// Write the effective settings to the settings file.
    InitSettings(InitSettingsArgs),
}

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Data set holding rules, releases and shutoffs.
    #[arg(long, env = "AUS_DATA_SET")]
    pub data: Option<PathBuf>,

    #[arg(long)]
    pub product: String,

    #[arg(long)]
    pub channel: String,

    #[arg(long, default_value = "")]
    pub version: String,

    #[arg(long, default_value = "")]
    pub build_id: String,

    #[arg(long)]
    pub build_target: Option<String>,

    #[arg(long)]
    pub locale: Option<String>,

    #[arg(long)]
    pub os_version: Option<String>,

    #[arg(long)]
    pub distribution: Option<String>,

    /// `1` forces the primary release, `-1` the fallback.
    #[arg(long, allow_hyphen_values = true)]
    pub force: Option<String>,

    /// Seed for the rollout draw, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl EvaluateArgs {
    pub fn query(&self) -> UpdateQuery {
        let mut query = UpdateQuery::new(self.product.as_str(), self.channel.as_str())
            .with_version(self.version.as_str())
            .with_build_id(self.build_id.as_str())
            .with_force(ForceResult::from_query_value(self.force.as_deref()));
        query.build_target.clone_from(&self.build_target);
        query.locale.clone_from(&self.locale);
        query.os_version.clone_from(&self.os_version);
        query.distribution.clone_from(&self.distribution);
        query
    }
}

#[derive(Debug, Args)]
pub struct CheckUrlArgs {
    pub url: String,

    #[arg(long)]
    pub product: String,
}

#[derive(Debug, Args)]
pub struct InitSettingsArgs {
    /// Replace an existing settings file.
    #[arg(long)]
    pub overwrite: bool,
}
