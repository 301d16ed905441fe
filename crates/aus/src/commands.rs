use std::path::{Path, PathBuf};
use std::sync::Arc;

use aus_backend::UpdateQuery;
use aus_core::{
    Decision, LegacyFallbackResolver, RuleEngine, SeededDice, is_forbidden_url, is_special_url,
};
use aus_memory::DataSet;
use aus_platform::AppPaths;
use serde::Serialize;

use crate::cli::{CheckUrlArgs, EvaluateArgs, InitSettingsArgs};
use crate::error::AppError;
use crate::settings::ServiceSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlReport {
    pub url: String,
    pub forbidden: bool,
    pub special: bool,
}

impl UrlReport {
    fn new(url: &str, product: &str, settings: &ServiceSettings) -> Self {
        Self {
            url: url.to_string(),
            forbidden: is_forbidden_url(url, product, &settings.domain_allowlist),
            special: is_special_url(url, &settings.special_force_hosts),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub query: UpdateQuery,
    pub decision: Decision,
    pub urls: Vec<UrlReport>,
}

/// `--data` wins over the settings file, which wins over the platform
/// default location.
fn data_set_path(
    args: &EvaluateArgs,
    settings: &ServiceSettings,
    paths: Option<&AppPaths>,
) -> Option<PathBuf> {
    args.data
        .clone()
        .or_else(|| settings.data_set.clone())
        .or_else(|| paths.map(AppPaths::data_set_file))
}

fn build_engine(data_set: &DataSet, settings: &ServiceSettings, seed: Option<u64>) -> RuleEngine {
    let releases = LegacyFallbackResolver::new(
        Arc::new(data_set.release_store()),
        Arc::new(data_set.legacy_release_store()),
    );
    let engine = RuleEngine::new(
        Arc::new(settings.build_cache()),
        Arc::new(data_set.shutoff_registry()),
        Arc::new(data_set.rule_store()),
        Arc::new(releases),
    );
    match seed {
        Some(seed) => engine.with_dice(Arc::new(SeededDice::new(seed))),
        None => engine,
    }
}

pub async fn evaluate(
    args: &EvaluateArgs,
    settings: &ServiceSettings,
    paths: Option<&AppPaths>,
) -> Result<EvaluationReport, AppError> {
    let path =
        data_set_path(args, settings, paths).ok_or_else(AppError::data_set_not_configured)?;
    let data_set =
        DataSet::load(&path).map_err(|error| AppError::data_set_load_failed(&path, error))?;
    let engine = build_engine(&data_set, settings, args.seed);

    let query = args.query();
    let decision = engine
        .evaluate_rules(&query, None)
        .await
        .map_err(AppError::evaluation_failed)?;
    log::info!(
        "{}/{} evaluated with {}: {:?}",
        query.product,
        query.channel,
        decision.metadata,
        decision.outcome
    );

    let urls = decision
        .payload()
        .map(|payload| {
            payload
                .urls()
                .into_iter()
                .map(|url| UrlReport::new(url, &query.product, settings))
                .collect()
        })
        .unwrap_or_default();

    Ok(EvaluationReport {
        query,
        decision,
        urls,
    })
}

pub fn check_url(args: &CheckUrlArgs, settings: &ServiceSettings) -> UrlReport {
    UrlReport::new(&args.url, &args.product, settings)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitSettingsReport {
    pub path: PathBuf,
    pub written: bool,
}

/// Write `settings` to `path`, leaving an existing file alone unless asked
/// to overwrite it.
pub fn init_settings(
    args: &InitSettingsArgs,
    settings: &ServiceSettings,
    path: &Path,
) -> Result<InitSettingsReport, AppError> {
    if path.exists() && !args.overwrite {
        log::info!("Settings file {} already exists", path.display());
        return Ok(InitSettingsReport {
            path: path.to_path_buf(),
            written: false,
        });
    }

    settings
        .save_to(path)
        .map_err(|error| AppError::settings_write_failed(path, error))?;
    log::info!("Wrote settings to {}", path.display());
    Ok(InitSettingsReport {
        path: path.to_path_buf(),
        written: true,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use aus_core::Outcome;
    use clap::Parser;
    use serde_json::json;
    use tempfile::tempdir;

    use super::{check_url, evaluate, init_settings};
    use crate::cli::{Cli, Command, EvaluateArgs, InitSettingsArgs};
    use crate::error::AppError;
    use crate::settings::ServiceSettings;

    fn evaluate_args(data: &Path, extra: &[&str]) -> EvaluateArgs {
        let data = data.to_string_lossy().into_owned();
        let mut argv = vec![
            "aus",
            "evaluate",
            "--data",
            data.as_str(),
            "--product",
            "Firefox",
            "--channel",
            "release-cck-acme",
            "--version",
            "60.0",
            "--build-id",
            "20180501000000",
        ];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).expect("arguments should parse").command {
            Command::Evaluate(args) => args,
            _ => panic!("expected evaluate command"),
        }
    }

    fn write_data_set(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("data.json");
        let data = json!({
            "rules": [{
                "rule_id": 12,
                "data_version": 4,
                "priority": 100,
                "product": "Firefox",
                "channel": "release",
                "mapping": "Firefox-61.0-build1",
                "fallback_mapping": "Firefox-60.0.1-build1",
                "background_rate": 25,
                "update_type": "minor"
            }],
            "releases": [{
                "name": "Firefox-61.0-build1",
                "product": "Firefox",
                "blob": {
                    "schema_version": 1,
                    "name": "Firefox-61.0-build1",
                    "app_version": "61.0",
                    "build_id": "20180601000000",
                    "update_url": "https://download.example.com/firefox-61.0.mar"
                }
            }],
            "legacy_releases": [{
                "name": "Firefox-60.0.1-build1",
                "product": "Firefox",
                "blob": {
                    "schema_version": 1,
                    "name": "Firefox-60.0.1-build1",
                    "app_version": "60.0.1",
                    "build_id": "20180515000000",
                    "update_url": "https://mirror.example.net/firefox-60.0.1.mar"
                }
            }]
        });
        std::fs::write(&path, data.to_string()).expect("write data set");
        path
    }

    fn settings() -> ServiceSettings {
        serde_json::from_value(json!({
            "domain_allowlist": { "download.example.com": ["Firefox"] },
            "special_force_hosts": ["https://download.example.com/firefox-61"]
        }))
        .expect("settings JSON should deserialize")
    }

    #[tokio::test]
    async fn forced_primary_reports_the_update_and_its_url() {
        let temp_dir = tempdir().expect("create temp dir");
        let data = write_data_set(temp_dir.path());

        let report = evaluate(&evaluate_args(&data, &["--force", "1"]), &settings(), None)
            .await
            .expect("evaluation succeeds");

        assert_eq!(report.decision.metadata.rule_id, Some(12));
        assert!(matches!(
            report.decision.outcome,
            Outcome::Served { ref release, .. } if release == "Firefox-61.0-build1"
        ));
        assert_eq!(report.urls.len(), 1);
        assert!(!report.urls[0].forbidden);
        assert!(report.urls[0].special);

        let rendered = serde_json::to_value(&report).expect("report serializes");
        assert_eq!(rendered["decision"]["update"]["update_type"], "minor");
        assert_eq!(rendered["decision"]["metadata"]["rule_data_version"], 4);
    }

    #[tokio::test]
    async fn forced_fallback_resolves_from_the_legacy_table() {
        let temp_dir = tempdir().expect("create temp dir");
        let data = write_data_set(temp_dir.path());

        let report = evaluate(&evaluate_args(&data, &["--force", "-1"]), &settings(), None)
            .await
            .expect("evaluation succeeds");

        assert!(matches!(
            report.decision.outcome,
            Outcome::Served { ref release, .. } if release == "Firefox-60.0.1-build1"
        ));
        assert!(report.urls[0].forbidden);
        assert!(!report.urls[0].special);
    }

    #[tokio::test]
    async fn seeded_runs_are_reproducible() {
        let temp_dir = tempdir().expect("create temp dir");
        let data = write_data_set(temp_dir.path());
        let args = evaluate_args(&data, &["--seed", "11"]);

        let first = evaluate(&args, &settings(), None)
            .await
            .expect("evaluation succeeds");
        let second = evaluate(&args, &settings(), None)
            .await
            .expect("evaluation succeeds");

        assert_eq!(first.decision, second.decision);
    }

    #[tokio::test]
    async fn missing_data_set_is_reported() {
        let temp_dir = tempdir().expect("create temp dir");
        let data = temp_dir.path().join("absent.json");

        let error = evaluate(&evaluate_args(&data, &[]), &settings(), None)
            .await
            .expect_err("missing data set must fail");

        assert!(matches!(error, AppError::DataSetLoadFailed { .. }));
    }

    #[test]
    fn check_url_applies_both_predicates() {
        let cli = Cli::try_parse_from([
            "aus",
            "check-url",
            "https://evil.example.org/a.mar",
            "--product",
            "Firefox",
        ])
        .expect("arguments should parse");
        let Command::CheckUrl(args) = cli.command else {
            panic!("expected check-url command");
        };

        let report = check_url(&args, &settings());

        assert!(report.forbidden);
        assert!(!report.special);
    }

    #[test]
    fn init_settings_keeps_an_existing_file_unless_overwriting() {
        let temp_dir = tempdir().expect("create temp dir");
        let path = temp_dir.path().join("config").join("settings.json");

        let created = init_settings(
            &InitSettingsArgs { overwrite: false },
            &settings(),
            &path,
        )
        .expect("settings are written");
        std::fs::write(&path, "{}").expect("replace settings");
        let kept = init_settings(
            &InitSettingsArgs { overwrite: false },
            &settings(),
            &path,
        )
        .expect("existing settings are kept");

        assert!(created.written);
        assert!(!kept.written);
        assert_eq!(
            std::fs::read_to_string(&path).expect("read settings"),
            "{}"
        );

        let replaced = init_settings(&InitSettingsArgs { overwrite: true }, &settings(), &path)
            .expect("settings are overwritten");
        let reloaded = ServiceSettings::load_from(&path).expect("load settings");
        assert!(replaced.written);
        assert_eq!(reloaded.special_force_hosts, settings().special_force_hosts);
    }
}
