use super::Host;
use super::config::Config;
use crate::Result;
use crate::facts::{ActivityWindow, MAX_WINDOW_DAYS, RepoSpec};
use crate::pipeline::{FatalError, OutputBundle, PhaseOrchestrator, ProjectRef};
use crate::source::{AuthProvider, Connector, GitHubConnector, StaticToken};
use camino::Utf8PathBuf;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use ohno::IntoAppError;
use std::fs;
use std::io::Write;

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

#[derive(Parser, Debug)]
pub struct CollectArgs {
    /// Owner (organization or user) of the project
    #[arg(long, value_name = "OWNER")]
    pub owner: String,

    /// Number of the project to collect
    #[arg(long, value_name = "NUMBER", conflicts_with = "repo")]
    pub project: Option<u64>,

    /// Collect the open project linked to this repository (`OWNER/NAME`, or `NAME` within --owner)
    #[arg(long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Number of days of activity to measure (default comes from the configuration file)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS)))]
    pub days: Option<u32>,

    /// Write the output bundle to this file instead of to stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    /// Path to configuration file (default is `repopulse.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

impl CollectArgs {
    /// The project reference the arguments select.
    pub fn target(&self) -> Result<ProjectRef> {
        let owner = self.owner.clone();

        if let Some(number) = self.project {
            return Ok(ProjectRef::Explicit { owner, number });
        }

        match &self.repo {
            Some(repo) => {
                let repository = if repo.contains('/') {
                    RepoSpec::parse(repo)?
                } else {
                    RepoSpec::new(&owner, repo)?
                };
                Ok(ProjectRef::Inferred { owner, repository })
            }
            None => Ok(ProjectRef::Owner { owner }),
        }
    }
}

pub async fn process_collect<H: Host>(host: &mut H, args: &CollectArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(&Utf8PathBuf::from("."), args.config.as_ref())?;
    let connector = GitHubConnector::new(config.api_url.clone(), config.page_size, config.request_timeout);
    let auth = StaticToken::new(args.github_token.clone());

    collect(host, args, &config, auth, connector).await
}

/// Runs the pipeline with the given credential provider and connector and reports the outcome.
async fn collect<H: Host, A: AuthProvider, C: Connector>(host: &mut H, args: &CollectArgs, config: &Config, auth: A, connector: C) -> Result<()> {
    let target = args.target()?;
    let window = ActivityWindow::last_days(Utc::now(), args.days.unwrap_or(config.window_days))?;

    let orchestrator = PhaseOrchestrator::new(auth, connector, config.collect_options(), config.retry_policy(), config.max_concurrency);

    match orchestrator.run(&target, window).await {
        Ok(bundle) => write_bundle(host, &bundle, args.output.as_ref()),
        Err(failure) => {
            report_failure(host, &failure.error);
            host.exit(1);
            Ok(())
        }
    }
}

fn write_bundle<H: Host>(host: &mut H, bundle: &OutputBundle, output: Option<&Utf8PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(bundle).into_app_err("serializing the output bundle")?;

    if let Some(path) = output {
        fs::write(path, json).into_app_err_with(|| format!("writing the output bundle to '{path}'"))?;
        let _ = writeln!(
            host.error(),
            "Collected {} repositories ({}) into {path}",
            bundle.entities.repositories.len(),
            bundle.status.state
        );
    } else {
        let _ = writeln!(host.output(), "{json}");
    }

    Ok(())
}

fn report_failure<H: Host>(host: &mut H, error: &FatalError) {
    let mut err = host.error();
    let _ = writeln!(err, "error: {error}");
    let _ = writeln!(err, "class: {}", error.class);

    if !error.suggestions.is_empty() {
        let _ = writeln!(err, "\nsuggestions:");
        for (index, suggestion) in error.suggestions.iter().enumerate() {
            let _ = writeln!(err, "  {}. {suggestion}", index + 1);
        }
    }

    let context = &error.context;
    let _ = writeln!(err, "\ncontext:");
    for (name, value) in &context.inputs {
        let _ = writeln!(err, "  {name}: {value}");
    }
    for (name, value) in &context.counters {
        let _ = writeln!(err, "  {name}: {value}");
    }
    if !context.candidates.is_empty() {
        let _ = writeln!(err, "  candidates:");
        for candidate in &context.candidates {
            let _ = writeln!(err, "    - {candidate}");
        }
    }
    if !context.failures.is_empty() {
        let _ = writeln!(err, "  failed repositories:");
        for failure in &context.failures {
            let _ = writeln!(err, "    - {}: {}", failure.repository, failure.cause);
        }
    }
}

/// Initialize logger based on log level
fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use crate::source::Credential;
    use crate::source::fake::{FakeRepo, FakeSource};
    use serde_json::{Value, json};

    struct FakeConnector(fn() -> FakeSource);

    impl Connector for FakeConnector {
        type Source = FakeSource;

        fn connect(&self, _credential: &Credential) -> Result<FakeSource> {
            Ok((self.0)())
        }
    }

    fn args(extra: &[&str]) -> CollectArgs {
        let mut argv = vec!["collect", "--owner", "octo-org"];
        argv.extend_from_slice(extra);
        CollectArgs::parse_from(argv)
    }

    fn source() -> FakeSource {
        FakeSource::new()
            .with_project(
                "octo-org",
                json!({
                    "number": 7,
                    "title": "Roadmap",
                    "closed": false,
                    "updatedAt": "2024-05-01T00:00:00Z",
                    "owner": { "login": "octo-org" },
                    "repositories": { "nodes": [{ "nameWithOwner": "octo-org/api" }] }
                }),
            )
            .with_repo(FakeRepo::rest("octo-org/api"))
    }

    fn empty_source() -> FakeSource {
        FakeSource::new()
    }

    #[test]
    fn test_target_from_arguments() {
        assert_eq!(
            args(&["--project", "3"]).target().unwrap(),
            ProjectRef::Explicit {
                owner: "octo-org".to_string(),
                number: 3
            }
        );

        let ProjectRef::Inferred { repository, .. } = args(&["--repo", "api"]).target().unwrap() else {
            unreachable!("--repo selects an inferred project");
        };
        assert_eq!(repository.full_name(), "octo-org/api");

        let ProjectRef::Inferred { repository, .. } = args(&["--repo", "other/lib"]).target().unwrap() else {
            unreachable!("--repo selects an inferred project");
        };
        assert_eq!(repository.full_name(), "other/lib");

        assert!(matches!(args(&[]).target().unwrap(), ProjectRef::Owner { .. }));
    }

    #[test]
    fn test_days_out_of_range_rejected() {
        assert!(CollectArgs::try_parse_from(["collect", "--owner", "o", "--days", "4000000000"]).is_err());
        assert!(CollectArgs::try_parse_from(["collect", "--owner", "o", "--days", "0"]).is_err());
        assert_eq!(args(&["--days", "36500"]).days, Some(MAX_WINDOW_DAYS));
    }

    #[tokio::test]
    async fn test_oversized_configured_window_is_an_error() {
        let mut host = TestHost::new();
        let config = Config {
            window_days: 50_000_000,
            ..Config::default()
        };

        let result = collect(&mut host, &args(&[]), &config, StaticToken::new(Some("t0ken".to_string())), FakeConnector(source)).await;

        assert!(result.is_err());
        assert_eq!(host.exit_code, None);
    }

    #[test]
    fn test_project_and_repo_conflict() {
        let result = CollectArgs::try_parse_from(["collect", "--owner", "o", "--project", "1", "--repo", "o/a"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_bundle_written_to_output() {
        let mut host = TestHost::new();
        let auth = StaticToken::new(Some("t0ken".to_string()));

        collect(&mut host, &args(&[]), &Config::default(), auth, FakeConnector(source)).await.unwrap();

        assert_eq!(host.exit_code, None);
        let bundle: Value = serde_json::from_str(&host.output_text()).unwrap();
        assert_eq!(bundle["project"]["number"], 7);
        assert_eq!(bundle["status"]["state"], "complete");
        assert_eq!(bundle["entities"]["repositories"][0]["name"], "api");
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn test_bundle_written_to_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bundle.json");
        let mut host = TestHost::new();
        let auth = StaticToken::new(Some("t0ken".to_string()));

        collect(
            &mut host,
            &args(&["--output", path.to_str().unwrap()]),
            &Config::default(),
            auth,
            FakeConnector(source),
        )
        .await
        .unwrap();

        assert!(host.output_buf.is_empty());
        let bundle: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(bundle["window"]["since"].is_string());
        assert!(host.error_text().contains("bundle.json"));
    }

    #[tokio::test]
    async fn test_fatal_error_reported_with_exit_code() {
        let mut host = TestHost::new();
        let auth = StaticToken::new(Some("t0ken".to_string()));

        collect(&mut host, &args(&["--project", "9"]), &Config::default(), auth, FakeConnector(empty_source))
            .await
            .unwrap();

        assert_eq!(host.exit_code, Some(1));
        let report = host.error_text();
        assert!(report.starts_with("error: DETECT failed"));
        assert!(report.contains("class: validation"));
        assert!(report.contains("  1. "));
        assert!(report.contains("target: project octo-org#9"));
    }

    #[tokio::test]
    async fn test_missing_token_is_fatal() {
        let mut host = TestHost::new();

        collect(&mut host, &args(&[]), &Config::default(), StaticToken::new(None), FakeConnector(source))
            .await
            .unwrap();

        assert_eq!(host.exit_code, Some(1));
        assert!(host.error_text().contains("class: authorization"));
    }
}
