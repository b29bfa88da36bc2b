//! harbor-policy: converge Harbor policy resources to a declared state.
//!
//! Prints the run result as JSON on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use harbor_policy::reconciler::{
    RetentionReconciler, RetentionSpec, ScanScheduleReconciler, ScanScheduleSpec,
    TagImmutabilityReconciler, TagImmutabilitySpec,
};
use harbor_policy::resources::{ImmutabilityDecl, RetentionRule, ScheduleType};
use harbor_policy::{
    Failure, HttpTransport, Reconciler, RegistryClient, RegistryConfig, RunMode, RunResult,
};

#[derive(Parser)]
#[command(name = "harbor-policy", version)]
#[command(about = "Converge Harbor retention, scan-all and tag immutability settings")]
struct Cli {
    /// Registry API base URL (e.g. https://harbor.example.com/api/v2.0)
    #[arg(long, env = "HARBOR_API_URL")]
    api_url: String,

    /// API username
    #[arg(long, env = "HARBOR_API_USERNAME")]
    api_username: Option<String>,

    /// API password
    #[arg(long, env = "HARBOR_API_PASSWORD", hide_env_values = true)]
    api_password: Option<String>,

    /// Verify the registry TLS certificate
    #[arg(long, env = "HARBOR_API_VERIFY", default_value_t = true, action = ArgAction::Set)]
    api_verify: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Report what would change without writing
    #[arg(long)]
    check: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the retention policy of a project
    Retention {
        /// Project name
        #[arg(long)]
        project: String,

        /// YAML or JSON file with the list of retention rules
        #[arg(long)]
        rules: PathBuf,

        /// Schedule of the retention runs in cron format
        #[arg(long)]
        schedule_cron: String,

        /// Write the policy even when it already matches
        #[arg(long)]
        force: bool,
    },

    /// Set the system-wide scan-all schedule
    ScanAllSchedule {
        /// Schedule in cron format
        #[arg(long)]
        schedule_cron: String,

        /// Schedule type
        #[arg(long = "type", value_enum, default_value_t = ScheduleType::Custom)]
        kind: ScheduleType,
    },

    /// Make the tag immutability rules of a project match a declared list
    TagImmutability {
        /// Project name
        #[arg(long)]
        project: String,

        /// YAML or JSON file with the list of {repository, tag} rules
        #[arg(long)]
        rules: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "harbor_policy=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(result) => {
            info!(changed = result.changed, "Run complete");
            emit(&result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            emit(&Failure::new(format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunResult> {
    let config = RegistryConfig::new(cli.api_url)
        .with_optional_credentials(cli.api_username, cli.api_password)
        .with_verify_tls(cli.api_verify)
        .with_timeout(std::time::Duration::from_secs(cli.timeout));

    let transport = HttpTransport::new(&config).context("Failed to build HTTP client")?;
    let client = RegistryClient::new(Arc::new(transport));
    let mode = RunMode::from_check_flag(cli.check);

    let result = match cli.command {
        Commands::Retention {
            project,
            rules,
            schedule_cron,
            force,
        } => {
            let spec = RetentionSpec {
                project,
                rules: load_list::<RetentionRule>(&rules)?,
                schedule_cron,
                force,
            };
            RetentionReconciler::new(client).reconcile(&spec, mode).await?
        }
        Commands::ScanAllSchedule {
            schedule_cron,
            kind,
        } => {
            let spec = ScanScheduleSpec {
                cron: schedule_cron,
                kind,
            };
            ScanScheduleReconciler::new(client).reconcile(&spec, mode).await?
        }
        Commands::TagImmutability { project, rules } => {
            let spec = TagImmutabilitySpec {
                project,
                rules: load_list::<ImmutabilityDecl>(&rules)?,
            };
            TagImmutabilityReconciler::new(client).reconcile(&spec, mode).await?
        }
    };

    Ok(result)
}

/// Read a declaration list. YAML is a superset of JSON, so one parser covers both.
fn load_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("Invalid declaration in {}", path.display()))
}

fn emit<T: serde::Serialize>(value: &T) {
    println!("{}", render(value));
}

fn render<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        serde_json::json!({"failed": true, "changed": false, "msg": e.to_string()}).to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_policy::resources::immutability::{RepoDecoration, TagDecoration};
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_yaml_immutability_rules() {
        let file = write_temp(
            "- repository:\n    kind: repoMatches\n    pattern: \"**\"\n  tag:\n    kind: matches\n    pattern: test\n",
        );
        let rules: Vec<ImmutabilityDecl> = load_list(file.path()).unwrap();
        assert_eq!(
            rules,
            vec![ImmutabilityDecl::new(
                RepoDecoration::RepoMatches,
                "**",
                TagDecoration::Matches,
                "test"
            )]
        );
    }

    #[test]
    fn loads_json_retention_rules() {
        let file = write_temp(
            r#"[{"action":"retain","params":{"latestPushedK":10},
                "scope_selectors":{"repository":[{"kind":"doublestar","decoration":"repoMatches","pattern":"**"}]},
                "tag_selectors":[{"kind":"doublestar","decoration":"matches","pattern":"**"}],
                "template":"latestPushedK"}]"#,
        );
        let rules: Vec<RetentionRule> = load_list(file.path()).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].params["latestPushedK"], 10);
    }

    #[test]
    fn rejects_invalid_tag_kind() {
        let file = write_temp(
            "- repository:\n    kind: repoMatches\n    pattern: \"**\"\n  tag:\n    kind: sometimes\n    pattern: test\n",
        );
        assert!(load_list::<ImmutabilityDecl>(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_list::<RetentionRule>(Path::new("/nonexistent/rules.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rules.yaml"));
    }

    #[test]
    fn parses_schedule_command() {
        let cli = Cli::try_parse_from([
            "harbor-policy",
            "--api-url",
            "https://harbor.local/api/v2.0",
            "--api-verify",
            "false",
            "--check",
            "scan-all-schedule",
            "--schedule-cron",
            "0 0 0 * * 0",
        ])
        .unwrap();

        assert!(!cli.api_verify);
        assert!(cli.check);
        match cli.command {
            Commands::ScanAllSchedule { kind, .. } => assert_eq!(kind, ScheduleType::Custom),
            _ => panic!("expected scan-all-schedule"),
        }
    }

    #[test]
    fn failure_message_is_escaped() {
        let rendered = render(&Failure::new(r#"Invalid declaration in "rules.yaml": \bad"#));
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["failed"], true);
        assert_eq!(parsed["changed"], false);
        assert_eq!(parsed["msg"], r#"Invalid declaration in "rules.yaml": \bad"#);
    }
}
