//! jenkins-trigger - trigger a Jenkins job from the command line
//!
//! Triggers one job, optionally waits for the build to finish, and exits
//! non-zero on any failure so it can gate a pipeline step.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use jenkins_client::JenkinsClient;
use tracing::{debug, Level};
use trigger_core::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_SERVER_URL};
use trigger_core::{
    parse_duration, resolve_parameters, run_trigger, BuildRequest, JobConfig, ProgressSink,
    ServerConfig, TriggerConfig, TriggerEvent, WaitPolicy,
};

const LONG_ABOUT: &str = "\
Trigger a Jenkins job.

Use '--job'/'-j' to name the job to run. Jobs inside folders need
'--folder'/'-f' (repeatable, or slash-separated: team/sub).

Pass job parameters with '--params'/'-p' in key=value format, repeated or
comma-separated (foo=bar,baz=qux), and/or as a JSON object with
'--params-json'/'-P'. key=value entries override JSON entries.

  $ jenkins-trigger -j myjob
  $ jenkins-trigger -j myjob -p foo=bar -p baz=qux
  $ jenkins-trigger -j myjob -P '{\"foo\":\"bar\",\"baz\":\"qux\"}'
  $ jenkins-trigger -j deploy -f team/sub -p env=prod

'--jenkins-url', '--jenkins-user' and '--jenkins-pat' select the server and
credentials (also read from JENKINS_URL, JENKINS_USER and JENKINS_PAT).

'--wait' blocks until the build finishes. '--poll-time' sets the delay
between polls (10s, 1m30s, 500ms) and '--max-attempts' caps the number of
polls.

  $ jenkins-trigger -j myjob --wait --poll-time 10s --max-attempts 60";

#[derive(Parser, Debug)]
#[command(name = "jenkins-trigger")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Trigger a Jenkins job and optionally wait for the result", long_about = LONG_ABOUT)]
struct Cli {
    /// URL of the Jenkins server
    #[arg(long, env = "JENKINS_URL", default_value = DEFAULT_SERVER_URL)]
    jenkins_url: String,

    /// User for accessing Jenkins
    #[arg(long, env = "JENKINS_USER")]
    jenkins_user: Option<String>,

    /// Personal access token (PAT) for accessing Jenkins
    #[arg(long, env = "JENKINS_PAT", hide_env_values = true)]
    jenkins_pat: Option<String>,

    /// Allow insecure Jenkins server connections when using SSL
    #[arg(short = 'k', long)]
    insecure: bool,

    /// The name of the Jenkins job to run
    #[arg(short, long)]
    job: String,

    /// Folder(s) containing the job, e.g. team/sub
    #[arg(short = 'f', long = "folder", value_delimiter = ',')]
    folders: Vec<String>,

    /// Job parameters in key=value format, e.g. foo=bar,baz=qux
    #[arg(short = 'p', long = "params", value_delimiter = ',')]
    params: Vec<String>,

    /// Job parameters as a JSON object, e.g. {"foo":"bar"}
    #[arg(short = 'P', long)]
    params_json: Option<String>,

    /// Wait for the job to complete and return its result
    #[arg(long)]
    wait: bool,

    /// How often to poll the Jenkins server for results
    #[arg(long, default_value = "10s", value_parser = parse_poll_time)]
    poll_time: Duration,

    /// Max count of polling for results
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Resolve flags into the runtime configuration.
    fn into_config(self) -> Result<TriggerConfig> {
        let params = resolve_parameters(&self.params, self.params_json.as_deref())
            .context("Failed to resolve job parameters")?;
        // polling settings only matter when waiting
        let wait = if self.wait {
            WaitPolicy::new(true, self.poll_time, self.max_attempts)
                .context("Invalid wait settings")?
        } else {
            WaitPolicy::disabled()
        };

        Ok(TriggerConfig {
            server: ServerConfig {
                url: self.jenkins_url,
                user: self.jenkins_user,
                token: self.jenkins_pat,
                insecure: self.insecure,
            },
            job: JobConfig {
                name: self.job,
                folders: self.folders,
                params,
            },
            wait,
        })
    }
}

fn parse_poll_time(raw: &str) -> std::result::Result<Duration, String> {
    parse_duration(raw).map_err(|e| e.to_string())
}

/// Prints progress events as plain lines on stdout.
struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn emit(&self, event: &TriggerEvent) {
        println!("{}", event);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    trigger_core::init_tracing(cli.json, level);

    let config = cli.into_config()?;
    cmd_trigger(&config).await
}

async fn cmd_trigger(config: &TriggerConfig) -> Result<()> {
    let request = BuildRequest::from_job_config(&config.job)?;

    let client = JenkinsClient::new(&config.server).context("Failed to create Jenkins client")?;
    let info = client
        .ping()
        .await
        .with_context(|| format!("Failed to connect to Jenkins at {}", config.server.url))?;
    debug!(version = ?info.version, "Jenkins reachable");

    let report = run_trigger(&client, &StdoutProgress, &request, &config.wait).await?;

    match report.build_number {
        Some(number) => println!(
            "Job {} finished: build number {} succeeded after {} poll(s)",
            report.job, number, report.attempts
        ),
        None => println!("Job {} queued as item {}", report.job, report.queue_id),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["jenkins-trigger"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("parse failed")
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_job_is_required() {
        assert!(Cli::try_parse_from(["jenkins-trigger"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["-j", "myjob"]);
        assert!(!cli.wait);
        assert_eq!(cli.poll_time, Duration::from_secs(10));
        assert_eq!(cli.max_attempts, 60);
        assert!(cli.folders.is_empty());

        let config = cli.into_config().unwrap();
        assert_eq!(config.job.name, "myjob");
        assert!(!config.wait.enabled);
    }

    #[test]
    fn test_params_split_on_commas_and_repeat() {
        let cli = parse(&["-j", "myjob", "-p", "foo=bar,baz=qux", "-p", "x=1"]);
        assert_eq!(cli.params, vec!["foo=bar", "baz=qux", "x=1"]);
    }

    #[test]
    fn test_params_override_json() {
        let cli = parse(&[
            "-j",
            "myjob",
            "-P",
            r#"{"foo":"json","only":"json"}"#,
            "-p",
            "foo=flag",
        ]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.job.params["foo"], "flag");
        assert_eq!(config.job.params["only"], "json");
    }

    #[test]
    fn test_bad_json_fails() {
        let cli = parse(&["-j", "myjob", "-P", "{oops"]);
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn test_wait_flags() {
        let cli = parse(&[
            "-j",
            "myjob",
            "--wait",
            "--poll-time",
            "1m30s",
            "--max-attempts",
            "5",
        ]);
        let config = cli.into_config().unwrap();
        assert!(config.wait.enabled);
        assert_eq!(config.wait.poll_interval, Duration::from_secs(90));
        assert_eq!(config.wait.max_attempts, 5);
    }

    #[test]
    fn test_invalid_poll_time_rejected() {
        assert!(Cli::try_parse_from(["jenkins-trigger", "-j", "x", "--poll-time", "10"]).is_err());
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let cli = parse(&["-j", "x", "--wait", "--max-attempts", "0"]);
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn test_polling_settings_ignored_without_wait() {
        let cli = parse(&["-j", "x", "--max-attempts", "0"]);
        let config = cli.into_config().unwrap();
        assert!(!config.wait.enabled);
        assert_eq!(config.wait, WaitPolicy::disabled());
    }

    #[test]
    fn test_slash_in_job_name_rejected() {
        let cli = parse(&["-j", "team/deploy", "-f", "org"]);
        let config = cli.into_config().unwrap();
        assert!(BuildRequest::from_job_config(&config.job).is_err());
    }

    #[test]
    fn test_folders_and_insecure() {
        let cli = parse(&["-j", "deploy", "-f", "team/sub", "-k"]);
        let config = cli.into_config().unwrap();
        assert!(config.server.insecure);
        let request = BuildRequest::from_job_config(&config.job).unwrap();
        assert_eq!(request.target().path(), "/job/team/job/sub/job/deploy");
    }
}
