//! CLI argument parsing and secret resolution.
use clap::{Args as ClapArgs, Parser, Subcommand};
use secrecy::SecretString;
use std::{env, path::PathBuf};

use crate::{changelog::ChangelogStyle, healthchecks::Signal};

pub const DEFAULT_SEARCH_BRANCH: &str = "master";
pub const DEFAULT_ENV_NAME: &str = "prod";

/// Global CLI arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(short, long, default_value_t = false, global = true)]
    /// Enable debug logging and print the release notes.
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build release notes for a deploy, label its pull requests and
    /// tickets, and post the notes to Slack.
    Notes(NotesArgs),

    /// Ping a healthchecks.io check, creating it on first use.
    Healthcheck(HealthcheckArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct NotesArgs {
    /// GitHub personal access token. Falls back to GITHUB_TOKEN env var
    /// when empty.
    pub github_token: String,

    /// Revision deployed before this release.
    pub from_revision: String,

    /// Revision being deployed.
    pub to_revision: String,

    /// GitHub organization owning the repository.
    pub org: String,

    /// GitHub repository name.
    pub repo: String,

    #[arg(short, long)]
    /// Path inside the repository to scan. Defaults to the current
    /// directory.
    pub repo_dir: Option<PathBuf>,

    #[arg(short = 'b', long, default_value = DEFAULT_SEARCH_BRANCH)]
    /// Branch the deployed commits live on.
    pub search_branch: String,

    #[arg(short, long, default_value = "")]
    /// Slack webhook key (`T000/B000/XXXX`). Falls back to
    /// SLACK_WEBHOOK_KEY env var.
    pub slack_webhook_key: String,

    #[arg(short, long, default_value = DEFAULT_ENV_NAME)]
    /// Environment being deployed to.
    pub env_name: String,

    #[arg(short = 'V', long, default_value = "")]
    /// VPC being deployed to. Defaults to the environment name.
    pub vpc_name: String,

    #[arg(short = 'l', long, default_value_t = false)]
    /// Leave pull requests and tickets unlabeled.
    pub dont_label_tickets: bool,

    #[arg(short, long, default_value_t = false)]
    /// Print the release notes instead of labeling or posting anything.
    pub dry_run: bool,

    #[arg(long, default_value_t = false)]
    /// Don't fetch the search branch from origin before scanning.
    pub skip_fetch: bool,

    #[arg(long, default_value = "")]
    /// Jira API token. Falls back to JIRA_TOKEN env var.
    pub jira_token: String,

    #[arg(long, default_value = "")]
    /// Jira username. Falls back to JIRA_USERNAME env var.
    pub jira_username: String,

    #[arg(long, default_value = "")]
    /// Jira base url. Falls back to JIRA_URL env var.
    pub jira_url: String,

    #[arg(long, value_enum)]
    /// Changelog layout, overrides the config file.
    pub changelog_style: Option<ChangelogStyle>,

    #[arg(long)]
    /// Config file. Defaults to rocket-releaser.toml in the repository.
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct HealthcheckArgs {
    #[arg(value_enum)]
    /// Signal to send.
    pub signal: Signal,

    /// Check name, unique within the project.
    pub name: String,

    #[arg(long, default_value = "")]
    /// Healthchecks.io API key. Falls back to HEALTHCHECKS_API_KEY env var.
    pub api_key: String,

    #[arg(long)]
    /// Healthchecks API url, for self-hosted instances.
    pub api_url: Option<String>,

    #[arg(long = "channel")]
    /// Integration to notify when creating the check. Repeatable, defaults
    /// to every integration.
    pub channels: Vec<String>,

    #[arg(long)]
    /// Space separated tags for a created check.
    pub tag: Option<String>,

    #[arg(long)]
    /// Expected seconds between pings for a created check.
    pub timeout: Option<u64>,

    #[arg(long)]
    /// Grace period in seconds for a created check.
    pub grace: Option<u64>,
}

/// Flag value, else the env var, else nothing.
fn resolve(value: &str, env_var: &str) -> Option<String> {
    if !value.is_empty() {
        return Some(value.to_string());
    }

    env::var(env_var).ok().filter(|v| !v.is_empty())
}

impl NotesArgs {
    pub fn github_token(&self) -> Option<SecretString> {
        resolve(&self.github_token, "GITHUB_TOKEN").map(SecretString::from)
    }

    pub fn slack_webhook_key(&self) -> Option<SecretString> {
        resolve(&self.slack_webhook_key, "SLACK_WEBHOOK_KEY")
            .map(SecretString::from)
    }

    pub fn jira_token(&self) -> Option<SecretString> {
        resolve(&self.jira_token, "JIRA_TOKEN").map(SecretString::from)
    }

    pub fn jira_username(&self) -> String {
        resolve(&self.jira_username, "JIRA_USERNAME").unwrap_or_default()
    }

    pub fn jira_url(&self) -> String {
        resolve(&self.jira_url, "JIRA_URL").unwrap_or_default()
    }
}

impl HealthcheckArgs {
    pub fn api_key(&self) -> Option<SecretString> {
        resolve(&self.api_key, "HEALTHCHECKS_API_KEY").map(SecretString::from)
    }
}
