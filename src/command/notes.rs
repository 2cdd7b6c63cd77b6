//! Release notes command implementation.
use log::*;
use std::path::PathBuf;

use crate::{
    Result,
    cli::NotesArgs,
    config::Config,
    error::ReleaserError,
    forge::{config::RemoteConfig, github::Github, manager::ForgeManager},
    release::{ReleasePipeline, ReleaseRequest},
    repo::Repository,
    shas::ShaScanner,
    slack::SlackNotifier,
    tracker::{config::TrackerConfig, jira::Jira, manager::TrackerManager},
};

const CENSORED: &str = "CENSORED";

fn censor<T>(value: &Option<T>) -> &'static str {
    if value.is_some() { CENSORED } else { "" }
}

/// Every notes option, secrets censored, as `name: value` lines.
fn option_lines(args: &NotesArgs) -> Vec<String> {
    vec![
        format!("github_token: {}", censor(&args.github_token())),
        format!("from_revision: {}", args.from_revision),
        format!("to_revision: {}", args.to_revision),
        format!("org: {}", args.org),
        format!("repo: {}", args.repo),
        format!("repo_dir: {:?}", args.repo_dir),
        format!("search_branch: {}", args.search_branch),
        format!("slack_webhook_key: {}", censor(&args.slack_webhook_key())),
        format!("env_name: {}", args.env_name),
        format!("vpc_name: {}", args.vpc_name),
        format!("dont_label_tickets: {}", args.dont_label_tickets),
        format!("dry_run: {}", args.dry_run),
        format!("skip_fetch: {}", args.skip_fetch),
        format!("jira_token: {}", censor(&args.jira_token())),
        format!("jira_username: {}", args.jira_username()),
        format!("jira_url: {}", args.jira_url()),
        format!("changelog_style: {:?}", args.changelog_style),
        format!("config: {:?}", args.config),
    ]
}

fn log_options(args: &NotesArgs) {
    info!("notes options:");
    for line in option_lines(args) {
        info!("  {line}");
    }
}

fn tracker_manager(args: &NotesArgs) -> Result<Option<TrackerManager>> {
    let Some(token) = args.jira_token() else {
        warn!("no jira token, tickets won't be labeled");
        return Ok(None);
    };

    let config = TrackerConfig {
        url: args.jira_url(),
        username: args.jira_username(),
        token,
        dry_run: args.dry_run,
    };

    let jira = Jira::new(config)?;

    Ok(Some(TrackerManager::new(Box::new(jira))))
}

/// Build the release notes for the deploy described by `args`, label and
/// announce it. Returns the release notes text.
pub async fn execute(args: &NotesArgs) -> Result<String> {
    log_options(args);

    let token = args.github_token().ok_or_else(|| {
        ReleaserError::invalid_config("must set a github token or GITHUB_TOKEN")
    })?;

    let repo_dir = args.repo_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let repo = Repository::open(&repo_dir, Some(token.clone()))?;
    let workdir = PathBuf::from(repo.workdir_as_str());

    let mut config = Config::load(args.config.as_deref(), &workdir)?;

    if let Some(style) = args.changelog_style {
        config.changelog.style = style;
    }

    debug!("config: {config:#?}");

    let remote = RemoteConfig {
        owner: args.org.clone(),
        repo: args.repo.clone(),
        token,
        dry_run: args.dry_run,
        ..Default::default()
    };

    let forge = ForgeManager::new(Box::new(Github::new(remote)?));
    let tracker = tracker_manager(args)?;
    let notifier = args.slack_webhook_key().map(SlackNotifier::new);
    let scanner = ShaScanner::new(Box::new(repo), !args.skip_fetch);

    let pipeline = ReleasePipeline::new(scanner, forge, tracker, notifier, config);

    let req = ReleaseRequest {
        from_revision: args.from_revision.clone(),
        to_revision: args.to_revision.clone(),
        branch: args.search_branch.clone(),
        env_name: args.env_name.clone(),
        vpc_name: args.vpc_name.clone(),
        label_tickets: !args.dont_label_tickets,
        dry_run: args.dry_run,
    };

    pipeline.run(&req).await
}
