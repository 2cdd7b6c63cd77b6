//! The release notes run: scan the deployed commits, find their pull
//! requests, label them and their tickets, announce the deploy.
use chrono::Local;
use log::*;

use crate::{
    Result,
    changelog::{ChangelogAssembler, Deploy},
    config::Config,
    forge::manager::ForgeManager,
    labeler::{LabelPolicy, TicketLabeler, display_label},
    prs::PullRequests,
    shas::ShaScanner,
    slack::SlackNotifier,
    tracker::manager::TrackerManager,
};

/// What was deployed where.
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    pub from_revision: String,
    pub to_revision: String,
    /// Branch the deployed commits live on.
    pub branch: String,
    pub env_name: String,
    /// Defaults to `env_name` when empty.
    pub vpc_name: String,
    pub label_tickets: bool,
    /// Skip every side effect and only return the announcement.
    pub dry_run: bool,
}

pub struct ReleasePipeline {
    scanner: ShaScanner,
    forge: ForgeManager,
    tracker: Option<TrackerManager>,
    notifier: Option<SlackNotifier>,
    config: Config,
}

impl ReleasePipeline {
    pub fn new(
        scanner: ShaScanner,
        forge: ForgeManager,
        tracker: Option<TrackerManager>,
        notifier: Option<SlackNotifier>,
        config: Config,
    ) -> Self {
        Self {
            scanner,
            forge,
            tracker,
            notifier,
            config,
        }
    }

    fn policy(&self, req: &ReleaseRequest) -> LabelPolicy {
        let vpc_name = if req.vpc_name.is_empty() {
            &req.env_name
        } else {
            &req.vpc_name
        };

        LabelPolicy {
            env_name: req.env_name.clone(),
            label: display_label(&req.env_name, vpc_name),
            environments: self.config.environments.clone(),
            transitions: self.config.jira.transitions.clone(),
        }
    }

    fn assembler(&self, req: &ReleaseRequest) -> ChangelogAssembler {
        let mut assembler = ChangelogAssembler::new(
            self.forge.remote_config().clone(),
            self.config.changelog.clone(),
        )
        .with_qa_notes(self.config.environments.is_pre_production(&req.env_name));

        if let Some(tracker) = &self.tracker {
            assembler = assembler.with_jira_url(&tracker.config().url);
        }

        assembler
    }

    /// Run the release and return the announcement text. Scan and lookup
    /// failures abort the run, labeling failures are logged and skipped.
    pub async fn run(&self, req: &ReleaseRequest) -> Result<String> {
        info!(
            "pulling deploy SHAs from {} branch: {}...{}",
            req.branch, req.from_revision, req.to_revision
        );

        let shas = self.scanner.get_shas(
            &req.from_revision,
            &req.to_revision,
            &req.branch,
        )?;

        info!("pulling PR bodies from GitHub, searching {} SHAs", shas.len());

        let mut lookup = PullRequests::new(&self.forge);

        // a sha can belong to an unmerged PR that rebased it in
        let prs = lookup
            .for_shas(&shas)
            .await?
            .into_iter()
            .filter(|pr| pr.merged)
            .collect::<Vec<_>>();

        info!("found {} merged PRs", prs.len());

        let mut ticket_count = 0;

        if req.label_tickets {
            let labeler = TicketLabeler::new(
                &self.forge,
                self.tracker.as_ref(),
                self.policy(req),
            );
            ticket_count = labeler.label(&prs).await;
            info!("labeled {ticket_count} tickets");
        }

        let deploy = Deploy {
            env_name: req.env_name.clone(),
            from_revision: req.from_revision.clone(),
            to_revision: req.to_revision.clone(),
            timestamp: Local::now().naive_local(),
        };

        let text = self.assembler(req).announcement(&deploy, &prs, ticket_count);

        if req.dry_run {
            return Ok(text);
        }

        match &self.notifier {
            Some(notifier) => {
                info!("pushing changelog to {} slack channel", req.env_name);
                notifier.post(&text).await?;
            }
            None => warn!("no slack webhook key, not pushing to slack"),
        }

        info!("done");

        Ok(text)
    }
}
