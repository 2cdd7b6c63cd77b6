//! Labels deployed pull requests and the tickets they reference with the
//! environment they were deployed to, moving tickets along the workflow
//! where the deploy warrants it.
use log::*;
use std::collections::HashSet;

use crate::{
    Result,
    config::{EnvironmentNames, TransitionIds},
    error::ReleaserError,
    forge::{
        manager::ForgeManager,
        types::{PrLabelRequest, PullRequest},
    },
    tickets::{self, TicketReference},
    tracker::{manager::TrackerManager, types::Ticket},
};

/// Statuses from which a preview deploy moves a ticket to code review.
const CODE_REVIEW_FROM: [&str; 3] = ["Reopened", "Open", "In Progress"];
/// Statuses from which a staging deploy moves a ticket to ready to test.
const READY_TO_TEST_FROM: [&str; 4] =
    ["Reopened", "Open", "In Progress", "In Review"];

/// Label for a deploy: `vpc(env)` when deploying to a differently named
/// VPC, otherwise just the env name.
pub fn display_label(env_name: &str, vpc_name: &str) -> String {
    if vpc_name != env_name {
        format!("{vpc_name}({env_name})")
    } else {
        env_name.to_string()
    }
}

/// Which label to apply and which transitions a deploy may trigger.
#[derive(Debug, Clone)]
pub struct LabelPolicy {
    pub env_name: String,
    pub label: String,
    pub environments: EnvironmentNames,
    pub transitions: TransitionIds,
}

impl LabelPolicy {
    pub fn new(env_name: &str, vpc_name: &str) -> Self {
        Self {
            env_name: env_name.to_string(),
            label: display_label(env_name, vpc_name),
            environments: EnvironmentNames::default(),
            transitions: TransitionIds::default(),
        }
    }

    /// Transition to request for a ticket currently in `status`. Production
    /// deploys never transition: tickets may still need testing there.
    pub fn transition_for(&self, status: &str) -> Option<&str> {
        if self.env_name == self.environments.preview {
            CODE_REVIEW_FROM
                .contains(&status)
                .then_some(self.transitions.code_review.as_str())
        } else if self.env_name == self.environments.staging {
            READY_TO_TEST_FROM
                .contains(&status)
                .then_some(self.transitions.ready_to_test.as_str())
        } else {
            None
        }
    }
}

/// Ticket references of a pull request: every one in the title, plus those
/// in the body that carry a transition keyword. Other body mentions are
/// usually "similar to ENG-1" asides. Deduplicated by issue: a later
/// reference replaces an earlier one in place.
pub fn merge_references(title: &str, body: &str) -> Vec<TicketReference> {
    let body_refs = tickets::extract(body)
        .into_iter()
        .filter(TicketReference::has_transition);

    let mut merged: Vec<TicketReference> = vec![];

    for reference in tickets::extract(title).into_iter().chain(body_refs) {
        match merged.iter_mut().find(|r| r.issue == reference.issue) {
            Some(existing) => *existing = reference,
            None => merged.push(reference),
        }
    }

    merged
}

pub struct TicketLabeler<'a> {
    forge: &'a ForgeManager,
    tracker: Option<&'a TrackerManager>,
    policy: LabelPolicy,
}

impl<'a> TicketLabeler<'a> {
    /// Without a tracker only pull requests are labeled.
    pub fn new(
        forge: &'a ForgeManager,
        tracker: Option<&'a TrackerManager>,
        policy: LabelPolicy,
    ) -> Self {
        Self {
            forge,
            tracker,
            policy,
        }
    }

    /// Label every pull request and the tickets it references. Returns the
    /// number of distinct ticket ids found across all pull requests.
    /// Failures are logged per record and never abort the batch.
    pub async fn label(&self, prs: &[PullRequest]) -> usize {
        let mut ticket_ids: HashSet<String> = HashSet::new();
        let label = &self.policy.label;

        for pr in prs.iter() {
            info!(
                "labeling pr #{} {} at {} with {}",
                pr.number,
                pr.title,
                self.forge.remote_config().pull_request_link(pr.number),
                label
            );

            let req = PrLabelRequest {
                pr_number: pr.number,
                label: label.clone(),
            };

            if let Err(err) = self.forge.add_pr_label(req).await {
                error!("error labeling pr #{}: {err}", pr.number);
            }

            let Some(tracker) = self.tracker else {
                continue;
            };

            let references = merge_references(&pr.title, &pr.body);

            if references.is_empty() {
                warn!("couldn't find jira # in pr #{} {}", pr.number, pr.title);
                continue;
            }

            for reference in references.iter() {
                ticket_ids.insert(reference.issue.clone());

                info!(
                    "labeling jira ticket at {} with {}",
                    tracker.config().ticket_link(&reference.issue),
                    label
                );

                if let Err(err) = self.update_ticket(tracker, reference).await {
                    error!("error with {}: {err}", pr.title);
                }
            }
        }

        ticket_ids.len()
    }

    async fn update_ticket(
        &self,
        tracker: &TrackerManager,
        reference: &TicketReference,
    ) -> Result<()> {
        let ticket = tracker.get_ticket(&reference.issue).await?;

        // a ticket may span several PRs, only a closing keyword moves it
        if reference.has_transition() {
            self.transition(tracker, &ticket).await?;
        }

        // must be last: closed tickets can't be labeled
        self.label_ticket(tracker, &ticket).await
    }

    async fn transition(
        &self,
        tracker: &TrackerManager,
        ticket: &Ticket,
    ) -> Result<()> {
        let env_name = &self.policy.env_name;

        if *env_name == self.policy.environments.production {
            debug!("{env_name} deploys do not transition {}", ticket.key);
            return Ok(());
        }

        match self.policy.transition_for(&ticket.status) {
            Some(transition_id) => {
                info!(
                    "{env_name} deploy: transitioning {} from '{}'",
                    ticket.key, ticket.status
                );
                tracker.transition_ticket(&ticket.key, transition_id).await
            }
            None => {
                debug!(
                    "no transition for {} in '{}' on {env_name}",
                    ticket.key, ticket.status
                );
                Ok(())
            }
        }
    }

    async fn label_ticket(
        &self,
        tracker: &TrackerManager,
        ticket: &Ticket,
    ) -> Result<()> {
        let label = &self.policy.label;

        if label.contains(' ') {
            return Err(ReleaserError::InvalidLabel(label.clone()));
        }

        if ticket.labels.contains(label) {
            debug!("{} already labeled {label}", ticket.key);
            return Ok(());
        }

        tracker.add_ticket_label(&ticket.key, label).await
    }
}
