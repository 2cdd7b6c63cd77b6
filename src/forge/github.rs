//! Implements the Forge trait for Github
use async_trait::async_trait;
use log::*;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    forge::{
        config::{ASSOCIATED_PR_LIMIT, PR_LABEL_LIMIT, RemoteConfig},
        traits::Forge,
        types::{PrLabelRequest, PullRequest},
    },
};

const ASSOCIATED_PRS_QUERY: &str = r#"
query AssociatedPullRequests($owner: String!, $repo: String!, $sha: String!, $pr_limit: Int!, $label_limit: Int!) {
  repository(owner: $owner, name: $repo) {
    commit: object(expression: $sha) {
      ... on Commit {
        associatedPullRequests(first: $pr_limit) {
          edges {
            node {
              number
              title
              body
              merged
              labels(first: $label_limit) {
                nodes {
                  name
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

#[derive(Debug, Serialize)]
struct AssociatedPrsVariables {
    pub owner: String,
    pub repo: String,
    pub sha: String,
    pub pr_limit: u8,
    pub label_limit: u8,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct LabelNode {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct LabelConnection {
    pub nodes: Vec<LabelNode>,
}

#[derive(Debug, Deserialize)]
struct PullRequestNode {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub merged: bool,
    pub labels: Option<LabelConnection>,
}

#[derive(Debug, Deserialize)]
struct PullRequestEdge {
    pub node: Option<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
struct PullRequestConnection {
    pub edges: Vec<PullRequestEdge>,
}

#[derive(Debug, Deserialize)]
struct AssociatedPrsCommit {
    #[serde(rename = "associatedPullRequests")]
    pub associated_pull_requests: Option<PullRequestConnection>,
}

#[derive(Debug, Deserialize)]
struct AssociatedPrsRepository {
    pub commit: Option<AssociatedPrsCommit>,
}

#[derive(Debug, Deserialize)]
struct AssociatedPrsData {
    pub repository: Option<AssociatedPrsRepository>,
}

#[derive(Debug, Deserialize)]
struct AssociatedPrsResult {
    pub data: Option<AssociatedPrsData>,
    pub errors: Option<Vec<GraphqlError>>,
}

impl PullRequestNode {
    fn into_pull_request(self, sha: &str) -> PullRequest {
        PullRequest {
            number: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            merged: self.merged,
            labels: self
                .labels
                .map(|l| l.nodes.into_iter().map(|n| n.name).collect())
                .unwrap_or_default(),
            deploy_sha: sha.to_string(),
        }
    }
}

/// GitHub forge implementation using Octocrab for the GraphQL pull request
/// lookup and REST labeling.
pub struct Github {
    config: RemoteConfig,
    instance: Octocrab,
}

impl Github {
    /// Create GitHub client with personal access token authentication and API
    /// base URL configuration.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let instance = Octocrab::builder()
            .personal_token(config.token.clone())
            .base_uri(config.api_base_uri.clone())?
            .build()?;

        Ok(Self { config, instance })
    }
}

#[async_trait]
impl Forge for Github {
    fn remote_config(&self) -> RemoteConfig {
        self.config.clone()
    }

    async fn get_associated_prs(&self, sha: &str) -> Result<Vec<PullRequest>> {
        let vars = AssociatedPrsVariables {
            owner: self.config.owner.clone(),
            repo: self.config.repo.clone(),
            sha: sha.to_string(),
            pr_limit: ASSOCIATED_PR_LIMIT,
            label_limit: PR_LABEL_LIMIT,
        };

        let result: AssociatedPrsResult = self
            .instance
            .graphql(&serde_json::json!({
                "query": ASSOCIATED_PRS_QUERY,
                "variables": vars,
            }))
            .await?;

        if let Some(err) = result.errors.as_ref().and_then(|e| e.first()) {
            warn!("error with sha {sha}: {}", err.message);
            return Ok(vec![]);
        }

        // a commit cherry-picked from a local commit that was never pushed
        // has no commit object on the remote
        let Some(connection) = result
            .data
            .and_then(|d| d.repository)
            .and_then(|r| r.commit)
            .and_then(|c| c.associated_pull_requests)
        else {
            warn!("commit {sha} not found or has no associated PRs");
            return Ok(vec![]);
        };

        let prs = connection
            .edges
            .into_iter()
            .filter_map(|edge| edge.node)
            .map(|node| node.into_pull_request(sha))
            .collect::<Vec<PullRequest>>();

        debug!("sha {sha} is associated with {} PRs", prs.len());

        Ok(prs)
    }

    async fn add_pr_label(&self, req: PrLabelRequest) -> Result<()> {
        let route = format!(
            "/repos/{}/{}/issues/{}/labels",
            self.config.owner, self.config.repo, req.pr_number
        );

        let body = serde_json::json!({ "labels": [req.label] });

        let _: serde_json::Value =
            self.instance.post(route, Some(&body)).await?;

        Ok(())
    }
}
