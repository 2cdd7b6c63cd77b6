//! Traits related to remote git forges
use async_trait::async_trait;

use crate::{
    Result,
    forge::{
        config::RemoteConfig,
        types::{PrLabelRequest, PullRequest},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    fn remote_config(&self) -> RemoteConfig;
    /// Pull requests associated with a commit. A commit the forge does not
    /// know yields an empty list.
    async fn get_associated_prs(&self, sha: &str) -> Result<Vec<PullRequest>>;
    async fn add_pr_label(&self, req: PrLabelRequest) -> Result<()>;
}
