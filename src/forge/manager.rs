//! Manager that wraps forge implementations
use log::*;

use crate::{
    Result,
    forge::{
        config::RemoteConfig,
        traits::Forge,
        types::{PrLabelRequest, PullRequest},
    },
};

pub struct ForgeManager {
    forge: Box<dyn Forge>,
    remote_config: RemoteConfig,
}

impl ForgeManager {
    pub fn new(forge: Box<dyn Forge>) -> Self {
        let remote_config = forge.remote_config();
        Self {
            forge,
            remote_config,
        }
    }

    pub fn remote_config(&self) -> &RemoteConfig {
        &self.remote_config
    }

    pub async fn get_associated_prs(
        &self,
        sha: &str,
    ) -> Result<Vec<PullRequest>> {
        self.forge.get_associated_prs(sha).await
    }

    pub async fn add_pr_label(&self, req: PrLabelRequest) -> Result<()> {
        if self.remote_config.dry_run {
            warn!("dry_run: would add PR label: req: {:#?}", req);
            return Ok(());
        }
        self.forge.add_pr_label(req).await
    }
}
