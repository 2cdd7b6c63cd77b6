//! Pull request lookup for deployed commits.
use log::*;
use std::collections::HashSet;

use crate::{
    Result,
    forge::{manager::ForgeManager, types::PullRequest},
};

/// Resolves commits to the pull requests they came from, one forge request
/// per distinct commit. The first result is memoized until
/// [`PullRequests::clear_cache`] is called.
pub struct PullRequests<'f> {
    forge: &'f ForgeManager,
    cache: Option<Vec<PullRequest>>,
}

impl<'f> PullRequests<'f> {
    pub fn new(forge: &'f ForgeManager) -> Self {
        Self { forge, cache: None }
    }

    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Pull requests associated with `deploy_shas`, deduplicated by number
    /// and keeping the first commit each was found through.
    pub async fn for_shas(
        &mut self,
        deploy_shas: &[String],
    ) -> Result<Vec<PullRequest>> {
        if let Some(cached) = &self.cache {
            debug!("using {} cached pull requests", cached.len());
            return Ok(cached.clone());
        }

        let mut seen_shas = HashSet::new();
        let mut seen_numbers = HashSet::new();
        let mut prs = vec![];

        for sha in deploy_shas.iter() {
            if !seen_shas.insert(sha.as_str()) {
                continue;
            }

            for pr in self.forge.get_associated_prs(sha).await? {
                // two commits may reference the same PR
                if seen_numbers.insert(pr.number) {
                    debug!("found PR #{} through sha {}", pr.number, sha);
                    prs.push(pr);
                }
            }
        }

        self.cache = Some(prs.clone());

        Ok(prs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ReleaserError,
        forge::{config::RemoteConfig, traits::MockForge},
    };

    fn pr(number: u64, sha: &str) -> PullRequest {
        PullRequest {
            number,
            title: format!("PR {number}"),
            body: "test".into(),
            merged: true,
            deploy_sha: sha.into(),
            ..Default::default()
        }
    }

    fn shas(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn dedupes_prs_keeping_first_sha() {
        let mut mock_forge = MockForge::new();
        mock_forge
            .expect_remote_config()
            .returning(RemoteConfig::default);
        mock_forge
            .expect_get_associated_prs()
            .returning(|sha| match sha {
                "aaa" => Ok(vec![pr(12, sha)]),
                "bbb" => Ok(vec![pr(12, sha), pr(13, sha)]),
                _ => Ok(vec![]),
            });

        let manager = ForgeManager::new(Box::new(mock_forge));
        let mut lookup = PullRequests::new(&manager);

        let prs = lookup.for_shas(&shas(&["aaa", "bbb", "ccc"])).await.unwrap();

        assert_eq!(prs, vec![pr(12, "aaa"), pr(13, "bbb")]);
    }

    #[tokio::test]
    async fn queries_each_sha_once() {
        let mut mock_forge = MockForge::new();
        mock_forge
            .expect_remote_config()
            .returning(RemoteConfig::default);
        mock_forge
            .expect_get_associated_prs()
            .times(2)
            .returning(|sha| Ok(vec![pr(sha.len() as u64, sha)]));

        let manager = ForgeManager::new(Box::new(mock_forge));
        let mut lookup = PullRequests::new(&manager);

        let prs = lookup
            .for_shas(&shas(&["a", "bb", "a", "bb"]))
            .await
            .unwrap();

        assert_eq!(prs.len(), 2);
    }

    #[tokio::test]
    async fn memoizes_until_cleared() {
        let mut mock_forge = MockForge::new();
        mock_forge
            .expect_remote_config()
            .returning(RemoteConfig::default);
        mock_forge
            .expect_get_associated_prs()
            .times(2)
            .returning(|sha| Ok(vec![pr(1, sha)]));

        let manager = ForgeManager::new(Box::new(mock_forge));
        let mut lookup = PullRequests::new(&manager);

        let first = lookup.for_shas(&shas(&["aaa"])).await.unwrap();
        let cached = lookup.for_shas(&shas(&["bbb"])).await.unwrap();
        assert_eq!(first, cached);

        lookup.clear_cache();
        let fresh = lookup.for_shas(&shas(&["bbb"])).await.unwrap();
        assert_eq!(fresh[0].deploy_sha, "bbb");
    }

    #[tokio::test]
    async fn forge_failures_propagate() {
        let mut mock_forge = MockForge::new();
        mock_forge
            .expect_remote_config()
            .returning(RemoteConfig::default);
        mock_forge
            .expect_get_associated_prs()
            .returning(|_| Err(ReleaserError::AuthenticationError("bad credentials".into())));

        let manager = ForgeManager::new(Box::new(mock_forge));
        let mut lookup = PullRequests::new(&manager);

        let result = lookup.for_shas(&shas(&["aaa"])).await;

        assert!(matches!(
            result,
            Err(ReleaserError::AuthenticationError(_))
        ));
    }
}
