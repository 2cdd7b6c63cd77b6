//! Commit range scanning: which commits does a deploy ship?
use log::*;
use std::collections::HashSet;

use crate::{Result, error::ReleaserError};

const COMMIT_PREFIX: &str = "commit ";
const CHERRY_PICK_PREFIX: &str = "(cherry picked from commit ";

/// Source of raw commit messages for a revision range.
#[cfg_attr(test, mockall::automock)]
pub trait CommitLog: Send {
    /// Where the log comes from, for error messages.
    fn location(&self) -> String;
    fn branch_exists(&self, branch: &str) -> bool;
    fn fetch_branch(&self, branch: &str) -> Result<()>;
    /// Commits reachable from either revision but not both, each as a
    /// `commit <sha>` line followed by the raw message.
    fn raw_log(&self, from: &str, to: &str) -> Result<String>;
}

pub struct ShaScanner {
    log: Box<dyn CommitLog>,
    fetch_before: bool,
}

impl ShaScanner {
    /// `fetch_before` fetches the branch from origin before scanning so a
    /// stale local checkout still sees the deployed commits.
    pub fn new(log: Box<dyn CommitLog>, fetch_before: bool) -> Self {
        Self { log, fetch_before }
    }

    /// Commit shas deployed when moving `branch` from `from` to `to`,
    /// cherry-pick sources included, deduplicated in scan order.
    ///
    /// The branch must exist locally; fetching only updates it. A missing
    /// branch is a configuration error. A range the log can't
    /// read, e.g. an unknown revision, yields no shas.
    pub fn get_shas(
        &self,
        from: &str,
        to: &str,
        branch: &str,
    ) -> Result<Vec<String>> {
        if !self.log.branch_exists(branch) {
            return Err(ReleaserError::BranchNotFound {
                branch: branch.to_string(),
                repo_dir: self.log.location(),
            });
        }

        if self.fetch_before
            && let Err(err) = self.log.fetch_branch(branch)
        {
            warn!("failed to fetch {branch}: {err}");
        }

        let raw = match self.log.raw_log(from, to) {
            Ok(raw) => raw,
            Err(err) => {
                error!("failed to read commit log for {from}...{to}: {err}");
                String::new()
            }
        };

        debug!("commit messages for {from}...{to}:\n{raw}");

        let mut seen = HashSet::new();
        let shas = parse_shas(&raw)
            .into_iter()
            .filter(|sha| seen.insert(sha.clone()))
            .collect::<Vec<String>>();

        debug!("shas for {from}...{to}: {shas:?}");

        Ok(shas)
    }
}

/// Every commit sha in a raw commit log, in line order. A cherry-pick
/// annotation yields the source sha right after the commit carrying it.
pub fn parse_shas(raw: &str) -> Vec<String> {
    let mut shas = vec![];

    for line in raw.split('\n') {
        let line = line.trim_end_matches('\r');

        if let Some(sha) = line.strip_prefix(COMMIT_PREFIX)
            && is_sha(sha)
        {
            shas.push(sha.to_string());
        }

        if let Some(rest) = line.strip_prefix(CHERRY_PICK_PREFIX) {
            shas.push(rest.trim_end_matches(')').to_string());
        }
    }

    shas
}

fn is_sha(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit())
}
