//! Local git repository access for commit range scanning.
//!
//! Wraps `git2::Repository` with the two operations a deploy needs: fetching
//! the deployed branch from `origin` and reading the raw commit messages of a
//! revision range in `git rev-list --format=%B from...to` layout:
//!
//! ```text
//! commit 3f9ba302b9d440caba0fc2ba1f19e3614e46a7f1
//! feature
//!
//! (cherry picked from commit c8e9114beabca79e4497f9ea40499c80cebe902a)
//! ```
use git2::{Cred, CredentialType, RemoteCallbacks, Sort};
use log::*;
use secrecy::{ExposeSecret, SecretString};
use std::{fmt::Write, path::Path};

use crate::{Result, shas::CommitLog};

/// Remote deployed branches are fetched from.
const DEFAULT_REMOTE: &str = "origin";

/// Username sent alongside a token for HTTPS remotes. GitHub ignores it.
const TOKEN_USER: &str = "x-access-token";

pub struct Repository {
    repo: git2::Repository,
    token: Option<SecretString>,
}

/// Credentials for fetching: the ssh agent for ssh remotes, the token for
/// https remotes, else whatever credential helper git is configured with.
fn get_auth_callbacks<'r>(
    config: git2::Config,
    token: Option<SecretString>,
) -> RemoteCallbacks<'r> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username, allowed| {
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username.unwrap_or("git"));
        }

        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
            && let Some(token) = &token
        {
            return Cred::userpass_plaintext(TOKEN_USER, token.expose_secret());
        }

        Cred::credential_helper(&config, url, username)
    });
    callbacks
}

impl Repository {
    /// Open the repository containing `path`, searching parent directories
    /// like git does. `token` authenticates https fetches.
    pub fn open(path: &Path, token: Option<SecretString>) -> Result<Self> {
        let repo = git2::Repository::discover(path)?;
        Ok(Self { repo, token })
    }

    pub fn workdir_as_str(&self) -> &str {
        if let Some(w) = self.repo.workdir()
            && let Some(p) = w.to_str()
        {
            return p;
        }

        "."
    }

    fn commit_log(&self, from: &str, to: &str) -> Result<String> {
        let from = self.repo.revparse_single(from)?.peel_to_commit()?.id();
        let to = self.repo.revparse_single(to)?.peel_to_commit()?.id();
        let bases = self.repo.merge_bases(from, to)?;

        // from...to: reachable from either side but not from any merge base.
        // criss-cross merges have more than one.
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TIME)?;
        walk.push(from)?;
        walk.push(to)?;

        for base in bases.iter() {
            walk.hide(*base)?;
        }

        let mut log = String::new();

        for oid in walk {
            let commit = self.repo.find_commit(oid?)?;
            let message = String::from_utf8_lossy(commit.message_bytes());
            // writing to a String can't fail
            let _ = writeln!(log, "commit {}\n{}", commit.id(), message);
        }

        Ok(log)
    }
}

impl CommitLog for Repository {
    fn location(&self) -> String {
        self.workdir_as_str().to_string()
    }

    fn branch_exists(&self, branch: &str) -> bool {
        self.repo
            .find_reference(&format!("refs/heads/{branch}"))
            .is_ok()
    }

    fn fetch_branch(&self, branch: &str) -> Result<()> {
        info!("fetching {branch} from {DEFAULT_REMOTE}");

        let config = self.repo.config()?.snapshot()?;
        let callbacks = get_auth_callbacks(config, self.token.clone());
        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let mut remote = self.repo.find_remote(DEFAULT_REMOTE)?;
        let ref_spec = format!("refs/heads/{branch}:refs/heads/{branch}");
        remote.fetch(&[ref_spec], Some(&mut fetch_options), None)?;

        Ok(())
    }

    fn raw_log(&self, from: &str, to: &str) -> Result<String> {
        self.commit_log(from, to)
    }
}
