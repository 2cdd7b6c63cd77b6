//! Deploy release notes: find the pull requests a deploy ships, label them
//! and their Jira tickets with the environment, and announce the changelog
//! on Slack.
pub mod changelog;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod forge;
pub mod healthchecks;
pub mod labeler;
pub mod notes;
pub mod prs;
pub mod release;
pub mod repo;
pub mod shas;
pub mod slack;
pub mod tickets;
pub mod tracker;

pub use error::{ReleaserError, Result};
