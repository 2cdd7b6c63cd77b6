//! Command execution for rocket-releaser.
//!
//! Each subcommand wires the CLI arguments into the library components and
//! runs them:
//!
//! - **notes**: scan a deploy's commits, label its pull requests and tickets,
//!   post the release notes to Slack
//! - **healthcheck**: signal a healthchecks.io check

/// Release notes for a deploy.
pub mod notes;

/// Healthcheck pings.
pub mod healthcheck;
