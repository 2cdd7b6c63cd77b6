//! GitHub collaborator: pull request lookup by commit and pull request
//! labeling.

/// Connection and authentication settings for GitHub.
pub mod config;

/// GitHub API client implementation.
pub mod github;

/// Dry-run aware wrapper around a [`traits::Forge`].
pub mod manager;

/// Common trait for forge implementations.
pub mod traits;

/// Pull request data returned from the forge.
pub mod types;
