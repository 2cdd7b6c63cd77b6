use serde::Serialize;

/// A pull request associated with a deployed commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    /// Empty when the pull request has no description.
    pub body: String,
    pub merged: bool,
    pub labels: Vec<String>,
    /// The commit this pull request was discovered through.
    pub deploy_sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to add a label to a pull request.
pub struct PrLabelRequest {
    pub pr_number: u64,
    pub label: String,
}
