//! Configuration for the GitHub connection.
use secrecy::SecretString;

/// Default GitHub REST/GraphQL API base URI.
pub const DEFAULT_API_BASE_URI: &str = "https://api.github.com";
/// Default base URL for links to pull requests and compare views.
pub const DEFAULT_LINK_BASE_URL: &str = "https://github.com";
/// Number of associated pull requests requested per commit. Almost always
/// a commit belongs to exactly one.
pub const ASSOCIATED_PR_LIMIT: u8 = 5;
/// Number of labels requested per pull request.
pub const PR_LABEL_LIMIT: u8 = 20;

/// Remote repository connection configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Repository owner (organization or user).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Access token for authentication.
    pub token: SecretString,
    /// API base URI, overridable for GitHub Enterprise.
    pub api_base_uri: String,
    /// Base URL used to build human facing links.
    pub link_base_url: String,
    /// When set, side-effecting calls are logged instead of performed.
    pub dry_run: bool,
}

impl RemoteConfig {
    /// Link to a pull request in this repository.
    pub fn pull_request_link(&self, number: u64) -> String {
        format!(
            "{}/{}/{}/pull/{}",
            self.link_base_url, self.owner, self.repo, number
        )
    }

    /// Link to the compare view between two revisions.
    pub fn compare_link(&self, from: &str, to: &str) -> String {
        format!(
            "{}/{}/{}/compare/{}...{}",
            self.link_base_url, self.owner, self.repo, from, to
        )
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            owner: "".to_string(),
            repo: "".to_string(),
            token: SecretString::from("".to_string()),
            api_base_uri: DEFAULT_API_BASE_URI.to_string(),
            link_base_url: DEFAULT_LINK_BASE_URL.to_string(),
            dry_run: false,
        }
    }
}
