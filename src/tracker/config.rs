//! Configuration for the issue-tracker connection.
use secrecy::SecretString;

/// Jira transition id moving a ticket to "Code Review".
pub const DEFAULT_CODE_REVIEW_TRANSITION: &str = "771";
/// Jira transition id moving a ticket to "Ready to Test".
pub const DEFAULT_READY_TO_TEST_TRANSITION: &str = "841";

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Base URL of the tracker, e.g. `https://company.atlassian.net`.
    pub url: String,
    pub username: String,
    /// API token, used as the basic auth password.
    pub token: SecretString,
    /// When set, side-effecting calls are logged instead of performed.
    pub dry_run: bool,
}

impl TrackerConfig {
    /// Browser link to a ticket.
    pub fn ticket_link(&self, key: &str) -> String {
        format!("{}/browse/{}", self.url.trim_end_matches('/'), key)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            url: "".to_string(),
            username: "".to_string(),
            token: SecretString::from("".to_string()),
            dry_run: false,
        }
    }
}
