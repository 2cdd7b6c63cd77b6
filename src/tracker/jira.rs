//! Implements the TicketTracker trait for Jira
use async_trait::async_trait;
use log::*;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::{
    Result,
    error::ReleaserError,
    tracker::{config::TrackerConfig, traits::TicketTracker, types::Ticket},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct JiraStatus {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct JiraIssueFields {
    pub status: JiraStatus,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    pub key: String,
    pub fields: JiraIssueFields,
}

/// Jira Cloud/Server client using the v2 REST API with basic auth.
pub struct Jira {
    config: TrackerConfig,
    client: Client,
    base_url: String,
}

impl Jira {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ReleaserError::invalid_config(
                "jira url must be set to label tickets",
            ));
        }

        let base_url = Url::parse(&config.url)?
            .as_str()
            .trim_end_matches('/')
            .to_string();
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            config,
            client,
            base_url,
        })
    }

    fn issue_url(&self, key: &str) -> String {
        format!("{}/rest/api/2/issue/{}", self.base_url, key)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(
            &self.config.username,
            Some(self.config.token.expose_secret()),
        )
    }

    /// Map non-success responses to tracker errors carrying Jira's message.
    async fn check(key: &str, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ReleaserError::AuthenticationError(format!(
                    "jira rejected request for {key}: {status}"
                )))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(ReleaserError::RateLimitExceeded),
            _ => Err(ReleaserError::tracker(format!(
                "request for {key} failed with {status}: {body}"
            ))),
        }
    }
}

#[async_trait]
impl TicketTracker for Jira {
    fn config(&self) -> TrackerConfig {
        self.config.clone()
    }

    async fn get_ticket(&self, key: &str) -> Result<Ticket> {
        let request = self
            .authed(self.client.get(self.issue_url(key)))
            .query(&[("fields", "status,labels")]);

        let response = Self::check(key, request.send().await?).await?;
        let issue: JiraIssue = response.json().await?;

        debug!(
            "ticket {} is in status '{}' with labels {:?}",
            issue.key, issue.fields.status.name, issue.fields.labels
        );

        Ok(Ticket {
            key: issue.key,
            status: issue.fields.status.name,
            labels: issue.fields.labels,
        })
    }

    async fn transition_ticket(
        &self,
        key: &str,
        transition_id: &str,
    ) -> Result<()> {
        let url = format!("{}/transitions", self.issue_url(key));
        let body = serde_json::json!({ "transition": { "id": transition_id } });

        let request = self.authed(self.client.post(url)).json(&body);
        Self::check(key, request.send().await?).await?;

        Ok(())
    }

    async fn add_ticket_label(&self, key: &str, label: &str) -> Result<()> {
        let body =
            serde_json::json!({ "update": { "labels": [{ "add": label }] } });

        let request = self
            .authed(self.client.put(self.issue_url(key)))
            .json(&body);
        Self::check(key, request.send().await?).await?;

        Ok(())
    }
}
