//! Posts deploy announcements to a Slack incoming webhook.
use log::*;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::Result;

/// Incoming webhook endpoint; the webhook key is appended.
pub const DEFAULT_WEBHOOK_BASE_URL: &str = "https://hooks.slack.com/services";

const DISPLAY_NAME: &str = "Deployment Team";
const ICON_EMOJI: &str = ":rocket:";

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
    username: &'a str,
    icon_emoji: &'a str,
}

pub struct SlackNotifier {
    client: Client,
    base_url: String,
    /// `T000/B000/XXXX` part of the webhook url.
    webhook_key: SecretString,
}

impl SlackNotifier {
    pub fn new(webhook_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_WEBHOOK_BASE_URL.to_string(),
            webhook_key,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn post(&self, text: &str) -> Result<()> {
        let url = format!(
            "{}/{}",
            self.base_url,
            self.webhook_key.expose_secret().trim_matches('/')
        );

        let message = WebhookMessage {
            text,
            username: DISPLAY_NAME,
            icon_emoji: ICON_EMOJI,
        };

        debug!("posting {} characters to slack", text.len());

        self.client
            .post(url)
            .json(&message)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
