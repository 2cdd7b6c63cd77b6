//! Client for signalling job liveness to healthchecks.io.
//!
//! Checks are addressed by name. A check that does not exist yet is created
//! on first use, so a cron job only needs to know its own name:
//!
//! ```rust,ignore
//! let mut client = HealthchecksClient::new(api_key)?;
//! client.start("nightly-backup", &CheckParams::default()).await?;
//! // ... run the job ...
//! client.done("nightly-backup", &CheckParams::default()).await?;
//! ```
use clap::ValueEnum;
use log::*;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};

use crate::{Result, error::ReleaserError};

/// Management API of the hosted service.
pub const DEFAULT_API_URL: &str = "https://healthchecks.io/api/v1";
/// Pings must never hold up the job they report on.
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(5);
/// Notify every integration of the project.
const ALL_CHANNELS: &str = "*";

/// Lifecycle signal sent to a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Signal {
    /// The job started; healthchecks.io starts timing it.
    Start,
    /// The job finished successfully.
    Done,
    /// The job failed.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Check {
    pub name: String,
    pub ping_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ChecksResponse {
    checks: Vec<Check>,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct CreatedCheck {
    ping_url: String,
}

/// Settings for a check created on first use. Unset fields use the
/// service defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckParams {
    /// Space separated tags.
    pub tags: Option<String>,
    pub desc: Option<String>,
    /// Expected period between pings, in seconds.
    pub timeout: Option<u64>,
    /// Grace period before alerting, in seconds.
    pub grace: Option<u64>,
    /// Cron expression, replaces `timeout`.
    pub schedule: Option<String>,
    pub tz: Option<String>,
    /// Integration names to notify. Empty means all of them.
    pub channels: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreateCheck<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    desc: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grace: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tz: Option<&'a str>,
    channels: String,
}

/// Last path segment of a ping url, the check's uuid:
/// `https://hc-ping.com/2453273d-864d` gives `2453273d-864d`.
pub fn ping_id(ping_url: &str) -> &str {
    ping_url
        .rsplit_once('/')
        .map_or(ping_url, |(_, id)| id)
}

/// Index records by lowercased name in one pass, failing on the first
/// name shared by two records.
fn index_by_name<T>(
    kind: &str,
    records: &[T],
    name: impl Fn(&T) -> &str,
    value: impl Fn(&T) -> &str,
) -> Result<HashMap<String, String>> {
    let mut index: HashMap<String, String> = HashMap::new();

    for record in records.iter() {
        let key = name(record).to_lowercase();

        if let Some(existing) = index.get(&key) {
            return Err(ReleaserError::duplicate_name(
                kind,
                name(record),
                existing.as_str(),
                value(record),
            ));
        }

        index.insert(key, value(record).to_string());
    }

    Ok(index)
}

pub struct HealthchecksClient {
    api: Client,
    ping: Client,
    api_url: String,
    ping_timeout: Duration,
    /// Lowercased check name to ping url.
    cache: HashMap<String, String>,
}

impl HealthchecksClient {
    pub fn new(api_key: SecretString) -> Result<Self> {
        Self::with_api_url(api_key, DEFAULT_API_URL)
    }

    /// Client for a self-hosted instance.
    pub fn with_api_url(api_key: SecretString, api_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(api_key.expose_secret())?;
        key_value.set_sensitive(true);
        headers.append("X-Api-Key", key_value);

        let api = Client::builder().default_headers(headers).build()?;
        // pings go to a different host, keep the api key off them
        let ping = Client::builder().build()?;

        Ok(Self {
            api,
            ping,
            api_url: api_url.trim_end_matches('/').to_string(),
            ping_timeout: DEFAULT_PING_TIMEOUT,
            cache: HashMap::new(),
        })
    }

    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    pub async fn get_checks(&self) -> Result<Vec<Check>> {
        let response = self
            .api
            .get(format!("{}/checks/", self.api_url))
            .send()
            .await?
            .error_for_status()?;
        let result: ChecksResponse = response.json().await?;
        Ok(result.checks)
    }

    pub async fn get_channels(&self) -> Result<Vec<Channel>> {
        let response = self
            .api
            .get(format!("{}/channels/", self.api_url))
            .send()
            .await?
            .error_for_status()?;
        let result: ChannelsResponse = response.json().await?;
        Ok(result.channels)
    }

    /// Resolve integration names to the comma separated ids the api takes.
    async fn channel_ids(&self, names: &[String]) -> Result<String> {
        if names.is_empty() || names.iter().any(|n| n == ALL_CHANNELS) {
            return Ok(ALL_CHANNELS.to_string());
        }

        let channels = self.get_channels().await?;
        let by_name =
            index_by_name("channel", &channels, |c| c.name.as_str(), |c| c.id.as_str())?;

        let ids = names
            .iter()
            .map(|name| {
                by_name.get(&name.to_lowercase()).cloned().ok_or_else(|| {
                    ReleaserError::invalid_config(format!(
                        "no healthchecks channel named '{name}'"
                    ))
                })
            })
            .collect::<Result<Vec<String>>>()?;

        Ok(ids.join(","))
    }

    /// Create a check and return its ping url.
    pub async fn create_check(
        &self,
        name: &str,
        params: &CheckParams,
    ) -> Result<String> {
        let body = CreateCheck {
            name,
            tags: params.tags.as_deref(),
            desc: params.desc.as_deref(),
            timeout: params.timeout,
            grace: params.grace,
            schedule: params.schedule.as_deref(),
            tz: params.tz.as_deref(),
            channels: self.channel_ids(&params.channels).await?,
        };

        let response = self
            .api
            .post(format!("{}/checks/", self.api_url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let created: CreatedCheck = response.json().await?;

        info!("created check {name}: {}", ping_id(&created.ping_url));

        Ok(created.ping_url)
    }

    /// Ping url of the check named `name` (case-insensitive), creating the
    /// check with `params` when it does not exist.
    pub async fn endpoint(
        &mut self,
        name: &str,
        params: &CheckParams,
    ) -> Result<String> {
        let key = name.to_lowercase();

        if let Some(url) = self.cache.get(&key) {
            return Ok(url.clone());
        }

        let checks = self.get_checks().await?;
        let by_name =
            index_by_name("check", &checks, |c| c.name.as_str(), |c| c.ping_url.as_str())?;

        let url = match by_name.get(&key) {
            Some(url) => {
                debug!("check {name} already exists");
                url.clone()
            }
            None => self.create_check(name, params).await?,
        };

        self.cache.extend(by_name);
        self.cache.insert(key, url.clone());

        Ok(url)
    }

    pub async fn signal(
        &mut self,
        signal: Signal,
        name: &str,
        params: &CheckParams,
    ) -> Result<()> {
        let endpoint = self.endpoint(name, params).await?;

        let url = match signal {
            Signal::Start => format!("{endpoint}/start"),
            Signal::Done => endpoint,
            Signal::Fail => format!("{endpoint}/fail"),
        };

        debug!("pinging {url}");

        self.ping
            .get(url)
            .timeout(self.ping_timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Start timing the job behind `name`.
    pub async fn start(&mut self, name: &str, params: &CheckParams) -> Result<()> {
        self.signal(Signal::Start, name, params).await
    }

    /// Report the job behind `name` as finished.
    pub async fn done(&mut self, name: &str, params: &CheckParams) -> Result<()> {
        self.signal(Signal::Done, name, params).await
    }

    /// Report the job behind `name` as failed.
    pub async fn fail(&mut self, name: &str, params: &CheckParams) -> Result<()> {
        self.signal(Signal::Fail, name, params).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    use super::*;

    fn client_for(server: &MockServer) -> HealthchecksClient {
        HealthchecksClient::with_api_url(
            SecretString::from("hc-key".to_string()),
            &format!("{}/api/v1", server.uri()),
        )
        .unwrap()
    }

    async fn mount_checks(server: &MockServer, checks: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/v1/checks/"))
            .and(header("X-Api-Key", "hc-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "checks": checks })),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn ping_id_is_last_segment() {
        assert_eq!(
            ping_id("https://hc-ping.com/2453273d-864d-4671-9ef9-a024b1a6fa83"),
            "2453273d-864d-4671-9ef9-a024b1a6fa83"
        );
        assert_eq!(ping_id("no-slashes"), "no-slashes");
    }

    #[test]
    fn duplicate_names_name_both_records() {
        let checks = vec![
            Check {
                name: "Backup".into(),
                ping_url: "https://hc-ping.com/1".into(),
            },
            Check {
                name: "backup".into(),
                ping_url: "https://hc-ping.com/2".into(),
            },
        ];

        let result =
            index_by_name("check", &checks, |c| c.name.as_str(), |c| c.ping_url.as_str());

        let Err(ReleaserError::DuplicateName { first, second, .. }) = result
        else {
            panic!("expected duplicate name error");
        };
        assert_eq!(first, "https://hc-ping.com/1");
        assert_eq!(second, "https://hc-ping.com/2");
    }

    #[tokio::test]
    async fn finds_existing_check_ignoring_case() {
        let server = MockServer::start().await;
        mount_checks(
            &server,
            serde_json::json!([
                { "name": "SpongeBob", "ping_url": "https://hc-ping.com/55555555" }
            ]),
        )
        .await;

        let mut client = client_for(&server);
        let url = client
            .endpoint("spongebob", &CheckParams::default())
            .await
            .unwrap();

        assert_eq!(url, "https://hc-ping.com/55555555");
    }

    #[tokio::test]
    async fn caches_endpoints() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/checks/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({ "checks": [
                    { "name": "a", "ping_url": "https://hc-ping.com/a" },
                    { "name": "b", "ping_url": "https://hc-ping.com/b" }
                ] }),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let params = CheckParams::default();

        assert_eq!(
            client.endpoint("a", &params).await.unwrap(),
            "https://hc-ping.com/a"
        );
        // every listed check is cached, not just the one asked for
        assert_eq!(
            client.endpoint("B", &params).await.unwrap(),
            "https://hc-ping.com/b"
        );
    }

    #[tokio::test]
    async fn creates_missing_check() {
        let server = MockServer::start().await;
        mount_checks(&server, serde_json::json!([])).await;

        Mock::given(method("POST"))
            .and(path("/api/v1/checks/"))
            .and(body_partial_json(serde_json::json!({
                "name": "squidward",
                "timeout": 142,
                "channels": "*"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(
                serde_json::json!({ "ping_url": "https://hc-ping.com/44444444" }),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let params = CheckParams {
            timeout: Some(142),
            ..Default::default()
        };

        let url = client.endpoint("squidward", &params).await.unwrap();
        assert_eq!(url, "https://hc-ping.com/44444444");

        // second lookup is served from the cache
        let again = client.endpoint("Squidward", &params).await.unwrap();
        assert_eq!(again, url);
    }

    #[tokio::test]
    async fn resolves_channel_names_to_ids() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/channels/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({ "channels": [
                    { "name": "Slack", "id": "112536" },
                    { "name": "email", "id": "778899" }
                ] }),
            ))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/v1/checks/"))
            .and(body_partial_json(serde_json::json!({
                "name": "fah",
                "channels": "112536,778899"
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({ "ping_url": "foo" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let params = CheckParams {
            channels: vec!["slack".into(), "EMAIL".into()],
            ..Default::default()
        };

        assert_eq!(client.create_check("fah", &params).await.unwrap(), "foo");
    }

    #[tokio::test]
    async fn unknown_channel_is_a_config_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/channels/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "channels": [] })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let params = CheckParams {
            channels: vec!["pager".into()],
            ..Default::default()
        };

        let result = client.create_check("fah", &params).await;
        assert!(matches!(result, Err(ReleaserError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn rejected_api_key_is_an_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/checks/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let result = client.endpoint("barnacle", &CheckParams::default()).await;

        assert!(matches!(result, Err(ReleaserError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn signals_ping_the_check() {
        let server = MockServer::start().await;
        let ping_url = format!("{}/ping/abc", server.uri());
        mount_checks(
            &server,
            serde_json::json!([{ "name": "job", "ping_url": ping_url }]),
        )
        .await;

        for (route, times) in
            [("/ping/abc/start", 1), ("/ping/abc", 1), ("/ping/abc/fail", 1)]
        {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
                .expect(times)
                .mount(&server)
                .await;
        }

        let mut client = client_for(&server);
        let params = CheckParams::default();

        client.start("job", &params).await.unwrap();
        client.done("job", &params).await.unwrap();
        client.fail("job", &params).await.unwrap();
    }
}
