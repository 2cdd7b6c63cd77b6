//! Healthcheck ping command implementation.
use log::*;

use crate::{
    Result,
    cli::HealthcheckArgs,
    error::ReleaserError,
    healthchecks::{CheckParams, HealthchecksClient},
};

impl From<&HealthcheckArgs> for CheckParams {
    fn from(args: &HealthcheckArgs) -> Self {
        Self {
            tags: args.tag.clone(),
            timeout: args.timeout,
            grace: args.grace,
            channels: args.channels.clone(),
            ..Default::default()
        }
    }
}

/// Send `args.signal` to the check named `args.name`.
pub async fn execute(args: &HealthcheckArgs) -> Result<()> {
    let api_key = args.api_key().ok_or_else(|| {
        ReleaserError::invalid_config(
            "must set --api-key or HEALTHCHECKS_API_KEY",
        )
    })?;

    let mut client = match &args.api_url {
        Some(url) => HealthchecksClient::with_api_url(api_key, url)?,
        None => HealthchecksClient::new(api_key)?,
    };

    client
        .signal(args.signal, &args.name, &CheckParams::from(args))
        .await?;

    info!("sent {:?} to {}", args.signal, args.name);

    Ok(())
}
