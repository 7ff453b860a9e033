//! Polling client for the update endpoint.
//!
//! Meant to run from cron or a DHCP client hook on the network whose public
//! address changes. It only calls the endpoint when the address changed, when
//! the last successful update is older than a configured interval, or when
//! forced.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::response::Response;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Calls the update endpoint for one hostname.
pub struct Updater {
    client: reqwest::Client,
    url: String,
    hostname: String,
    token: String,
}

impl Updater {
    pub fn new(url: impl Into<String>, hostname: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
            hostname: hostname.into(),
            token: token.into(),
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Ask the endpoint to point the hostname at our current public address.
    pub async fn update(&self) -> Result<Response> {
        let response: Response = self
            .client
            .get(&self.url)
            .query(&[("hostname", self.hostname.as_str()), ("token", self.token.as_str())])
            .send()
            .await
            .context("Failed to send update request")?
            .error_for_status()
            .context("Update endpoint returned an error status")?
            .json()
            .await
            .context("Failed to parse update response")?;

        Ok(response)
    }
}

/// `token` wins over `token_file`; file contents are trimmed.
pub fn resolve_token(token: Option<String>, token_file: Option<&Path>) -> Result<String> {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        return Ok(token);
    }

    match token_file {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read token file: {}", path.display()))?;
            Ok(content.trim().to_string())
        }
        None => bail!("missing token"),
    }
}

/// When to call the endpoint.
#[derive(Debug, Clone, Default)]
pub struct UpdatePolicy {
    pub force: bool,
    pub max_interval: Duration,
    pub old_address: Option<String>,
    pub new_address: Option<String>,
}

impl UpdatePolicy {
    pub fn address_changed(&self) -> bool {
        let changed = self.old_address != self.new_address;
        debug!("ip address {} changed", if changed { "has" } else { "has not" });
        changed
    }

    pub fn too_long_since(&self, last_update: OffsetDateTime, now: OffsetDateTime) -> bool {
        let elapsed = now - last_update;
        let too_long = elapsed >= self.max_interval;
        debug!("{}too long since last update", if too_long { "" } else { "not " });
        too_long
    }

    /// The last-update file is only read when the address is unchanged.
    pub fn should_update(&self, last_update_file: &Path, now: OffsetDateTime) -> bool {
        self.address_changed()
            || self.too_long_since(read_last_update(last_update_file), now)
            || self.force
    }
}

/// Time of the last successful update, or the epoch when unknown.
pub fn read_last_update(path: &Path) -> OffsetDateTime {
    let last_update = match fs::read_to_string(path) {
        Ok(content) => match parse_timestamp(content.trim()) {
            Some(at) => at,
            None => {
                warn!("invalid last update data in {}: {:?}", path.display(), content.trim());
                OffsetDateTime::UNIX_EPOCH
            }
        },
        Err(e) => {
            warn!("failed to read last update: {}", e);
            OffsetDateTime::UNIX_EPOCH
        }
    };

    debug!("last update was at {}", format_time(last_update));
    last_update
}

pub fn write_last_update(path: &Path, at: OffsetDateTime) -> Result<()> {
    fs::write(path, at.unix_timestamp().to_string())
        .with_context(|| format!("Failed to write last update file: {}", path.display()))
}

// Older clients wrote fractional seconds.
fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(secs) = raw.parse::<i64>() {
        return OffsetDateTime::from_unix_timestamp(secs).ok();
    }
    let secs: f64 = raw.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    OffsetDateTime::from_unix_timestamp_nanos((secs * 1e9) as i128).ok()
}

fn format_time(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}
