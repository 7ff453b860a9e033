use std::convert::Infallible;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgAction, Parser};
use ddns_route53::updater::{self, UpdatePolicy, Updater};
use log::{error, info};
use time::OffsetDateTime;

#[derive(Parser, Debug)]
#[command(name = "ddns-update")]
#[command(about = "Keep a DDNS hostname pointed at this network's public address")]
struct Args {
    /// Update even if nothing changed; any non-empty DDNS_FORCE counts
    #[arg(
        short,
        long,
        env = "DDNS_FORCE",
        num_args = 0..=1,
        default_missing_value = "1",
        value_parser = non_empty
    )]
    force: Option<bool>,

    /// Shared update token
    #[arg(short, long, env = "DDNS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// File holding the shared update token
    #[arg(short = 'T', long, env = "DDNS_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Update endpoint URL
    #[arg(short = 'U', long, env = "DDNS_URL")]
    url: String,

    /// Hostname to update
    #[arg(short = 'H', long, env = "DDNS_HOSTNAME")]
    hostname: String,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Where the time of the last successful update is kept
    #[arg(short, long, env = "DDNS_LAST_UPDATE_FILE", default_value = "/run/ddns_last_update")]
    last_update_file: PathBuf,

    /// Seconds after which an update is sent even if the address is unchanged
    #[arg(short, long, env = "DDNS_MAX_INTERVAL", default_value_t = 86400)]
    max_interval: u64,

    /// Previous address, as exported by DHCP client hooks
    #[arg(long, env = "old_ip_address")]
    old_ip_address: Option<String>,

    /// Current address, as exported by DHCP client hooks
    #[arg(long, env = "new_ip_address")]
    new_ip_address: Option<String>,
}

fn non_empty(value: &str) -> Result<bool, Infallible> {
    Ok(!value.is_empty())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let level = ["warn", "info", "debug"][usize::from(args.verbose.min(2))];
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let token = updater::resolve_token(args.token, args.token_file.as_deref())?;
    let policy = UpdatePolicy {
        force: args.force.unwrap_or(false),
        max_interval: Duration::from_secs(args.max_interval),
        old_address: args.old_ip_address,
        new_address: args.new_ip_address,
    };

    let now = OffsetDateTime::now_utc();
    if !policy.should_update(&args.last_update_file, now) {
        info!("not updating address for {}", args.hostname);
        return Ok(ExitCode::SUCCESS);
    }

    let updater = Updater::new(args.url, args.hostname, token)?;
    let response = updater.update().await?;

    if response.is_success() {
        info!(
            "updated address for {} to {}",
            updater.hostname(),
            response.address.as_deref().unwrap_or("-")
        );
        updater::write_last_update(&args.last_update_file, OffsetDateTime::now_utc())?;
        Ok(ExitCode::SUCCESS)
    } else {
        error!("failed to update address for {}: {}", updater.hostname(), response.message);
        Ok(ExitCode::FAILURE)
    }
}
