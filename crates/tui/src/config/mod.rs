use std::{path::PathBuf, time::Duration};

use chrono_tz::Tz;
use clap::Parser;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/cashbook.toml";
const ENV_PREFIX: &str = "CASHBOOK";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Route prefix; empty targets backends serving at the root.
    pub api_prefix: String,
    /// IANA zone for calendar days; unset follows the host zone.
    pub timezone: Option<String>,
    pub export_dir: PathBuf,
    pub resync_on_failed_delete: bool,
    pub request_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            api_prefix: "api".to_string(),
            timezone: None,
            export_dir: PathBuf::from("."),
            resync_on_failed_delete: true,
            request_timeout_secs: None,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn tz(&self) -> Result<Tz> {
        match self.timezone.as_deref() {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|err| AppError::Setting(format!("invalid timezone {name}: {err}"))),
            None => Ok(host_zone(
                std::env::var("TZ").ok().as_deref(),
                iana_time_zone::get_timezone().ok(),
            )),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Zone of the host: `TZ` first, then the system setting, else UTC.
fn host_zone(tz_env: Option<&str>, system: Option<String>) -> Tz {
    let from_env = tz_env
        .map(|value| value.trim_start_matches(':'))
        .and_then(|name| name.parse::<Tz>().ok());
    from_env
        .or_else(|| system.and_then(|name| name.parse::<Tz>().ok()))
        .unwrap_or_else(|| {
            tracing::warn!("host time zone not recognised; using UTC");
            Tz::UTC
        })
}

#[derive(Debug, Default, Parser)]
#[command(name = "cashbook_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:5000).
    #[arg(long)]
    base_url: Option<String>,
    /// Override the route prefix ("" for root routes).
    #[arg(long)]
    api_prefix: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Directory where exported CSV files are written.
    #[arg(long)]
    export_dir: Option<PathBuf>,
    /// Write tracing output to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

pub fn load() -> Result<AppConfig> {
    load_from(Args::parse())
}

fn load_from(args: Args) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(api_prefix) = args.api_prefix {
        settings.api_prefix = api_prefix;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = Some(timezone);
    }
    if let Some(export_dir) = args.export_dir {
        settings.export_dir = export_dir;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = Some(log_file);
    }

    Ok(settings)
}
