use anyhow::{bail, Context, Result};
use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::family::Family;
use crate::request::{Credentials, UpdateRequest, DEFAULT_BASE};
use crate::schedule::Schedule;

const DEFAULT_FREQUENCY: Duration = Duration::from_secs(60 * 60);

/// One layer of settings: the config file, or the command line with its
/// environment fallbacks. Unset fields fall through to the layer below.
/// No `Debug`: it holds the password in the clear.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pass: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub daemon: Option<bool>,
    #[serde(default, deserialize_with = "de_duration")]
    pub frequency: Option<Duration>,
    #[serde(default)]
    pub debug: Option<bool>,
}

/// Fully resolved settings handed to the updater.
#[derive(Debug, Clone)]
pub struct Settings {
    pub request: UpdateRequest,
    pub schedule: Schedule,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Fields set in `self` win over those in `lower`.
    pub fn over(self, lower: Config) -> Config {
        Config {
            base: self.base.or(lower.base),
            host: self.host.or(lower.host),
            ip: self.ip.or(lower.ip),
            record_id: self.record_id.or(lower.record_id),
            user: self.user.or(lower.user),
            pass: self.pass.or(lower.pass),
            family: self.family.or(lower.family),
            daemon: self.daemon.or(lower.daemon),
            frequency: self.frequency.or(lower.frequency),
            debug: self.debug.or(lower.debug),
        }
    }

    pub fn into_settings(self) -> Result<Settings> {
        let host = required(self.host, "host", "YDNS_HOST")?;
        let user = required(self.user, "user", "YDNS_USER")?;
        let pass = required(self.pass, "pass", "YDNS_PASS")?;

        let family = match self.family {
            Some(raw) => {
                if !Family::is_recognized(&raw) {
                    warn!("Unknown family {raw:?}, using any");
                }
                Family::from(raw.as_str())
            }
            None => Family::Any,
        };

        let schedule = if self.daemon.unwrap_or(false) {
            let frequency = self.frequency.unwrap_or(DEFAULT_FREQUENCY);
            if frequency.is_zero() {
                bail!("frequency must be greater than zero in daemon mode");
            }
            Schedule::Every(frequency)
        } else {
            Schedule::Once
        };

        let request = UpdateRequest {
            base: self.base.unwrap_or_else(|| DEFAULT_BASE.to_string()),
            host,
            ip: self.ip.filter(|ip| !ip.is_empty()),
            record_id: self.record_id.filter(|id| !id.is_empty()),
            credentials: Credentials::new(user, pass),
            family,
        };

        Ok(Settings { request, schedule })
    }
}

fn required(value: Option<String>, name: &str, env: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("Missing required value `{name}` (flag --{name}, env {env} or config file)"),
    }
}

fn de_duration<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map(Some).map_err(serde::de::Error::custom)
}

/// Parses durations such as `60m`, `1h30m`, `1.5h`, `250ms` or `0`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let mut s = input.trim();
    let negative = s.starts_with('-');
    if let Some(rest) = s.strip_prefix(['-', '+']) {
        s = rest;
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        bail!("invalid duration {input:?}: empty");
    }
    if negative {
        bail!("invalid duration {input:?}: negative");
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let (whole, rest) = split_digits(s);
        let (frac, rest) = match rest.strip_prefix('.') {
            Some(after) => split_digits(after),
            None => ("", rest),
        };
        if whole.is_empty() && frac.is_empty() {
            bail!("invalid duration {input:?}: expected a number at {s:?}");
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (unit, rest) = rest.split_at(unit_len);
        let unit_nanos: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 60 * 60 * 1_000_000_000,
            "" => bail!("invalid duration {input:?}: missing unit"),
            other => bail!("invalid duration {input:?}: unknown unit {other:?}"),
        };

        let overflow = || format!("invalid duration {input:?}: overflow");
        let mut part = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u128>()
                .ok()
                .and_then(|w| w.checked_mul(unit_nanos))
                .with_context(overflow)?
        };
        // Digits past nanosecond precision are dropped.
        let frac = &frac[..frac.len().min(18)];
        if !frac.is_empty() {
            let value: u128 = frac.parse().with_context(overflow)?;
            part += value * unit_nanos / 10u128.pow(frac.len() as u32);
        }

        total = total.checked_add(part).with_context(overflow)?;
        s = rest;
    }

    let nanos = u64::try_from(total)
        .with_context(|| format!("invalid duration {input:?}: overflow"))?;
    Ok(Duration::from_nanos(nanos))
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}
