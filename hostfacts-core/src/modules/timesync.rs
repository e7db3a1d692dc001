use crate::config::ProbeConfig;
use crate::runner::{binary_present, CommandRunner};
use crate::types::{TimeSyncFacts, TimeSyncService};
use anyhow::Result;
use std::fs;
use tracing::{debug, info};

type ServerExtractor = fn(&ProbeConfig, &dyn CommandRunner) -> Vec<String>;

/// Probe order: the first backend whose binary is present wins
const BACKENDS: &[(TimeSyncService, ServerExtractor)] = &[
    (TimeSyncService::Chronyd, chrony_servers),
    (TimeSyncService::Ntpd, ntp_servers),
    (TimeSyncService::SystemdTimesyncd, timesyncd_servers),
];

/// Time Synchronization Collector
///
/// Identifies chronyd, ntpd or systemd-timesyncd and its upstream servers
pub struct TimeSyncCollector<'a> {
    config: &'a ProbeConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> TimeSyncCollector<'a> {
    pub fn new(config: &'a ProbeConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    fn detect(&self, service: TimeSyncService) -> bool {
        match service.unit_name() {
            Some(binary) => binary_present(self.runner, binary),
            None => false,
        }
    }

    /// `systemctl is-active` output, trimmed. Empty when systemctl did not run.
    fn unit_status(&self, unit: &str) -> String {
        let outcome = self.runner.run("systemctl", &["is-active", unit]);
        outcome.stdout.trim().to_string()
    }

    pub fn collect(&self) -> Result<TimeSyncFacts> {
        let Some((service, extract_servers)) = BACKENDS
            .iter()
            .find(|(service, _)| self.detect(*service))
        else {
            info!("no time synchronization service found");
            return Ok(TimeSyncFacts::default());
        };

        let raw_status = service
            .unit_name()
            .map(|unit| self.unit_status(unit))
            .unwrap_or_default();

        let facts = TimeSyncFacts {
            service: *service,
            active: raw_status == "active",
            servers: extract_servers(self.config, self.runner),
            raw_status,
        };

        info!(
            service = %facts.service,
            active = facts.active,
            servers = facts.servers.len(),
            "collected time sync settings"
        );
        Ok(facts)
    }
}

impl super::Collector for TimeSyncCollector<'_> {
    type Facts = TimeSyncFacts;

    fn collect(&self) -> Result<TimeSyncFacts> {
        self.collect()
    }

    fn category(&self) -> &'static str {
        "ntp_settings"
    }
}

fn chrony_servers(config: &ProbeConfig, _runner: &dyn CommandRunner) -> Vec<String> {
    for path in &config.chrony_configs {
        match fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "reading chrony config");
                return parse_config_servers(&content, &["server", "pool"]);
            }
            Err(e) => debug!(path = %path.display(), error = %e, "chrony config unavailable"),
        }
    }
    Vec::new()
}

fn ntp_servers(config: &ProbeConfig, _runner: &dyn CommandRunner) -> Vec<String> {
    match fs::read_to_string(&config.ntp_config) {
        Ok(content) => parse_config_servers(&content, &["server"]),
        Err(e) => {
            debug!(path = %config.ntp_config.display(), error = %e, "ntp config unavailable");
            Vec::new()
        }
    }
}

fn timesyncd_servers(_config: &ProbeConfig, runner: &dyn CommandRunner) -> Vec<String> {
    let outcome = runner.run("timedatectl", &["show-timesync", "--all"]);
    if !outcome.success() {
        debug!(exit_code = ?outcome.exit_code, "timedatectl show-timesync gave nothing usable");
        return Vec::new();
    }
    parse_timesync_status(&outcome.stdout)
}

/// Second token of every line whose first token is one of `directives`
pub fn parse_config_servers(content: &str, directives: &[&str]) -> Vec<String> {
    let mut servers = Vec::new();

    for line in content.lines() {
        let mut tokens = line.split_whitespace();
        let Some(directive) = tokens.next() else {
            continue;
        };
        if !directives.contains(&directive) {
            continue;
        }
        if let Some(address) = tokens.next() {
            servers.push(address.to_string());
        }
    }

    servers
}

/// Every non-empty `ServerName=` value from `timedatectl show-timesync` output
pub fn parse_timesync_status(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().split_once('='))
        .filter(|(key, _)| *key == "ServerName")
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(String::from)
        .collect()
}
