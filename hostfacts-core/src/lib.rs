pub mod config;
pub mod modules;
pub mod runner;
pub mod types;

use anyhow::{Context, Result};
use chrono::Utc;
use modules::dns::DnsCollector;
use modules::ipv6::Ipv6Collector;
use modules::sudoers::SudoersCollector;
use modules::timesync::TimeSyncCollector;
use modules::Collector;
use tracing::debug;
use types::*;

pub use config::ProbeConfig;
pub use runner::{CommandOutcome, CommandRunner, SystemCommandRunner};

/// Main orchestrator: runs every collector and assembles one report
pub struct FactRunner {
    config: ProbeConfig,
    runner: Box<dyn CommandRunner>,
}

impl FactRunner {
    pub fn new() -> Self {
        Self::with_config(ProbeConfig::default())
    }

    pub fn with_config(config: ProbeConfig) -> Self {
        let runner = SystemCommandRunner::new(config.command_timeout);
        Self {
            config,
            runner: Box::new(runner),
        }
    }

    /// Replace the subprocess runner, e.g. with a scripted one
    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Check if running as root
    pub fn is_root() -> bool {
        nix::unistd::Uid::effective().is_root()
    }

    /// Get hostname
    fn get_hostname() -> String {
        nix::unistd::gethostname()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn metadata() -> ReportMetadata {
        ReportMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            hostname: Self::get_hostname(),
            run_as_root: Self::is_root(),
        }
    }

    /// Run all collectors and build the fact report
    ///
    /// Missing evidence never fails the run; any collector error aborts it
    /// and no partial report is produced.
    pub fn run(&self) -> Result<FactReport> {
        let runner = self.runner.as_ref();

        assemble(
            Self::metadata(),
            &SudoersCollector::new(&self.config),
            &TimeSyncCollector::new(&self.config, runner),
            &DnsCollector::new(&self.config),
            &Ipv6Collector::new(&self.config, runner),
        )
    }
}

impl Default for FactRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn gather<C: Collector>(collector: &C) -> Result<C::Facts> {
    debug!(category = collector.category(), "running collector");
    collector
        .collect()
        .with_context(|| format!("failed to collect {}", collector.category()))
}

fn assemble(
    metadata: ReportMetadata,
    sudo: &impl Collector<Facts = SudoUserSet>,
    time_sync: &impl Collector<Facts = TimeSyncFacts>,
    dns: &impl Collector<Facts = DnsFacts>,
    ipv6: &impl Collector<Facts = Ipv6Facts>,
) -> Result<FactReport> {
    let sudo_users = gather(sudo)?;
    let time_sync = gather(time_sync)?;
    let dns = gather(dns)?;
    let ipv6 = gather(ipv6)?;

    Ok(FactReport::new(metadata, sudo_users, time_sync, dns, ipv6))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::FakeRunner;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct Broken;

    impl Collector for Broken {
        type Facts = Ipv6Facts;

        fn collect(&self) -> Result<Ipv6Facts> {
            anyhow::bail!("out of file descriptors")
        }

        fn category(&self) -> &'static str {
            "ipv6_status"
        }
    }

    fn sandbox_config(root: &Path) -> ProbeConfig {
        ProbeConfig::new()
            .with_sudoers(root.join("sudoers"), root.join("sudoers.d"))
            .with_group_file(root.join("group"))
            .with_chrony_configs(vec![root.join("chrony.conf")])
            .with_ntp_config(root.join("ntp.conf"))
            .with_resolv_conf(root.join("resolv.conf"))
            .with_grub_files(vec![root.join("grub")])
    }

    #[test]
    fn test_run_on_empty_host() {
        let dir = TempDir::new().unwrap();
        let report = FactRunner::with_config(sandbox_config(dir.path()))
            .with_runner(FakeRunner::new())
            .run()
            .unwrap();

        assert!(!report.changed);
        assert!(report.sudo_users.is_empty());
        assert_eq!(report.time_sync, TimeSyncFacts::default());
        assert!(report.dns.nameservers.is_empty());
        assert!(!report.ipv6.disabled);
        assert_eq!(report.ipv6.live_status, None);
    }

    #[test]
    fn test_run_collects_every_category() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sudoers"), "deploy ALL=(ALL) NOPASSWD: ALL\n").unwrap();
        fs::write(dir.path().join("group"), "sudo:x:27:alice\n").unwrap();
        fs::write(dir.path().join("chrony.conf"), "server ntp.example.net iburst\n").unwrap();
        fs::write(dir.path().join("resolv.conf"), "nameserver 9.9.9.9\n").unwrap();
        let runner = FakeRunner::new()
            .with_binary("chronyd")
            .on("systemctl is-active chronyd", CommandOutcome::completed(0, "active\n", ""));

        let report = FactRunner::with_config(sandbox_config(dir.path()))
            .with_runner(runner)
            .run()
            .unwrap();

        assert_eq!(report.sudo_users.sorted(), vec!["alice", "deploy"]);
        assert_eq!(report.time_sync.service, TimeSyncService::Chronyd);
        assert_eq!(report.time_sync.servers, vec!["ntp.example.net"]);
        assert_eq!(report.dns.nameservers, vec!["9.9.9.9"]);
        assert_eq!(report.metadata.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_collector_fault_aborts_run() {
        let dir = TempDir::new().unwrap();
        let config = sandbox_config(dir.path());
        let runner = FakeRunner::new();

        let result = assemble(
            FactRunner::metadata(),
            &SudoersCollector::new(&config),
            &TimeSyncCollector::new(&config, &runner),
            &DnsCollector::new(&config),
            &Broken,
        );

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "failed to collect ipv6_status");
        assert_eq!(err.root_cause().to_string(), "out of file descriptors");
    }

    #[test]
    fn test_report_serializes_with_stable_keys() {
        let dir = TempDir::new().unwrap();
        let report = FactRunner::with_config(sandbox_config(dir.path()))
            .with_runner(FakeRunner::new())
            .run()
            .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["changed"], false);
        assert_eq!(json["sudo_users"], serde_json::json!([]));
        assert_eq!(json["ntp_settings"]["service"], "none");
        assert_eq!(json["ntp_settings"]["enabled"], false);
        assert!(json["dns_settings"]["resolv_conf"].as_str().unwrap().ends_with("resolv.conf"));
        assert_eq!(json["ipv6_status"]["disable_method"], serde_json::json!([]));
        assert!(json["ipv6_status"].get("status").is_none());
    }
}
