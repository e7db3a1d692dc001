use crate::config::ProbeConfig;
use crate::runner::CommandRunner;
use crate::types::{DisableMethod, Ipv6Facts, LiveStatus};
use anyhow::Result;
use std::fs;
use tracing::{debug, info};

/// Kernel parameters that switch IPv6 off
const DISABLE_PARAMS: &[&str] = &[
    "net.ipv6.conf.all.disable_ipv6",
    "net.ipv6.conf.default.disable_ipv6",
    "net.ipv6.conf.lo.disable_ipv6",
];

/// Kernel command line flag that disables the IPv6 stack at boot
const GRUB_DISABLE_FLAG: &str = "ipv6.disable=1";

/// IPv6 Status Collector
///
/// Correlates sysctl state, bootloader configuration and live interface
/// addresses. Static evidence can only switch `disabled` on; an active
/// non-loopback address on a live interface switches it back off.
pub struct Ipv6Collector<'a> {
    config: &'a ProbeConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> Ipv6Collector<'a> {
    pub fn new(config: &'a ProbeConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    fn check_sysctl(&self, facts: &mut Ipv6Facts) {
        for &param in DISABLE_PARAMS {
            let outcome = self.runner.run("sysctl", &[param]);
            if !outcome.success() {
                debug!(param, exit_code = ?outcome.exit_code, "sysctl query failed");
                continue;
            }

            let value = parse_sysctl_value(&outcome.stdout);
            if value == "1" {
                facts.mark_disabled(DisableMethod::Sysctl);
            }
            facts.sysctl_values.insert(param.to_string(), value);
        }
    }

    fn check_grub(&self, facts: &mut Ipv6Facts) {
        for path in &self.config.grub_files {
            match fs::read_to_string(path) {
                Ok(content) if content.contains(GRUB_DISABLE_FLAG) => {
                    debug!(path = %path.display(), "bootloader disables ipv6");
                    facts.mark_disabled(DisableMethod::Grub);
                }
                Ok(_) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "bootloader config unavailable"),
            }
        }
    }

    fn check_live(&self, facts: &mut Ipv6Facts) {
        let outcome = self.runner.run("ip", &["-6", "addr", "show"]);
        if !outcome.success() || outcome.stdout.trim().is_empty() {
            debug!(exit_code = ?outcome.exit_code, "live ipv6 address query unavailable");
            return;
        }

        if has_active_ipv6_address(&outcome.stdout) {
            // Live evidence overrides static configuration
            facts.live_status = Some(LiveStatus::Enabled);
            facts.disabled = false;
        } else if facts.disabled {
            facts.live_status = Some(LiveStatus::Disabled);
        }
    }

    pub fn collect(&self) -> Result<Ipv6Facts> {
        let mut facts = Ipv6Facts::default();

        self.check_sysctl(&mut facts);
        self.check_grub(&mut facts);
        self.check_live(&mut facts);

        info!(
            disabled = facts.disabled,
            methods = ?facts.disable_methods,
            live_status = ?facts.live_status,
            "collected ipv6 status"
        );
        Ok(facts)
    }
}

impl super::Collector for Ipv6Collector<'_> {
    type Facts = Ipv6Facts;

    fn collect(&self) -> Result<Ipv6Facts> {
        self.collect()
    }

    fn category(&self) -> &'static str {
        "ipv6_status"
    }
}

/// Value part of `sysctl <name>` output (`name = value`)
pub fn parse_sysctl_value(output: &str) -> String {
    output
        .trim()
        .rsplit('=')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Whether `ip -6 addr show` output lists any address other than `::1`
pub fn has_active_ipv6_address(output: &str) -> bool {
    output.lines().any(|line| {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("inet6") {
            return false;
        }
        match tokens.next() {
            Some(cidr) => cidr.split('/').next() != Some("::1"),
            None => false,
        }
    })
}
