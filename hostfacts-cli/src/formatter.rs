use anyhow::Result;
use hostfacts_core::types::{FactReport, FailureReport};

const RULE: &str = "─────────────────────────────────────────────────────────────\n";

fn section(output: &mut String, title: &str) {
    output.push_str(RULE);
    output.push_str(title);
    output.push('\n');
    output.push_str(RULE);
}

fn list_or_none(items: &[impl AsRef<str>]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.iter().map(|i| i.as_ref()).collect::<Vec<_>>().join(", ")
    }
}

/// Format report as human-readable text
pub fn format_text(report: &FactReport) -> String {
    let mut output = String::new();

    output.push_str("═══════════════════════════════════════════════════════════════\n");
    output.push_str("                    Host Configuration Facts\n");
    output.push_str("═══════════════════════════════════════════════════════════════\n\n");

    output.push_str(&format!("Version: {}\n", report.metadata.version));
    output.push_str(&format!("Timestamp: {}\n", report.metadata.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
    output.push_str(&format!("Hostname: {}\n", report.metadata.hostname));
    output.push_str(&format!("Run as root: {}\n", if report.metadata.run_as_root { "Yes" } else { "No" }));
    output.push('\n');

    section(&mut output, "SUDO USERS");
    output.push_str(&format!("{}\n\n", list_or_none(&report.sudo_users.sorted())));

    let ntp = &report.time_sync;
    section(&mut output, "TIME SYNCHRONIZATION");
    output.push_str(&format!("Service: {}\n", ntp.service));
    if ntp.service.unit_name().is_some() {
        let status = if ntp.raw_status.is_empty() { "unknown" } else { ntp.raw_status.as_str() };
        output.push_str(&format!("Active: {} ({})\n", if ntp.active { "Yes" } else { "No" }, status));
        output.push_str(&format!("Servers: {}\n", list_or_none(&ntp.servers)));
    }
    output.push('\n');

    let dns = &report.dns;
    section(&mut output, "DNS");
    output.push_str(&format!("Source: {}\n", dns.source_path));
    output.push_str(&format!("Nameservers: {}\n", list_or_none(&dns.nameservers)));
    output.push_str(&format!("Search domains: {}\n\n", list_or_none(&dns.search_domains)));

    let ipv6 = &report.ipv6;
    section(&mut output, "IPV6");
    output.push_str(&format!("Disabled: {}\n", if ipv6.disabled { "Yes" } else { "No" }));
    if !ipv6.disable_methods.is_empty() {
        let methods: Vec<String> = ipv6.disable_methods.iter().map(|m| m.to_string()).collect();
        output.push_str(&format!("Disable methods: {}\n", methods.join(", ")));
    }
    for (param, value) in &ipv6.sysctl_values {
        output.push_str(&format!("  {} = {}\n", param, value));
    }
    if let Some(live) = ipv6.live_status {
        output.push_str(&format!("Live interfaces: {}\n", live));
    }
    output.push('\n');

    output.push_str("═══════════════════════════════════════════════════════════════\n");

    output
}

/// Format report as JSON
pub fn format_json(report: &FactReport, pretty: bool) -> Result<String> {
    let mut json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    json.push('\n');
    Ok(json)
}

/// Single-line JSON failure result carrying the full error chain
pub fn format_failure(err: &anyhow::Error) -> String {
    let failure = FailureReport::new(format!("{:#}", err));
    serde_json::to_string(&failure)
        .unwrap_or_else(|_| r#"{"failed":true,"changed":false,"msg":"unserializable error"}"#.to_string())
}
