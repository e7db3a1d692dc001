use crate::config::ProbeConfig;
use crate::types::DnsFacts;
use anyhow::Result;
use std::fs;
use tracing::{debug, info};

/// DNS Resolver Collector
///
/// Reads nameservers and search domains from resolv.conf
pub struct DnsCollector<'a> {
    config: &'a ProbeConfig,
}

impl<'a> DnsCollector<'a> {
    pub fn new(config: &'a ProbeConfig) -> Self {
        Self { config }
    }

    pub fn collect(&self) -> Result<DnsFacts> {
        let path = &self.config.resolv_conf;
        let source = path.display().to_string();

        let facts = match fs::read_to_string(path) {
            Ok(content) => parse_resolv_conf(&content, source),
            Err(e) => {
                debug!(path = %source, error = %e, "resolver config unavailable");
                DnsFacts::empty(source)
            }
        };

        info!(
            nameservers = facts.nameservers.len(),
            search_domains = facts.search_domains.len(),
            "collected dns settings"
        );
        Ok(facts)
    }
}

impl super::Collector for DnsCollector<'_> {
    type Facts = DnsFacts;

    fn collect(&self) -> Result<DnsFacts> {
        self.collect()
    }

    fn category(&self) -> &'static str {
        "dns_settings"
    }
}

/// Parse resolv.conf(5) text, keeping file order
pub fn parse_resolv_conf(content: &str, source_path: impl Into<String>) -> DnsFacts {
    let mut facts = DnsFacts::empty(source_path);

    for line in content.lines() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("nameserver") => {
                if let Some(addr) = tokens.next() {
                    facts.nameservers.push(addr.to_string());
                }
            }
            Some("search") => facts.search_domains.extend(tokens.map(String::from)),
            _ => {}
        }
    }

    facts
}
