use crate::config::ProbeConfig;
use crate::types::SudoUserSet;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Groups whose members are treated as sudo users
const ADMIN_GROUPS: &[&str] = &["sudo", "wheel"];

/// Sudo User Collector
///
/// Reads /etc/sudoers, /etc/sudoers.d/* and the sudo/wheel groups in /etc/group
pub struct SudoersCollector<'a> {
    config: &'a ProbeConfig,
}

impl<'a> SudoersCollector<'a> {
    pub fn new(config: &'a ProbeConfig) -> Self {
        Self { config }
    }

    /// Primary sudoers file followed by every regular file in the drop-in directory
    fn sources(&self) -> Vec<PathBuf> {
        let mut sources = vec![self.config.sudoers_file.clone()];

        match fs::read_dir(&self.config.sudoers_dir) {
            Ok(entries) => {
                let mut drop_ins: Vec<PathBuf> = entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|path| path.is_file())
                    .collect();
                drop_ins.sort();
                sources.extend(drop_ins);
            }
            Err(e) => {
                debug!(dir = %self.config.sudoers_dir.display(), error = %e, "sudoers drop-in directory unavailable");
            }
        }

        sources
    }

    fn read_source(path: &Path) -> Option<String> {
        match fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable source");
                None
            }
        }
    }

    pub fn collect(&self) -> Result<SudoUserSet> {
        let mut users = SudoUserSet::new();

        for source in self.sources() {
            if let Some(content) = Self::read_source(&source) {
                let found = parse_sudoers(&content);
                debug!(path = %source.display(), count = found.len(), "parsed sudoers source");
                users.extend(found);
            }
        }

        if let Some(content) = Self::read_source(&self.config.group_file) {
            users.extend(parse_admin_group_members(&content));
        }

        info!(count = users.len(), "collected sudo users");
        Ok(users)
    }
}

impl super::Collector for SudoersCollector<'_> {
    type Facts = SudoUserSet;

    fn collect(&self) -> Result<SudoUserSet> {
        self.collect()
    }

    fn category(&self) -> &'static str {
        "sudo_users"
    }
}

/// Extract individual principals granted `ALL=(ALL...)` from sudoers text
///
/// Group grants (`%sudo ...`) and `root` are not recorded.
pub fn parse_sudoers(content: &str) -> Vec<String> {
    let mut users = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        // Skip comments and empty lines
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // Format: user HOST=(RUNAS) COMMANDS
        //   pi ALL=(ALL:ALL) NOPASSWD: ALL
        //   deploy ALL = (ALL) ALL
        if !trimmed.contains("ALL=(ALL") && !trimmed.contains("ALL = (ALL") {
            continue;
        }

        if let Some(principal) = trimmed.split_whitespace().next() {
            if principal == "root" || principal.starts_with('%') {
                continue;
            }
            users.push(principal.to_string());
        }
    }

    users
}

/// Members of the sudo and wheel groups from group(5) text
pub fn parse_admin_group_members(content: &str) -> Vec<String> {
    let mut members = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.trim().split(':').collect();
        if parts.len() < 4 || !ADMIN_GROUPS.contains(&parts[0]) {
            continue;
        }

        members.extend(
            parts[3]
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from),
        );
    }

    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> ProbeConfig {
        ProbeConfig::new()
            .with_sudoers(dir.path().join("sudoers"), dir.path().join("sudoers.d"))
            .with_group_file(dir.path().join("group"))
    }

    #[test]
    fn test_parse_sudoers_grants() {
        let content = "\
# User privilege specification
root    ALL=(ALL:ALL) ALL
%sudo   ALL=(ALL:ALL) ALL
%admin ALL=(ALL) ALL
alice   ALL=(ALL:ALL) NOPASSWD: ALL
bob ALL = (ALL) ALL
carol   ALL=/usr/bin/reboot
Defaults env_reset

   # indented comment ALL=(ALL)
";
        let users = parse_sudoers(content);
        assert_eq!(users, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn test_parse_group_members() {
        let content = "\
root:x:0:
sudo:x:27:alice,dave
wheel:x:10:erin,
sudoers:x:99:mallory
users:x:100:frank
adm:x:4:syslog
";
        let members = parse_admin_group_members(content);
        assert_eq!(members, vec!["alice", "dave", "erin"]);
    }

    #[test]
    fn test_group_without_members() {
        assert!(parse_admin_group_members("sudo:x:27:\nwheel:x:10\n").is_empty());
    }

    #[test]
    fn test_collect_merges_and_dedups() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sudoers"), "alice ALL=(ALL) ALL\n").unwrap();
        fs::create_dir(dir.path().join("sudoers.d")).unwrap();
        fs::write(dir.path().join("sudoers.d/90-cloud"), "ubuntu ALL=(ALL) NOPASSWD:ALL\n").unwrap();
        fs::create_dir(dir.path().join("sudoers.d/nested")).unwrap();
        fs::write(dir.path().join("group"), "sudo:x:27:alice,ubuntu,bob\n").unwrap();

        let config = config_in(&dir);
        let users = SudoersCollector::new(&config).collect().unwrap();

        assert_eq!(users.len(), 3);
        for name in ["alice", "ubuntu", "bob"] {
            assert!(users.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_missing_drop_in_dir_uses_groups_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("group"), "wheel:x:10:ops\n").unwrap();

        let config = config_in(&dir);
        let users = SudoersCollector::new(&config).collect().unwrap();

        assert_eq!(users.sorted(), vec!["ops"]);
    }

    #[test]
    fn test_nothing_readable_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let users = SudoersCollector::new(&config).collect().unwrap();
        assert!(users.is_empty());
    }

    #[test]
    fn test_malformed_sources_contribute_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sudoers"), "this is not sudoers\n:::\n").unwrap();
        fs::write(dir.path().join("group"), "garbage line\n").unwrap();
        let config = config_in(&dir);
        let users = SudoersCollector::new(&config).collect().unwrap();
        assert!(users.is_empty());
    }
}
