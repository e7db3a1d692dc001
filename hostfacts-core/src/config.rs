use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Where each collector looks for its evidence
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub sudoers_file: PathBuf,
    pub sudoers_dir: PathBuf,
    pub group_file: PathBuf,
    /// Tried in order, first readable one wins
    pub chrony_configs: Vec<PathBuf>,
    pub ntp_config: PathBuf,
    pub resolv_conf: PathBuf,
    pub grub_files: Vec<PathBuf>,
    pub command_timeout: Duration,
}

impl ProbeConfig {
    pub fn new() -> Self {
        Self {
            sudoers_file: PathBuf::from("/etc/sudoers"),
            sudoers_dir: PathBuf::from("/etc/sudoers.d"),
            group_file: PathBuf::from("/etc/group"),
            chrony_configs: vec![
                PathBuf::from("/etc/chrony.conf"),
                PathBuf::from("/etc/chrony/chrony.conf"),
            ],
            ntp_config: PathBuf::from("/etc/ntp.conf"),
            resolv_conf: PathBuf::from(crate::types::RESOLV_CONF_PATH),
            grub_files: vec![
                PathBuf::from("/etc/default/grub"),
                PathBuf::from("/boot/grub/grub.cfg"),
                PathBuf::from("/boot/grub2/grub.cfg"),
            ],
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_sudoers(mut self, file: impl AsRef<Path>, dir: impl AsRef<Path>) -> Self {
        self.sudoers_file = file.as_ref().to_path_buf();
        self.sudoers_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_group_file(mut self, path: impl AsRef<Path>) -> Self {
        self.group_file = path.as_ref().to_path_buf();
        self
    }

    pub fn with_chrony_configs(mut self, paths: Vec<PathBuf>) -> Self {
        self.chrony_configs = paths;
        self
    }

    pub fn with_ntp_config(mut self, path: impl AsRef<Path>) -> Self {
        self.ntp_config = path.as_ref().to_path_buf();
        self
    }

    pub fn with_resolv_conf(mut self, path: impl AsRef<Path>) -> Self {
        self.resolv_conf = path.as_ref().to_path_buf();
        self
    }

    pub fn with_grub_files(mut self, paths: Vec<PathBuf>) -> Self {
        self.grub_files = paths;
        self
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_system_locations() {
        let config = ProbeConfig::default();
        assert_eq!(config.sudoers_file, PathBuf::from("/etc/sudoers"));
        assert_eq!(config.resolv_conf, PathBuf::from("/etc/resolv.conf"));
        assert_eq!(config.grub_files.len(), 3);
        assert_eq!(config.command_timeout, DEFAULT_COMMAND_TIMEOUT);
    }

    #[test]
    fn builder_overrides() {
        let config = ProbeConfig::new()
            .with_command_timeout(Duration::from_secs(2))
            .with_resolv_conf("/tmp/resolv.conf");
        assert_eq!(config.command_timeout, Duration::from_secs(2));
        assert_eq!(config.resolv_conf, PathBuf::from("/tmp/resolv.conf"));
    }
}
