use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Accounts holding administrative (sudo) privilege
///
/// Unordered; serialized sorted so repeated runs diff cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SudoUserSet(HashSet<String>);

impl SudoUserSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a principal, ignoring empty names
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() {
            return false;
        }
        self.0.insert(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names in lexical order, for display
    pub fn sorted(&self) -> Vec<&str> {
        let sorted: BTreeSet<&str> = self.0.iter().map(String::as_str).collect();
        sorted.into_iter().collect()
    }
}

impl Extend<String> for SudoUserSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name);
        }
    }
}

impl FromIterator<String> for SudoUserSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Serialize for SudoUserSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.sorted())
    }
}

/// Time synchronization daemon identified on the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSyncService {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "chronyd")]
    Chronyd,
    #[serde(rename = "ntpd")]
    Ntpd,
    #[serde(rename = "systemd-timesyncd")]
    SystemdTimesyncd,
}

impl TimeSyncService {
    /// Binary and systemd unit name for this service
    pub fn unit_name(&self) -> Option<&'static str> {
        match self {
            TimeSyncService::None => None,
            TimeSyncService::Chronyd => Some("chronyd"),
            TimeSyncService::Ntpd => Some("ntpd"),
            TimeSyncService::SystemdTimesyncd => Some("systemd-timesyncd"),
        }
    }
}

impl fmt::Display for TimeSyncService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.unit_name().unwrap_or("none"))
    }
}

/// Time synchronization configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSyncFacts {
    pub service: TimeSyncService,

    /// True iff the service manager reports the unit as `active`
    #[serde(rename = "enabled")]
    pub active: bool,

    /// Trimmed service manager status output
    #[serde(rename = "status")]
    pub raw_status: String,

    /// Upstream servers in discovery order, duplicates kept
    pub servers: Vec<String>,
}

pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsFacts {
    pub nameservers: Vec<String>,
    pub search_domains: Vec<String>,
    #[serde(rename = "resolv_conf")]
    pub source_path: String,
}

impl DnsFacts {
    pub fn empty(source_path: impl Into<String>) -> Self {
        Self {
            nameservers: Vec::new(),
            search_domains: Vec::new(),
            source_path: source_path.into(),
        }
    }
}

impl Default for DnsFacts {
    fn default() -> Self {
        Self::empty(RESOLV_CONF_PATH)
    }
}

/// How IPv6 was found to be administratively disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisableMethod {
    Sysctl,
    Grub,
}

impl fmt::Display for DisableMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisableMethod::Sysctl => write!(f, "sysctl"),
            DisableMethod::Grub => write!(f, "grub"),
        }
    }
}

/// IPv6 state observed on live interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveStatus {
    Enabled,
    Disabled,
}

impl fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveStatus::Enabled => write!(f, "enabled"),
            LiveStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// IPv6 enablement status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv6Facts {
    pub disabled: bool,

    #[serde(rename = "disable_method")]
    pub disable_methods: BTreeSet<DisableMethod>,

    /// Kernel parameter name to raw queried value
    pub sysctl_values: BTreeMap<String, String>,

    #[serde(rename = "status", skip_serializing_if = "Option::is_none")]
    pub live_status: Option<LiveStatus>,
}

impl Ipv6Facts {
    /// Record static evidence that IPv6 is disabled
    pub fn mark_disabled(&mut self, method: DisableMethod) {
        self.disabled = true;
        self.disable_methods.insert(method);
    }
}
