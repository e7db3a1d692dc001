use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use super::{DnsFacts, Ipv6Facts, SudoUserSet, TimeSyncFacts};

/// Metadata about when and where the facts were gathered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    pub run_as_root: bool,
}

/// Complete point-in-time fact snapshot of the host
///
/// Built once per invocation and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactReport {
    /// Always false: the probe never modifies the host
    pub changed: bool,
    pub metadata: ReportMetadata,
    pub sudo_users: SudoUserSet,
    #[serde(rename = "ntp_settings")]
    pub time_sync: TimeSyncFacts,
    #[serde(rename = "dns_settings")]
    pub dns: DnsFacts,
    #[serde(rename = "ipv6_status")]
    pub ipv6: Ipv6Facts,
}

impl FactReport {
    pub fn new(
        metadata: ReportMetadata,
        sudo_users: SudoUserSet,
        time_sync: TimeSyncFacts,
        dns: DnsFacts,
        ipv6: Ipv6Facts,
    ) -> Self {
        Self {
            changed: false,
            metadata,
            sudo_users,
            time_sync,
            dns,
            ipv6,
        }
    }
}

/// Result emitted in place of a report when collection hits a fault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub failed: bool,
    pub changed: bool,
    pub msg: String,
}

impl FailureReport {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            failed: true,
            changed: false,
            msg: msg.into(),
        }
    }
}
