pub mod sudoers;
pub mod timesync;
pub mod dns;
pub mod ipv6;

use anyhow::Result;

/// Trait that all fact collectors implement
///
/// Missing files, missing binaries and failed commands are normal on a
/// locked-down host and must be absorbed into the returned facts. An `Err`
/// means something unexpected happened and aborts the whole run.
pub trait Collector {
    type Facts;

    /// Gather this category's facts
    fn collect(&self) -> Result<Self::Facts>;

    /// Get the category name for this collector
    fn category(&self) -> &'static str;
}
