//! # Runtime Power Management
//!
//! Reference-counted resume/suspend of a bridge's power domain. A bridge must
//! be resumed before configuration space behind it returns meaningful data.

use crate::types::PciAddr;

/// Power-domain primitive for bus bridges
///
/// Both calls are synchronous and reference counted; every `get_sync` must
/// be paired with exactly one `put_sync`.
pub trait RuntimePm: Send + Sync {
    /// Take a usage reference and resume the bridge if it was suspended
    fn get_sync(&self, bridge: PciAddr);

    /// Drop a usage reference; the bridge may suspend once it reaches zero
    fn put_sync(&self, bridge: PciAddr);
}
