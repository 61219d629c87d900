//! # Module Slot
//!
//! Host-facing entry points. A host keeps one `DisablerModule` in a static
//! and calls `init`/`exit` from its load and unload hooks.

use alloc::sync::Arc;
use core::fmt;

use dgd_hal::{Error, Platform, Result};
use spin::Mutex;

use crate::config::DisablerConfig;
use crate::disabler::{Disabler, DisablerStatus, Teardown};

/// Holder for at most one loaded [`Disabler`]
pub struct DisablerModule<P: Platform> {
    slot: Mutex<Option<Disabler<P>>>,
}

impl<P: Platform> DisablerModule<P> {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Load hook
    pub fn init(&self, platform: Arc<P>, config: &DisablerConfig) -> Result<()> {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return Err(Error::AlreadyLoaded);
        }
        *slot = Some(Disabler::load(platform, config)?);
        Ok(())
    }

    /// Unload hook; `None` if nothing was loaded
    pub fn exit(&self) -> Option<Teardown> {
        let disabler = self.slot.lock().take();
        disabler.map(Disabler::unload)
    }

    /// Whether a disabler is loaded
    pub fn is_loaded(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Status of the loaded disabler
    pub fn status(&self) -> Option<DisablerStatus> {
        self.slot.lock().as_ref().map(Disabler::status)
    }
}

impl<P: Platform> Default for DisablerModule<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> fmt::Debug for DisablerModule<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisablerModule")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgd_core::{PowerState, Transition};
    use dgd_hal::testing::{SimDevice, SimPlatform};
    use dgd_hal::{AcpiMethod, PciAddr};

    fn platform() -> Arc<SimPlatform> {
        let platform = Arc::new(SimPlatform::new());
        platform.add(
            SimDevice::builder(PciAddr::new(0, 1, 0, 0))
                .vendor(0x10DE, 0x1C8D)
                .class(0x030200)
                .acpi(2, "\\_SB_.PCI0.PEG0.PEGP")
                .bridge(PciAddr::new(0, 0, 1, 0)),
        );
        platform
    }

    #[test]
    fn test_init_exit() {
        static MODULE: DisablerModule<SimPlatform> = DisablerModule::new();
        let platform = platform();

        assert!(MODULE.exit().is_none());
        MODULE.init(platform.clone(), &DisablerConfig::default()).unwrap();
        assert!(MODULE.is_loaded());
        assert_eq!(MODULE.status().map(|s| s.current_state), Some(PowerState::Disabled));

        assert_eq!(
            MODULE.init(platform.clone(), &DisablerConfig::default()),
            Err(Error::AlreadyLoaded)
        );
        assert_eq!(platform.firmware_calls(), [AcpiMethod::Off]);

        assert_eq!(MODULE.exit(), Some(Teardown::Restored(Ok(Transition::Switched))));
        assert!(!MODULE.is_loaded());
        assert!(MODULE.exit().is_none());
        assert_eq!(platform.firmware_calls(), [AcpiMethod::Off, AcpiMethod::On]);
    }

    #[test]
    fn test_failed_init_leaves_slot_empty() {
        let module = DisablerModule::<SimPlatform>::new();
        let empty = Arc::new(SimPlatform::new());

        assert_eq!(
            module.init(empty, &DisablerConfig::default()).map_err(|e| e.errno()),
            Err(-19)
        );
        assert!(!module.is_loaded());
    }
}
