//! # Power-Domain Guard
//!
//! Keeps the discrete device's upstream bridge resumed while its
//! configuration space is accessed. Acquire happens on construction, release
//! on drop, so every exit path releases.

use core::fmt;

use dgd_hal::{PciAddr, PciDevice, RuntimePm};

use crate::device::GpuDevice;

/// Scoped hold on a bridge's power domain
///
/// Devices without an upstream bridge get a guard that does nothing.
#[must_use = "the bridge is released as soon as the guard is dropped"]
pub struct PowerDomainGuard<'a, R: RuntimePm + ?Sized> {
    pm: &'a R,
    device: PciAddr,
    bridge: Option<PciAddr>,
}

impl<'a, R: RuntimePm + ?Sized> PowerDomainGuard<'a, R> {
    /// Resume the bridge above `device`
    pub fn acquire<D: PciDevice>(pm: &'a R, device: &GpuDevice<D>) -> Self {
        let bridge = device.bridge();
        if let Some(bridge) = bridge {
            log::trace!(target: dgd_hal::LOG_TARGET, "get bridge {}", bridge);
            pm.get_sync(bridge);
        }
        Self {
            pm,
            device: device.address(),
            bridge,
        }
    }

    /// Device whose bridge is held
    pub fn device(&self) -> PciAddr {
        self.device
    }

    /// Bridge being held, if any
    pub fn bridge(&self) -> Option<PciAddr> {
        self.bridge
    }
}

impl<R: RuntimePm + ?Sized> Drop for PowerDomainGuard<'_, R> {
    fn drop(&mut self) {
        if let Some(bridge) = self.bridge {
            log::trace!(target: dgd_hal::LOG_TARGET, "put bridge {}", bridge);
            self.pm.put_sync(bridge);
        }
    }
}

impl<R: RuntimePm + ?Sized> fmt::Debug for PowerDomainGuard<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PowerDomainGuard")
            .field("device", &self.device)
            .field("bridge", &self.bridge)
            .finish()
    }
}
