//! # Power State Oracle
//!
//! Infers the discrete device's power state from its configuration space: a
//! powered-off function does not answer config cycles, so the Vendor/Device
//! ID dword reads back as all-ones.
//!
//! This is a heuristic. A genuinely absent device, or a read issued while
//! the upstream bridge is suspended, looks exactly like a powered-off one,
//! which is why reads require a live [`PowerDomainGuard`].

use dgd_hal::pci::{PCI_CFG_ALL_ONES, PCI_VENDOR_ID};
use dgd_hal::{PciDevice, RuntimePm};

use crate::device::GpuDevice;
use crate::guard::PowerDomainGuard;
use crate::state::PowerState;

/// Classify the Vendor/Device ID dword
#[inline]
pub const fn power_state_from_word(word: u32) -> PowerState {
    if word == PCI_CFG_ALL_ONES {
        PowerState::Disabled
    } else {
        PowerState::Enabled
    }
}

/// Read the current power state of `device`
///
/// A failed config read is treated as all-ones.
pub fn read_power_state<D, R>(device: &GpuDevice<D>, guard: &PowerDomainGuard<'_, R>) -> PowerState
where
    D: PciDevice,
    R: RuntimePm + ?Sized,
{
    debug_assert_eq!(guard.device(), device.address(), "guard held for another device");

    let word = match device.pci().read_config_dword(PCI_VENDOR_ID) {
        Ok(word) => word,
        Err(e) => {
            log::debug!(
                target: dgd_hal::LOG_TARGET,
                "config read on {} failed ({}), assuming all-ones",
                device,
                e
            );
            PCI_CFG_ALL_ONES
        }
    };

    let state = power_state_from_word(word);
    log::debug!(
        target: dgd_hal::LOG_TARGET,
        "{}: id word {:#010x}, power {}",
        device,
        word,
        state
    );
    state
}
