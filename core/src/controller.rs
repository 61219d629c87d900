//! # Power Controller
//!
//! Idempotent on/off transitions of the discrete device through its `_OFF`
//! and `_ON` firmware methods. The controller is the only writer of
//! `current_state`.

use alloc::string::String;

use dgd_hal::{AcpiEvaluator, AcpiMethod, Error, Platform, Result};

use crate::device::GpuDevice;
use crate::guard::PowerDomainGuard;
use crate::oracle::read_power_state;
use crate::state::{ModuleState, PowerState};

// =============================================================================
// POLICY AND OUTCOMES
// =============================================================================

/// How a failing firmware status is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirmwarePolicy {
    /// Return `Error::FirmwareCall` and leave `current_state` alone
    #[default]
    Report,
    /// Log a warning and record the transition as if it succeeded
    Ignore,
}

/// Outcome of a controller operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The oracle already reported the requested state; firmware untouched
    AlreadyInState,
    /// A driver is bound to the device; firmware untouched
    Refused {
        /// Name of the bound driver
        driver: String,
    },
    /// Firmware method evaluated and `current_state` updated
    Switched,
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// On/off controller for one discrete device
///
/// Every operation needs a live [`PowerDomainGuard`] for the device.
pub struct PowerController<'a, P: Platform> {
    platform: &'a P,
    device: &'a GpuDevice<P::Device>,
    state: &'a ModuleState,
    policy: FirmwarePolicy,
}

impl<'a, P: Platform> PowerController<'a, P> {
    /// Create a controller
    pub fn new(
        platform: &'a P,
        device: &'a GpuDevice<P::Device>,
        state: &'a ModuleState,
        policy: FirmwarePolicy,
    ) -> Self {
        Self {
            platform,
            device,
            state,
            policy,
        }
    }

    /// Power the device down
    ///
    /// Refuses while a driver is bound: cutting power under an active
    /// driver can hang the bus.
    pub fn turn_off(&self, guard: &PowerDomainGuard<'_, P::RuntimePm>) -> Result<Transition> {
        log::info!(target: dgd_hal::LOG_TARGET, "turning discrete off");

        let mut current = self.state.lock_current();

        if read_power_state(self.device, guard) == PowerState::Disabled {
            return Ok(Transition::AlreadyInState);
        }

        if let Some(driver) = self.device.bound_driver() {
            log::warn!(
                target: dgd_hal::LOG_TARGET,
                "device {} is in use by driver '{}', refusing OFF",
                self.device,
                driver
            );
            return Ok(Transition::Refused { driver });
        }

        log::info!(target: dgd_hal::LOG_TARGET, "disabling discrete graphics");
        self.invoke(AcpiMethod::Off)?;

        *current = PowerState::Disabled;
        Ok(Transition::Switched)
    }

    /// Power the device up
    pub fn turn_on(&self, guard: &PowerDomainGuard<'_, P::RuntimePm>) -> Result<Transition> {
        log::info!(target: dgd_hal::LOG_TARGET, "turning discrete on");

        let mut current = self.state.lock_current();

        if read_power_state(self.device, guard) == PowerState::Enabled {
            return Ok(Transition::AlreadyInState);
        }

        log::info!(target: dgd_hal::LOG_TARGET, "enabling discrete graphics");
        self.invoke(AcpiMethod::On)?;

        *current = PowerState::Enabled;
        Ok(Transition::Switched)
    }

    fn invoke(&self, method: AcpiMethod) -> Result<()> {
        let status = self.platform.firmware().evaluate(self.device.handle(), method);
        if status.is_ok() {
            return Ok(());
        }

        match self.policy {
            FirmwarePolicy::Report => {
                log::error!(
                    target: dgd_hal::LOG_TARGET,
                    "{} on {} failed: {}",
                    method,
                    self.device,
                    status
                );
                Err(Error::FirmwareCall { method, status })
            }
            FirmwarePolicy::Ignore => {
                log::warn!(
                    target: dgd_hal::LOG_TARGET,
                    "{} on {} returned {}, ignoring",
                    method,
                    self.device,
                    status
                );
                Ok(())
            }
        }
    }
}

impl<P: Platform> core::fmt::Debug for PowerController<'_, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PowerController")
            .field("device", &self.device.address())
            .field("policy", &self.policy)
            .finish()
    }
}
