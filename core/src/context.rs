//! # Power Context
//!
//! The single object shared between the lifecycle owner and the sleep
//! coordinator: platform, discrete device, module state and policy.

use alloc::sync::Arc;

use dgd_hal::Platform;

use crate::controller::{FirmwarePolicy, PowerController};
use crate::device::GpuDevice;
use crate::guard::PowerDomainGuard;
use crate::oracle;
use crate::state::{ModuleState, PowerState};

/// Shared disabler context
///
/// Lives as long as the longest holder of its `Arc`: the PM callback path
/// can never observe it torn down.
pub struct PowerContext<P: Platform> {
    platform: Arc<P>,
    device: GpuDevice<P::Device>,
    state: ModuleState,
    firmware_policy: FirmwarePolicy,
}

impl<P: Platform> PowerContext<P> {
    /// Create a context for the chosen discrete device
    pub fn new(platform: Arc<P>, device: GpuDevice<P::Device>, firmware_policy: FirmwarePolicy) -> Self {
        Self {
            platform,
            device,
            state: ModuleState::new(),
            firmware_policy,
        }
    }

    /// Platform
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Discrete device
    pub fn device(&self) -> &GpuDevice<P::Device> {
        &self.device
    }

    /// Module state
    pub fn state(&self) -> &ModuleState {
        &self.state
    }

    /// Hold the device's bridge resumed until the guard drops
    pub fn guard(&self) -> PowerDomainGuard<'_, P::RuntimePm> {
        PowerDomainGuard::acquire(self.platform.runtime_pm(), &self.device)
    }

    /// Controller over this context
    pub fn controller(&self) -> PowerController<'_, P> {
        PowerController::new(&self.platform, &self.device, &self.state, self.firmware_policy)
    }

    /// Observe the device's power state
    pub fn read_power_state(&self, guard: &PowerDomainGuard<'_, P::RuntimePm>) -> PowerState {
        oracle::read_power_state(&self.device, guard)
    }
}

impl<P: Platform> core::fmt::Debug for PowerContext<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PowerContext")
            .field("platform", &self.platform.name())
            .field("device", &self.device.address())
            .field("state", &self.state)
            .field("firmware_policy", &self.firmware_policy)
            .finish()
    }
}
