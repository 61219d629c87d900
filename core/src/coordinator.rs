//! # Sleep Coordinator
//!
//! Firmware sleep paths expect the discrete device to be powered. The
//! coordinator powers it back on before every suspend or hibernate, and off
//! again after resume. It only acts when the device was powered at load:
//! a device the user left off stays off.
//!
//! ```text
//!   SuspendPrepare / HibernatePrepare      PostSuspend / PostHibernation / PostRestore
//!            current == off                         current == on
//!                  |                                      |
//!                  v                                      v
//!               turn_on                                turn_off
//! ```
//!
//! `RestorePrepare` is inert: `PostHibernation` or `PostRestore` always
//! follows it and performs the transition.

use alloc::sync::Arc;

use dgd_hal::{NotifyResult, Platform, PmEvent, PmSubscriber, Result};

use crate::context::PowerContext;
use crate::controller::Transition;
use crate::state::PowerState;

/// What the coordinator did for one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SleepAction {
    /// Device was off at load; nothing to manage
    Inert,
    /// Current state already suits the event
    Unchanged,
    /// Powered the device on ahead of sleep
    PowerOn(Result<Transition>),
    /// Powered the device off after wake
    PowerOff(Result<Transition>),
    /// Event deliberately not handled
    Deferred,
}

/// PM subscriber keeping the discrete device powered across sleep
pub struct SleepCoordinator<P: Platform> {
    ctx: Arc<PowerContext<P>>,
}

impl<P: Platform> SleepCoordinator<P> {
    /// Create a coordinator over a shared context
    pub fn new(ctx: Arc<PowerContext<P>>) -> Self {
        Self { ctx }
    }

    /// Handle a PM event
    pub fn handle(&self, event: PmEvent) -> SleepAction {
        let state = self.ctx.state();
        if state.load_state() != PowerState::Enabled {
            return SleepAction::Inert;
        }

        if event.is_prepare() {
            if state.current_state() != PowerState::Disabled {
                return SleepAction::Unchanged;
            }
            let guard = self.ctx.guard();
            SleepAction::PowerOn(self.ctx.controller().turn_on(&guard))
        } else if event.is_post() {
            if state.current_state() != PowerState::Enabled {
                return SleepAction::Unchanged;
            }
            let guard = self.ctx.guard();
            SleepAction::PowerOff(self.ctx.controller().turn_off(&guard))
        } else {
            SleepAction::Deferred
        }
    }
}

impl<P: Platform> PmSubscriber for SleepCoordinator<P> {
    fn notify(&self, event: PmEvent) -> NotifyResult {
        log::debug!(target: dgd_hal::LOG_TARGET, "pm event {:?} ({})", event, event.raw());

        match self.handle(event) {
            SleepAction::PowerOn(Err(e)) | SleepAction::PowerOff(Err(e)) => {
                log::error!(target: dgd_hal::LOG_TARGET, "{:?}: {}", event, e);
            }
            action => {
                log::trace!(target: dgd_hal::LOG_TARGET, "{:?}: {:?}", event, action);
            }
        }

        // Never veto a sleep transition
        NotifyResult::Done
    }
}

impl<P: Platform> core::fmt::Debug for SleepCoordinator<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SleepCoordinator").field("ctx", &self.ctx).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::FirmwarePolicy;
    use crate::device::{DeviceCaps, DeviceRole, GpuDevice};
    use dgd_hal::testing::{SimDevice, SimPlatform};
    use dgd_hal::{AcpiHandle, AcpiMethod, AcpiStatus, Error, PciAddr};

    const BRIDGE: PciAddr = PciAddr::new(0, 0, 1, 0);

    fn context(load: PowerState, powered: bool) -> (Arc<SimPlatform>, Arc<PowerContext<SimPlatform>>) {
        let platform = Arc::new(SimPlatform::new());
        let pci = platform.add(
            SimDevice::builder(PciAddr::new(0, 1, 0, 0))
                .vendor(0x10DE, 0x1C8D)
                .class(0x030200)
                .acpi(2, "\\_SB_.PCI0.PEG0.PEGP")
                .bridge(BRIDGE)
                .powered(powered),
        );
        let gpu = GpuDevice::new(pci, AcpiHandle::new(2), DeviceRole::Discrete, DeviceCaps::BEHIND_BRIDGE, None);
        let ctx = Arc::new(PowerContext::new(platform.clone(), gpu, FirmwarePolicy::Report));
        ctx.state().record_load_state(load);
        (platform, ctx)
    }

    /// Context as left by a successful load: device was on, now switched off
    fn loaded() -> (Arc<SimPlatform>, Arc<PowerContext<SimPlatform>>) {
        let (platform, ctx) = context(PowerState::Enabled, true);
        let guard = ctx.guard();
        assert_eq!(ctx.controller().turn_off(&guard), Ok(Transition::Switched));
        drop(guard);
        platform.clear_calls();
        (platform, ctx)
    }

    #[test]
    fn test_suspend_resume_cycle() {
        let (platform, ctx) = loaded();
        let coord = SleepCoordinator::new(ctx.clone());

        assert_eq!(coord.handle(PmEvent::SuspendPrepare), SleepAction::PowerOn(Ok(Transition::Switched)));
        assert_eq!(ctx.state().current_state(), PowerState::Enabled);
        assert_eq!(coord.handle(PmEvent::PostSuspend), SleepAction::PowerOff(Ok(Transition::Switched)));
        assert_eq!(ctx.state().current_state(), PowerState::Disabled);

        assert_eq!(platform.firmware_calls(), [AcpiMethod::On, AcpiMethod::Off]);
        assert!(platform.bridges_idle());
    }

    #[test]
    fn test_hibernate_and_restore_paths() {
        let (platform, ctx) = loaded();
        let coord = SleepCoordinator::new(ctx.clone());

        assert!(matches!(coord.handle(PmEvent::HibernatePrepare), SleepAction::PowerOn(Ok(_))));
        assert!(matches!(coord.handle(PmEvent::PostHibernation), SleepAction::PowerOff(Ok(_))));
        assert!(matches!(coord.handle(PmEvent::HibernatePrepare), SleepAction::PowerOn(Ok(_))));
        assert!(matches!(coord.handle(PmEvent::PostRestore), SleepAction::PowerOff(Ok(_))));

        assert_eq!(
            platform.firmware_calls(),
            [AcpiMethod::On, AcpiMethod::Off, AcpiMethod::On, AcpiMethod::Off]
        );
    }

    #[test]
    fn test_restore_prepare_is_inert() {
        let (platform, ctx) = loaded();
        let coord = SleepCoordinator::new(ctx.clone());

        assert_eq!(coord.handle(PmEvent::RestorePrepare), SleepAction::Deferred);
        assert_eq!(ctx.state().current_state(), PowerState::Disabled);
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_inert_when_off_at_load() {
        let (platform, ctx) = context(PowerState::Disabled, false);
        let coord = SleepCoordinator::new(ctx);

        for raw in 1..=6 {
            let event = PmEvent::from_raw(raw).unwrap();
            assert_eq!(coord.handle(event), SleepAction::Inert);
        }
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_unchanged_when_state_fits() {
        let (platform, ctx) = loaded();
        let coord = SleepCoordinator::new(ctx);

        // already off after wake
        assert_eq!(coord.handle(PmEvent::PostSuspend), SleepAction::Unchanged);
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_firmware_failure_does_not_veto() {
        let (platform, ctx) = loaded();
        platform.set_firmware_status(AcpiStatus::AE_ERROR);
        let coord = SleepCoordinator::new(ctx.clone());

        assert_eq!(
            coord.handle(PmEvent::SuspendPrepare),
            SleepAction::PowerOn(Err(Error::FirmwareCall {
                method: AcpiMethod::On,
                status: AcpiStatus::AE_ERROR,
            }))
        );
        assert_eq!(ctx.state().current_state(), PowerState::Disabled);
        assert_eq!(coord.notify(PmEvent::SuspendPrepare), NotifyResult::Done);
        assert!(platform.bridges_idle());
    }
}
