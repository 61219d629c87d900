//! # Disabler Lifecycle
//!
//! [`Disabler::load`] classifies the bus, records the discrete card's
//! load-time power state and, if the card was on, switches it off and
//! subscribes to sleep events. [`Disabler::unload`] puts the card back the
//! way it was found. Dropping a loaded disabler unloads it.

use alloc::sync::Arc;
use core::fmt;

use dgd_core::{find_discrete, DeviceCaps, PowerContext, PowerState, SleepCoordinator, Transition};
use dgd_hal::{PciAddr, Platform, PmNotifier, Result, SubscriptionId};

use crate::config::DisablerConfig;
use crate::info::MODULE_INFO;

// =============================================================================
// OUTCOMES
// =============================================================================

/// What unloading did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Teardown {
    /// Card was off at load; left untouched
    NothingToRestore,
    /// Card was already back on
    AlreadyEnabled,
    /// Card was switched back on
    Restored(Result<Transition>),
}

/// Diagnostic snapshot of a loaded disabler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisablerStatus {
    /// Discrete card address
    pub device: PciAddr,
    /// Discrete card vendor ID
    pub vendor: u16,
    /// Discrete card vendor name
    pub vendor_name: &'static str,
    /// Classification facts about the card
    pub caps: DeviceCaps,
    /// Power state when the disabler loaded
    pub load_state: PowerState,
    /// Power state as last set by the disabler
    pub current_state: PowerState,
    /// Whether the sleep coordinator is subscribed
    pub registered: bool,
}

impl fmt::Display for DisablerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}{}{}): load {}, current {}{}",
            self.device,
            self.vendor_name,
            if self.caps.contains(DeviceCaps::KNOWN_VENDOR) { ", listed" } else { "" },
            if self.caps.contains(DeviceCaps::BEHIND_BRIDGE) { ", behind bridge" } else { "" },
            self.load_state,
            self.current_state,
            if self.registered { ", sleep hooks active" } else { "" }
        )
    }
}

// =============================================================================
// DISABLER
// =============================================================================

/// A loaded disabler
pub struct Disabler<P: Platform> {
    ctx: Arc<PowerContext<P>>,
    subscription: Option<SubscriptionId>,
    torn_down: bool,
}

impl<P: Platform> Disabler<P> {
    /// Load the disabler on `platform`
    ///
    /// Fails with `Error::NoDiscreteDevice` when the bus has no usable
    /// discrete card; nothing is registered in that case. A refused or
    /// failing switch-off is logged and does not fail the load.
    pub fn load(platform: Arc<P>, config: &DisablerConfig) -> Result<Self> {
        config.validate()?;

        log::info!(
            target: dgd_hal::LOG_TARGET,
            "{} version {}",
            MODULE_INFO.name,
            MODULE_INFO.version
        );

        let device = find_discrete(&*platform, &config.classify_policy())?;
        let ctx = Arc::new(PowerContext::new(platform, device, config.firmware_policy));

        let subscription = {
            let guard = ctx.guard();
            let load_state = ctx.state().record_load_state(ctx.read_power_state(&guard));

            if load_state == PowerState::Disabled {
                log::info!(
                    target: dgd_hal::LOG_TARGET,
                    "Discrete card {} is off. Do nothing.",
                    ctx.device()
                );
                None
            } else {
                if let Err(e) = ctx.controller().turn_off(&guard) {
                    log::error!(target: dgd_hal::LOG_TARGET, "initial switch-off failed: {}", e);
                }
                let coordinator = Arc::new(SleepCoordinator::new(ctx.clone()));
                Some(ctx.platform().pm_notifier().register(coordinator))
            }
        };

        let disabler = Self {
            ctx,
            subscription,
            torn_down: false,
        };
        log::info!(target: dgd_hal::LOG_TARGET, "{}", disabler.status());
        Ok(disabler)
    }

    /// Unload, restoring the card's load-time power state
    pub fn unload(mut self) -> Teardown {
        self.teardown()
    }

    /// Shared context
    pub fn context(&self) -> &Arc<PowerContext<P>> {
        &self.ctx
    }

    /// Diagnostic snapshot
    pub fn status(&self) -> DisablerStatus {
        let device = self.ctx.device();
        let state = self.ctx.state();
        DisablerStatus {
            device: device.address(),
            vendor: device.vendor_id(),
            vendor_name: device.vendor_name(),
            caps: device.caps(),
            load_state: state.load_state(),
            current_state: state.current_state(),
            registered: self.subscription.is_some(),
        }
    }

    fn teardown(&mut self) -> Teardown {
        self.torn_down = true;

        // Unsubscribe first so no wake event can switch the card off again
        if let Some(id) = self.subscription.take() {
            self.ctx.platform().pm_notifier().unregister(id);
        }

        let state = self.ctx.state();

        let outcome = if state.load_state() == PowerState::Disabled {
            Teardown::NothingToRestore
        } else {
            let guard = self.ctx.guard();
            if state.current_state() == PowerState::Enabled {
                log::info!(
                    target: dgd_hal::LOG_TARGET,
                    "Discrete card {} has already been enabled",
                    self.ctx.device()
                );
                Teardown::AlreadyEnabled
            } else {
                let result = self.ctx.controller().turn_on(&guard);
                if let Err(e) = &result {
                    log::error!(target: dgd_hal::LOG_TARGET, "restoring power failed: {}", e);
                }
                Teardown::Restored(result)
            }
        };

        outcome
    }
}

impl<P: Platform> Drop for Disabler<P> {
    fn drop(&mut self) {
        if !self.torn_down {
            self.teardown();
        }
    }
}

impl<P: Platform> fmt::Debug for Disabler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disabler")
            .field("ctx", &self.ctx)
            .field("subscription", &self.subscription)
            .finish()
    }
}
