//! # Module State
//!
//! What the disabler knows about the discrete device: its power state when
//! the disabler loaded, and its power state now.

use core::fmt;

use spin::{Mutex, MutexGuard, Once};

// =============================================================================
// POWER STATE
// =============================================================================

/// Power state of the discrete device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i8)]
pub enum PowerState {
    /// Not observed yet; never a settled state
    #[default]
    Unknown  = -1,
    /// Powered off (config space reads back all-ones)
    Disabled = 0,
    /// Powered on
    Enabled  = 1,
}

impl PowerState {
    /// Check for a settled state
    #[inline]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "unknown",
            Self::Disabled => "off",
            Self::Enabled => "on",
        })
    }
}

static_assertions::assert_eq_size!(PowerState, u8);

// =============================================================================
// MODULE STATE
// =============================================================================

/// Load-time and current power state of the discrete device
///
/// `load_state` is written once, right after classification. `current_state`
/// starts out `Unknown` and is written only by the power controller, which
/// holds its lock for a whole check-invoke-update sequence.
#[derive(Debug)]
pub struct ModuleState {
    load_state: Once<PowerState>,
    current_state: Mutex<PowerState>,
}

impl ModuleState {
    /// Fresh state: nothing observed
    pub const fn new() -> Self {
        Self {
            load_state: Once::new(),
            current_state: Mutex::new(PowerState::Unknown),
        }
    }

    /// Power state observed at load time, `Unknown` before it is recorded
    pub fn load_state(&self) -> PowerState {
        self.load_state.get().copied().unwrap_or(PowerState::Unknown)
    }

    /// Record the load-time power state
    ///
    /// Only the first call has an effect. Returns the recorded value, which
    /// differs from `state` if it had already been set.
    pub fn record_load_state(&self, state: PowerState) -> PowerState {
        if self.load_state.is_completed() {
            log::warn!(
                target: dgd_hal::LOG_TARGET,
                "load state already recorded, ignoring {}",
                state
            );
        }
        *self.load_state.call_once(|| state)
    }

    /// Last power state set by the controller
    pub fn current_state(&self) -> PowerState {
        *self.current_state.lock()
    }

    /// Exclusive access to `current_state` for the controller
    pub(crate) fn lock_current(&self) -> MutexGuard<'_, PowerState> {
        self.current_state.lock()
    }
}

impl Default for ModuleState {
    fn default() -> Self {
        Self::new()
    }
}
