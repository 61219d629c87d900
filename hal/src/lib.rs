//! # Discrete Graphics Disabler - Platform Interfaces
//!
//! Everything the disabler needs from the host kernel, expressed as traits,
//! plus the identity types and the unified error type shared by the stack.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────────┐
//! │                                   Platform                                   │
//! │  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐  │
//! │  │ PciEnumerator │  │ AcpiEvaluator │  │   RuntimePm   │  │  PM notifier  │  │
//! │  │   (devices,   │  │  (_OFF, _ON,  │  │    (bridge    │  │     (sleep    │  │
//! │  │ config space) │  │   pathnames)  │  │    get/put)   │  │    events)    │  │
//! │  └───────────────┘  └───────────────┘  └───────────────┘  └───────────────┘  │
//! └──────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A real kernel binding implements [`Platform`]; the [`testing`] module
//! provides a simulated one for host tests.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

pub mod acpi;
pub mod error;
pub mod notifier;
pub mod pci;
pub mod platform;
pub mod runtime_pm;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports for convenience
pub use acpi::{AcpiEvaluator, AcpiHandle, AcpiMethod, AcpiStatus};
pub use error::{Error, PciError, Result};
pub use notifier::{NotifyResult, PmEvent, PmNotifier, PmSubscriber, SubscriptionId};
pub use pci::{DeviceMatch, PciDevice, PciEnumerator};
pub use platform::Platform;
pub use runtime_pm::RuntimePm;
pub use types::PciAddr;

/// Log target shared by every crate of the disabler
pub const LOG_TARGET: &str = "discrete_graphic_disabler";
