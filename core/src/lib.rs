//! # Discrete Graphics Disabler Core
//!
//! Decides which display device is the discrete GPU, infers its power state
//! and drives it on or off through firmware methods, including the extra
//! transitions needed around system sleep.
//!
//! ## Components
//!
//! ```text
//!            ┌──────────────────┐
//!            │ SleepCoordinator │  PM events (prepare / post)
//!            └────────┬─────────┘
//!                     │
//!            ┌────────▼─────────┐      ┌──────────────────┐
//!            │ PowerController  │─────▶│  ACPI _OFF / _ON │
//!            └────────┬─────────┘      └──────────────────┘
//!                     │ under PowerDomainGuard
//!            ┌────────▼─────────┐
//!            │   Power oracle   │  config dword 0 == all-ones ?
//!            └────────┬─────────┘
//!                     │
//!            ┌────────▼─────────┐
//!            │    Classifier    │  display class, Intel vs other
//!            └──────────────────┘
//! ```
//!
//! All mutable state lives in a [`PowerContext`], shared by `Arc` between
//! the lifecycle owner and the registered coordinator.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

pub mod classifier;
pub mod context;
pub mod controller;
pub mod coordinator;
pub mod device;
pub mod guard;
pub mod oracle;
pub mod state;

// Re-exports for convenience
pub use classifier::{classify, find_discrete, Classification, ClassifyPolicy};
pub use context::PowerContext;
pub use controller::{FirmwarePolicy, PowerController, Transition};
pub use coordinator::{SleepAction, SleepCoordinator};
pub use device::{DeviceCaps, DeviceRole, GpuDevice};
pub use guard::PowerDomainGuard;
pub use oracle::{power_state_from_word, read_power_state};
pub use state::{ModuleState, PowerState};
