//! # Discrete Graphics Disabler Module
//!
//! Load/unload lifecycle of the disabler.
//!
//! ## Lifecycle
//!
//! ```text
//!   load ──▶ classify ──▶ guard ──▶ record load state
//!                                        │
//!                     ┌──────────────────┴──────────────────┐
//!                     ▼                                     ▼
//!                 was off                                was on
//!               do nothing                  turn off, register coordinator
//!
//!   unload ──▶ was off: nothing
//!              was on:  guard, turn on unless already on, unregister
//! ```
//!
//! ## Example
//!
//! ```ignore
//! static DISABLER: DisablerModule<KernelPlatform> = DisablerModule::new();
//!
//! fn init_module(platform: Arc<KernelPlatform>) -> i32 {
//!     match DISABLER.init(platform, &DisablerConfig::default()) {
//!         Ok(()) => 0,
//!         Err(e) => e.errno(),
//!     }
//! }
//!
//! fn cleanup_module() {
//!     DISABLER.exit();
//! }
//! ```

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

pub mod config;
pub mod disabler;
pub mod info;
pub mod module;

// Re-exports for convenience
pub use config::DisablerConfig;
pub use disabler::{Disabler, DisablerStatus, Teardown};
pub use info::{ModuleInfo, DEVICE_TABLE, MODULE_INFO};
pub use module::DisablerModule;
