//! # ACPI Firmware Methods
//!
//! The disabler commands power transitions by evaluating the argument-less
//! `_OFF` and `_ON` power-resource methods on the discrete device's ACPI node.

use alloc::string::String;
use core::fmt;

use crate::types::Handle;

// =============================================================================
// HANDLES
// =============================================================================

/// Marker for ACPI namespace nodes
#[derive(Debug)]
pub struct AcpiNodeMarker;

/// Handle to an ACPI namespace node
pub type AcpiHandle = Handle<AcpiNodeMarker>;

// =============================================================================
// METHODS
// =============================================================================

/// Power methods evaluated on the discrete device node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcpiMethod {
    /// `_OFF`: remove power from the device
    Off,
    /// `_ON`: restore power to the device
    On,
}

impl AcpiMethod {
    /// Method name as it appears in the ACPI namespace
    pub const fn name(self) -> &'static str {
        match self {
            Self::Off => "_OFF",
            Self::On => "_ON",
        }
    }
}

impl fmt::Display for AcpiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// ACPICA status code returned by a method evaluation
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct AcpiStatus(u32);

impl AcpiStatus {
    /// Success
    pub const AE_OK: Self = Self(0x0000);
    /// Unspecified failure
    pub const AE_ERROR: Self = Self(0x0001);
    /// Method or object not present in the namespace
    pub const AE_NOT_FOUND: Self = Self(0x0005);

    /// Wrap a raw status code
    #[inline]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Raw status code
    #[inline]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Check for `AE_OK`
    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 == Self::AE_OK.0
    }
}

impl fmt::Debug for AcpiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for AcpiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::AE_OK => f.write_str("AE_OK"),
            Self::AE_ERROR => f.write_str("AE_ERROR"),
            Self::AE_NOT_FOUND => f.write_str("AE_NOT_FOUND"),
            Self(code) => write!(f, "AE_STATUS(0x{:04x})", code),
        }
    }
}

// =============================================================================
// EVALUATOR TRAIT
// =============================================================================

/// Firmware method invoker
pub trait AcpiEvaluator: Send + Sync {
    /// Evaluate `method` on `handle` with an empty argument list
    ///
    /// Evaluation is synchronous and bounded.
    fn evaluate(&self, handle: AcpiHandle, method: AcpiMethod) -> AcpiStatus;

    /// Resolve the full namespace pathname of a node, for logging
    fn full_path(&self, handle: AcpiHandle) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn test_method_names() {
        assert_eq!(AcpiMethod::Off.name(), "_OFF");
        assert_eq!(AcpiMethod::On.name(), "_ON");
        assert_eq!(format!("{}", AcpiMethod::On), "_ON");
    }

    #[test]
    fn test_status() {
        assert!(AcpiStatus::AE_OK.is_ok());
        assert!(!AcpiStatus::AE_ERROR.is_ok());
        assert_eq!(format!("{}", AcpiStatus::AE_NOT_FOUND), "AE_NOT_FOUND");
        assert_eq!(format!("{:?}", AcpiStatus::new(0x1234)), "AE_STATUS(0x1234)");
    }
}
