//! # Error Handling
//!
//! Unified error type for the disabler stack.
//!
//! - Errors are typed and categorized
//! - No panics in hardware control paths
//! - Errors are `no_std` compatible
//!
//! Most failures in this system are reported through logging only; the error
//! type exists for the few places where a caller can act on the outcome
//! (module load, explicit firmware failures).

use core::fmt;

use crate::acpi::{AcpiMethod, AcpiStatus};

// =============================================================================
// RESULT TYPE
// =============================================================================

/// Disabler Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// Disabler unified error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// No discrete display device with a firmware node was found
    NoDiscreteDevice,
    /// PCI configuration error
    PciError(PciError),
    /// A firmware power method returned a failure status
    FirmwareCall {
        /// Method that was evaluated
        method: AcpiMethod,
        /// Status reported by the firmware
        status: AcpiStatus,
    },
    /// The disabler is already loaded on this platform
    AlreadyLoaded,
    /// Invalid parameter provided
    InvalidParameter,
}

impl Error {
    /// Negative errno equivalent, for hosts that report load failures that way
    pub const fn errno(&self) -> i32 {
        match self {
            Self::NoDiscreteDevice => -19,   // ENODEV
            Self::PciError(_) => -5,         // EIO
            Self::FirmwareCall { .. } => -5, // EIO
            Self::AlreadyLoaded => -16,      // EBUSY
            Self::InvalidParameter => -22,   // EINVAL
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDiscreteDevice => write!(f, "no discrete VGA device found"),
            Self::PciError(e) => write!(f, "PCI error: {}", e),
            Self::FirmwareCall { method, status } => {
                write!(f, "firmware method {} failed: {}", method, status)
            }
            Self::AlreadyLoaded => write!(f, "already loaded"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
        }
    }
}

// =============================================================================
// SUB-ERROR TYPES
// =============================================================================

/// PCI-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PciError {
    /// Configuration space access failed
    ConfigAccessFailed,
    /// Offset outside the configuration space or misaligned
    BadOffset(u16),
}

impl fmt::Display for PciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigAccessFailed => write!(f, "config space access failed"),
            Self::BadOffset(off) => write!(f, "bad config offset 0x{:x}", off),
        }
    }
}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

impl From<PciError> for Error {
    fn from(e: PciError) -> Self {
        Error::PciError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(Error::NoDiscreteDevice.errno(), -19);
        assert_eq!(Error::AlreadyLoaded.errno(), -16);
        assert_eq!(Error::from(PciError::ConfigAccessFailed).errno(), -5);
    }

    #[test]
    fn test_display() {
        let err = Error::FirmwareCall {
            method: AcpiMethod::Off,
            status: AcpiStatus::new(0x30),
        };
        assert_eq!(err.to_string(), "firmware method _OFF failed: AE_STATUS(0x0030)");
        assert_eq!(
            Error::from(PciError::BadOffset(0x102)).to_string(),
            "PCI error: bad config offset 0x102"
        );
    }
}
