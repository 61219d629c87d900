//! # Disabler Configuration

use dgd_core::{ClassifyPolicy, FirmwarePolicy};
use dgd_hal::pci::PCI_VENDOR_ID_INTEL;
use dgd_hal::{Error, Result};

use crate::info::DEVICE_TABLE;

/// Disabler configuration parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisablerConfig {
    /// Vendor ID of the built-in graphics; every other display vendor is a
    /// discrete candidate
    pub integrated_vendor: u16,
    /// Only accept discrete cards listed in [`DEVICE_TABLE`]
    pub known_vendors_only: bool,
    /// Treatment of failing firmware status codes
    pub firmware_policy: FirmwarePolicy,
}

impl Default for DisablerConfig {
    fn default() -> Self {
        Self {
            integrated_vendor: PCI_VENDOR_ID_INTEL,
            known_vendors_only: false,
            firmware_policy: FirmwarePolicy::Report,
        }
    }
}

impl DisablerConfig {
    /// Record transitions even when firmware reports failure
    pub fn compat() -> Self {
        Self {
            firmware_policy: FirmwarePolicy::Ignore,
            ..Default::default()
        }
    }

    /// Only manage cards from the device table
    pub fn restricted() -> Self {
        Self {
            known_vendors_only: true,
            ..Default::default()
        }
    }

    /// Reject vendor IDs no device can carry
    pub fn validate(&self) -> Result<()> {
        match self.integrated_vendor {
            0x0000 | 0xFFFF => Err(Error::InvalidParameter),
            _ => Ok(()),
        }
    }

    /// Classifier policy for this configuration
    pub fn classify_policy(&self) -> ClassifyPolicy {
        ClassifyPolicy {
            integrated_vendor: self.integrated_vendor,
            known: &DEVICE_TABLE,
            known_only: self.known_vendors_only,
        }
    }
}

static_assertions::assert_impl_all!(DisablerConfig: Copy, Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DisablerConfig::default();
        assert_eq!(config.integrated_vendor, 0x8086);
        assert!(!config.known_vendors_only);
        assert_eq!(config.firmware_policy, FirmwarePolicy::Report);
        let policy = config.classify_policy();
        assert_eq!(policy.integrated_vendor, ClassifyPolicy::default().integrated_vendor);
        assert_eq!(policy.known.len(), DEVICE_TABLE.len());
        assert!(!policy.known_only);
    }

    #[test]
    fn test_named_constructors() {
        assert_eq!(DisablerConfig::compat().firmware_policy, FirmwarePolicy::Ignore);

        let policy = DisablerConfig::restricted().classify_policy();
        assert!(policy.known_only);
    }

    #[test]
    fn test_validate() {
        assert!(DisablerConfig::default().validate().is_ok());

        let bad = DisablerConfig {
            integrated_vendor: 0xFFFF,
            ..Default::default()
        };
        assert_eq!(bad.validate(), Err(Error::InvalidParameter));
    }
}
