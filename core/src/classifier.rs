//! # Device Classifier
//!
//! Walks the PCI bus once and picks the integrated and discrete display
//! devices. Only devices with a firmware node qualify, since power control
//! goes through firmware methods. The first match of each role wins.

use dgd_hal::pci::{is_display_class, DeviceMatch};
use dgd_hal::{AcpiEvaluator, Error, PciDevice, PciEnumerator, Platform, Result};

use crate::device::{DeviceCaps, DeviceRole, GpuDevice};

/// Classification policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyPolicy {
    /// Vendor ID of the built-in graphics
    pub integrated_vendor: u16,
    /// Cards marked [`DeviceCaps::KNOWN_VENDOR`] when matched
    pub known: &'static [DeviceMatch],
    /// Skip discrete candidates that match nothing in `known`
    pub known_only: bool,
}

impl Default for ClassifyPolicy {
    fn default() -> Self {
        Self {
            integrated_vendor: dgd_hal::pci::PCI_VENDOR_ID_INTEL,
            known: &[],
            known_only: false,
        }
    }
}

/// Result of a bus walk
#[derive(Debug)]
pub struct Classification<D: PciDevice> {
    /// First integrated display device with a firmware node
    pub integrated: Option<GpuDevice<D>>,
    /// First discrete display device with a firmware node
    pub discrete: Option<GpuDevice<D>>,
}

/// Walk the bus and assign roles
pub fn classify<P: Platform>(platform: &P, policy: &ClassifyPolicy) -> Classification<P::Device> {
    let mut integrated = None;
    let mut discrete = None;

    for pci in platform.pci_enumerator().devices() {
        if integrated.is_some() && discrete.is_some() {
            break;
        }
        if !is_display_class(pci.class()) {
            continue;
        }

        let Some(handle) = pci.acpi_handle() else {
            log::warn!(
                target: dgd_hal::LOG_TARGET,
                "can not find ACPI handle for VGA device {}",
                pci.address()
            );
            continue;
        };

        let role = DeviceRole::for_vendor(pci.vendor_id(), policy.integrated_vendor);
        let slot = match role {
            DeviceRole::Integrated => &mut integrated,
            DeviceRole::Discrete => &mut discrete,
        };
        if slot.is_some() {
            log::debug!(
                target: dgd_hal::LOG_TARGET,
                "ignoring extra {} VGA device {}",
                role,
                pci.address()
            );
            continue;
        }

        let mut caps = DeviceCaps::empty();
        if pci.parent_bridge().is_some() {
            caps |= DeviceCaps::BEHIND_BRIDGE;
        }
        if policy.known.iter().any(|m| m.matches(&pci)) {
            caps |= DeviceCaps::KNOWN_VENDOR;
        } else if policy.known_only && role == DeviceRole::Discrete {
            log::warn!(
                target: dgd_hal::LOG_TARGET,
                "VGA device {} ({:04x}:{:04x}) is not a supported discrete card",
                pci.address(),
                pci.vendor_id(),
                pci.device_id()
            );
            continue;
        }

        let path = platform.firmware().full_path(handle);
        log::info!(
            target: dgd_hal::LOG_TARGET,
            "Found {} VGA device {}: {}",
            role,
            pci.address(),
            path.as_deref().unwrap_or("<unknown>")
        );

        *slot = Some(GpuDevice::new(pci, handle, role, caps, path));
    }

    Classification { integrated, discrete }
}

/// Walk the bus and return the discrete device
pub fn find_discrete<P: Platform>(platform: &P, policy: &ClassifyPolicy) -> Result<GpuDevice<P::Device>> {
    classify(platform, policy).discrete.ok_or_else(|| {
        log::error!(target: dgd_hal::LOG_TARGET, "No discrete VGA device found!");
        Error::NoDiscreteDevice
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgd_hal::pci::{PCI_VENDOR_ID_ATI, PCI_VENDOR_ID_INTEL, PCI_VENDOR_ID_NVIDIA};
    use dgd_hal::testing::{SimDevice, SimPlatform};
    use dgd_hal::PciAddr;

    const BRIDGE: PciAddr = PciAddr::new(0, 0, 1, 0);

    static NVIDIA_ONLY: [DeviceMatch; 1] = [DeviceMatch::vendor_display(PCI_VENDOR_ID_NVIDIA)];

    fn intel(platform: &SimPlatform) -> SimDevice {
        platform.add(
            SimDevice::builder(PciAddr::new(0, 0, 2, 0))
                .vendor(PCI_VENDOR_ID_INTEL, 0x3E9B)
                .class(0x030000)
                .acpi(1, "\\_SB_.PCI0.GFX0"),
        )
    }

    fn nvidia(platform: &SimPlatform, bus: u8, acpi: Option<u64>) -> SimDevice {
        let mut builder = SimDevice::builder(PciAddr::new(0, bus, 0, 0))
            .vendor(PCI_VENDOR_ID_NVIDIA, 0x1C8D)
            .class(0x030200)
            .bridge(BRIDGE);
        if let Some(id) = acpi {
            builder = builder.acpi(id, "\\_SB_.PCI0.PEG0.PEGP");
        }
        platform.add(builder)
    }

    #[test]
    fn test_classify_hybrid_laptop() {
        let platform = SimPlatform::new();
        intel(&platform);
        nvidia(&platform, 1, Some(2));

        let found = classify(&platform, &ClassifyPolicy::default());
        let igd = found.integrated.unwrap();
        let dis = found.discrete.unwrap();

        assert_eq!(igd.role(), DeviceRole::Integrated);
        assert_eq!(igd.address(), PciAddr::new(0, 0, 2, 0));
        assert_eq!(dis.role(), DeviceRole::Discrete);
        assert_eq!(dis.vendor_id(), PCI_VENDOR_ID_NVIDIA);
        assert_eq!(dis.firmware_path(), Some("\\_SB_.PCI0.PEG0.PEGP"));
        assert!(dis.caps().contains(DeviceCaps::BEHIND_BRIDGE));
        assert!(!dis.caps().contains(DeviceCaps::KNOWN_VENDOR));
    }

    #[test]
    fn test_intel_never_discrete() {
        let platform = SimPlatform::new();
        intel(&platform);

        let found = classify(&platform, &ClassifyPolicy::default());
        assert!(found.integrated.is_some());
        assert!(found.discrete.is_none());
        assert_eq!(
            find_discrete(&platform, &ClassifyPolicy::default()).unwrap_err(),
            Error::NoDiscreteDevice
        );
    }

    #[test]
    fn test_device_without_handle_skipped() {
        let platform = SimPlatform::new();
        nvidia(&platform, 1, None);
        let second = nvidia(&platform, 2, Some(3));

        let dis = find_discrete(&platform, &ClassifyPolicy::default()).unwrap();
        assert_eq!(dis.address(), second.address());
    }

    #[test]
    fn test_first_discrete_wins() {
        let platform = SimPlatform::new();
        let first = nvidia(&platform, 1, Some(2));
        platform.add(
            SimDevice::builder(PciAddr::new(0, 2, 0, 0))
                .vendor(PCI_VENDOR_ID_ATI, 0x6900)
                .class(0x030000)
                .acpi(3, "\\_SB_.PCI0.PEG1.PEGP"),
        );

        let dis = find_discrete(&platform, &ClassifyPolicy::default()).unwrap();
        assert_eq!(dis.address(), first.address());
    }

    #[test]
    fn test_non_display_ignored() {
        let platform = SimPlatform::new();
        platform.add(
            SimDevice::builder(PciAddr::new(0, 3, 0, 0))
                .vendor(PCI_VENDOR_ID_NVIDIA, 0x10F1)
                .class(0x040300)
                .acpi(4, "\\_SB_.PCI0.PEG0.HDAU"),
        );

        assert!(classify(&platform, &ClassifyPolicy::default()).discrete.is_none());
    }

    #[test]
    fn test_configurable_integrated_vendor() {
        let platform = SimPlatform::new();
        intel(&platform);
        nvidia(&platform, 1, Some(2));

        let policy = ClassifyPolicy {
            integrated_vendor: PCI_VENDOR_ID_NVIDIA,
            ..Default::default()
        };
        let dis = find_discrete(&platform, &policy).unwrap();
        assert_eq!(dis.vendor_id(), PCI_VENDOR_ID_INTEL);
    }

    #[test]
    fn test_allowed_table_filters_discrete() {
        let platform = SimPlatform::new();
        platform.add(
            SimDevice::builder(PciAddr::new(0, 1, 0, 0))
                .vendor(PCI_VENDOR_ID_ATI, 0x6900)
                .class(0x030000)
                .acpi(2, "\\_SB_.PCI0.PEG0.PEGP"),
        );
        nvidia(&platform, 2, Some(3));

        let policy = ClassifyPolicy {
            known: &NVIDIA_ONLY,
            known_only: true,
            ..Default::default()
        };
        let dis = find_discrete(&platform, &policy).unwrap();
        assert_eq!(dis.vendor_id(), PCI_VENDOR_ID_NVIDIA);
        assert!(dis.caps().contains(DeviceCaps::KNOWN_VENDOR));
    }

    #[test]
    fn test_known_table_marks_without_filtering() {
        let platform = SimPlatform::new();
        let ati = platform.add(
            SimDevice::builder(PciAddr::new(0, 1, 0, 0))
                .vendor(PCI_VENDOR_ID_ATI, 0x6900)
                .class(0x030000)
                .acpi(2, "\\_SB_.PCI0.PEG0.PEGP"),
        );

        let policy = ClassifyPolicy {
            known: &NVIDIA_ONLY,
            ..Default::default()
        };
        let dis = find_discrete(&platform, &policy).unwrap();
        assert_eq!(dis.address(), ati.address());
        assert!(!dis.caps().contains(DeviceCaps::KNOWN_VENDOR));
    }
}
