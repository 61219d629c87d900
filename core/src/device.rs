//! # GPU Devices
//!
//! A display-class PCI function that has been resolved to a firmware node
//! and assigned a role.

use alloc::string::String;
use core::fmt;

use dgd_hal::pci::vendor_name;
use dgd_hal::{AcpiHandle, PciAddr, PciDevice};

/// Role of a display device on a dual-GPU machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceRole {
    /// Built-in graphics, always left untouched
    Integrated,
    /// Secondary, higher-power GPU managed by the disabler
    Discrete,
}

impl DeviceRole {
    /// Role implied by a vendor ID
    #[inline]
    pub const fn for_vendor(vendor: u16, integrated_vendor: u16) -> Self {
        if vendor == integrated_vendor {
            Self::Integrated
        } else {
            Self::Discrete
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integrated => "integrated",
            Self::Discrete => "discrete",
        })
    }
}

bitflags::bitflags! {
    /// Facts about a classified device
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceCaps: u8 {
        /// Sits behind a bridge whose power domain must be held for config access
        const BEHIND_BRIDGE = 1 << 0;
        /// Vendor is listed in the module device table
        const KNOWN_VENDOR = 1 << 1;
    }
}

/// Classified display device
#[derive(Debug, Clone)]
pub struct GpuDevice<D: PciDevice> {
    pci: D,
    handle: AcpiHandle,
    role: DeviceRole,
    caps: DeviceCaps,
    firmware_path: Option<String>,
}

impl<D: PciDevice> GpuDevice<D> {
    /// Wrap a PCI record with its resolved firmware node
    pub fn new(
        pci: D,
        handle: AcpiHandle,
        role: DeviceRole,
        caps: DeviceCaps,
        firmware_path: Option<String>,
    ) -> Self {
        Self {
            pci,
            handle,
            role,
            caps,
            firmware_path,
        }
    }

    /// Underlying PCI record
    pub fn pci(&self) -> &D {
        &self.pci
    }

    /// Bus address
    pub fn address(&self) -> PciAddr {
        self.pci.address()
    }

    /// Vendor ID
    pub fn vendor_id(&self) -> u16 {
        self.pci.vendor_id()
    }

    /// Vendor name, for logs
    pub fn vendor_name(&self) -> &'static str {
        vendor_name(self.pci.vendor_id())
    }

    /// Firmware node
    pub fn handle(&self) -> AcpiHandle {
        self.handle
    }

    /// Role
    pub fn role(&self) -> DeviceRole {
        self.role
    }

    /// Capability flags
    pub fn caps(&self) -> DeviceCaps {
        self.caps
    }

    /// Full firmware pathname, if it could be resolved
    pub fn firmware_path(&self) -> Option<&str> {
        self.firmware_path.as_deref()
    }

    /// Upstream bridge
    pub fn bridge(&self) -> Option<PciAddr> {
        self.pci.parent_bridge()
    }

    /// Driver bound right now, read live from the bus
    pub fn bound_driver(&self) -> Option<String> {
        self.pci.bound_driver()
    }
}

impl<D: PciDevice> fmt::Display for GpuDevice<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.address(), f)
    }
}
