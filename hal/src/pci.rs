//! # PCI Bus Interface
//!
//! Device records produced by the bus enumerator, and the identity constants
//! the classifier matches against.

use alloc::string::String;
use alloc::vec::Vec;

use crate::acpi::AcpiHandle;
use crate::error::Result;
use crate::types::PciAddr;

// =============================================================================
// CONFIGURATION SPACE
// =============================================================================

/// Offset of the Vendor ID / Device ID dword
pub const PCI_VENDOR_ID: u16 = 0x00;

/// Size of the conventional configuration space
pub const PCI_CFG_SPACE_SIZE: u16 = 0x100;

/// Value read back from a function that does not answer config cycles
pub const PCI_CFG_ALL_ONES: u32 = 0xFFFF_FFFF;

// =============================================================================
// CLASS CODES
// =============================================================================

/// Display controller base class
pub const PCI_BASE_CLASS_DISPLAY: u8 = 0x03;

/// VGA compatible controller (class/subclass)
pub const PCI_CLASS_DISPLAY_VGA: u16 = 0x0300;
/// 3D controller (class/subclass)
pub const PCI_CLASS_DISPLAY_3D: u16 = 0x0302;
/// Other display controller (class/subclass)
pub const PCI_CLASS_DISPLAY_OTHER: u16 = 0x0380;

/// Check whether a 24-bit class code (class, subclass, prog-if) is a display
/// function the disabler cares about
#[inline]
pub const fn is_display_class(class: u32) -> bool {
    matches!(
        (class >> 8) as u16,
        PCI_CLASS_DISPLAY_VGA | PCI_CLASS_DISPLAY_3D | PCI_CLASS_DISPLAY_OTHER
    )
}

// =============================================================================
// VENDOR IDS
// =============================================================================

/// Intel
pub const PCI_VENDOR_ID_INTEL: u16 = 0x8086;
/// NVIDIA
pub const PCI_VENDOR_ID_NVIDIA: u16 = 0x10DE;
/// NVIDIA (SGS Thomson joint venture)
pub const PCI_VENDOR_ID_NVIDIA_SGS: u16 = 0x12D2;
/// ATI / AMD graphics
pub const PCI_VENDOR_ID_ATI: u16 = 0x1002;

/// Human-readable vendor name, for logs
pub const fn vendor_name(vendor: u16) -> &'static str {
    match vendor {
        PCI_VENDOR_ID_INTEL => "Intel",
        PCI_VENDOR_ID_NVIDIA | PCI_VENDOR_ID_NVIDIA_SGS => "NVIDIA",
        PCI_VENDOR_ID_ATI => "ATI",
        _ => "unknown",
    }
}

// =============================================================================
// DEVICE TRAIT
// =============================================================================

/// A device record from the bus enumerator
///
/// Records are cheap handles: cloning one refers to the same hardware.
pub trait PciDevice: Clone + Send + Sync + 'static {
    /// Bus address
    fn address(&self) -> PciAddr;

    /// Vendor ID
    fn vendor_id(&self) -> u16;

    /// Device ID
    fn device_id(&self) -> u16;

    /// 24-bit class code: base class, subclass, programming interface
    fn class(&self) -> u32;

    /// Read a dword from configuration space
    ///
    /// The caller is responsible for keeping the upstream bridge awake.
    fn read_config_dword(&self, offset: u16) -> Result<u32>;

    /// Firmware node backing this device, if the platform describes one
    fn acpi_handle(&self) -> Option<AcpiHandle>;

    /// Immediate upstream bridge, if any
    fn parent_bridge(&self) -> Option<PciAddr>;

    /// Name of the driver currently bound to the device
    ///
    /// Read live on every call; never cached.
    fn bound_driver(&self) -> Option<String>;
}

/// Bus enumerator
pub trait PciEnumerator: Send + Sync {
    /// Device record type
    type Device: PciDevice;

    /// All present devices, in bus order
    fn devices(&self) -> Vec<Self::Device>;
}

// =============================================================================
// DEVICE MATCHING
// =============================================================================

/// Device table entry: vendor plus masked class match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceMatch {
    /// Vendor ID, or `None` for any vendor
    pub vendor: Option<u16>,
    /// Device ID, or `None` for any device
    pub device: Option<u16>,
    /// Class code to compare after masking
    pub class: u32,
    /// Mask applied to both sides of the class comparison
    pub class_mask: u32,
}

impl DeviceMatch {
    /// Any device of `vendor` whose base class is display
    pub const fn vendor_display(vendor: u16) -> Self {
        Self {
            vendor: Some(vendor),
            device: None,
            class: (PCI_BASE_CLASS_DISPLAY as u32) << 16,
            class_mask: 0xFF << 16,
        }
    }

    /// Exact vendor/device pair, any class
    pub const fn vendor_device(vendor: u16, device: u16) -> Self {
        Self {
            vendor: Some(vendor),
            device: Some(device),
            class: 0,
            class_mask: 0,
        }
    }

    /// Check a device against this entry
    pub fn matches<D: PciDevice>(&self, dev: &D) -> bool {
        self.vendor.map_or(true, |v| v == dev.vendor_id())
            && self.device.map_or(true, |d| d == dev.device_id())
            && (dev.class() & self.class_mask) == (self.class & self.class_mask)
    }
}
