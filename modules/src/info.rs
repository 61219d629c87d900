//! Module metadata and device table.

use dgd_hal::pci::{PCI_VENDOR_ID_ATI, PCI_VENDOR_ID_NVIDIA, PCI_VENDOR_ID_NVIDIA_SGS};
use dgd_hal::DeviceMatch;

/// Load-time metadata
#[derive(Debug, Clone, Copy)]
pub struct ModuleInfo {
    /// Module name, also the log target
    pub name: &'static str,
    /// Version string
    pub version: &'static str,
    /// Author
    pub author: &'static str,
    /// One-line description
    pub description: &'static str,
    /// License
    pub license: &'static str,
    /// Devices the module declares interest in
    pub device_table: &'static [DeviceMatch],
}

/// Discrete cards the module declares support for
pub static DEVICE_TABLE: [DeviceMatch; 3] = [
    DeviceMatch::vendor_display(PCI_VENDOR_ID_NVIDIA),
    DeviceMatch::vendor_display(PCI_VENDOR_ID_NVIDIA_SGS),
    DeviceMatch::vendor_display(PCI_VENDOR_ID_ATI),
];

/// Metadata of this module
pub static MODULE_INFO: ModuleInfo = ModuleInfo {
    name: dgd_hal::LOG_TARGET,
    version: "0.2",
    author: "Discrete Graphics Disabler Contributors",
    description: "Disable the discrete graphics card of a dual-GPU machine",
    license: "GPL",
    device_table: &DEVICE_TABLE,
};
