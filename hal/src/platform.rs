//! # Platform Abstraction
//!
//! Bundles the four collaborators the disabler talks to.

use crate::acpi::AcpiEvaluator;
use crate::notifier::PmNotifier;
use crate::pci::{PciDevice, PciEnumerator};
use crate::runtime_pm::RuntimePm;

/// Platform abstraction trait
///
/// Each host (a kernel binding, the simulated test bus) implements this
/// trait to expose its hardware services.
pub trait Platform: Send + Sync + 'static {
    /// PCI device record type
    type Device: PciDevice;
    /// PCI enumerator type
    type Enumerator: PciEnumerator<Device = Self::Device>;
    /// Firmware method invoker type
    type Firmware: AcpiEvaluator;
    /// Bridge power-domain primitive type
    type RuntimePm: RuntimePm;
    /// PM event source type
    type Notifier: PmNotifier;

    /// Get platform name
    fn name(&self) -> &'static str;

    /// Get PCI enumerator
    fn pci_enumerator(&self) -> &Self::Enumerator;

    /// Get firmware method invoker
    fn firmware(&self) -> &Self::Firmware;

    /// Get bridge power-domain primitive
    fn runtime_pm(&self) -> &Self::RuntimePm;

    /// Get PM event source
    fn pm_notifier(&self) -> &Self::Notifier;
}
