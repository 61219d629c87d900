//! # Simulated Platform
//!
//! An in-memory PCI bus with ACPI power methods, bridge runtime PM and a PM
//! notifier, for host-side tests.
//!
//! The simulation follows real hardware closely enough to catch ordering
//! mistakes:
//!
//! - `_OFF` cuts power: configuration reads return all-ones afterwards
//! - `_ON` restores power
//! - a device behind a suspended bridge also reads back all-ones
//! - every firmware evaluation and bridge get/put is recorded in order

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use crate::acpi::{AcpiEvaluator, AcpiHandle, AcpiMethod, AcpiStatus};
use crate::error::{PciError, Result};
use crate::notifier::{NotifyResult, PmEvent, PmNotifier, PmSubscriber, SubscriptionId};
use crate::pci::{PciDevice, PciEnumerator, PCI_CFG_ALL_ONES, PCI_CFG_SPACE_SIZE};
use crate::platform::Platform;
use crate::runtime_pm::RuntimePm;
use crate::types::PciAddr;

// =============================================================================
// RECORDED CALLS
// =============================================================================

/// A platform operation observed by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCall {
    /// Firmware method evaluated on a node
    Evaluate(AcpiHandle, AcpiMethod),
    /// Bridge usage reference taken
    BridgeGet(PciAddr),
    /// Bridge usage reference dropped
    BridgePut(PciAddr),
    /// Configuration dword read
    ConfigRead(PciAddr, u16),
}

/// State shared by the platform and every device on it
#[derive(Debug, Default)]
struct SimBus {
    bridge_usage: Mutex<BTreeMap<PciAddr, u32>>,
    unbalanced_puts: Mutex<u32>,
    calls: Mutex<Vec<SimCall>>,
}

impl SimBus {
    fn record(&self, call: SimCall) {
        self.calls.lock().push(call);
    }

    fn bridge_awake(&self, bridge: PciAddr) -> bool {
        self.bridge_usage.lock().get(&bridge).copied().unwrap_or(0) > 0
    }
}

// =============================================================================
// DEVICE
// =============================================================================

#[derive(Debug)]
struct SimDeviceState {
    powered: bool,
    driver: Option<String>,
    config_error: bool,
}

#[derive(Debug)]
struct SimDeviceInner {
    addr: PciAddr,
    vendor: u16,
    device: u16,
    class: u32,
    acpi: Option<(AcpiHandle, String)>,
    bridge: Option<PciAddr>,
    bus: Option<Arc<SimBus>>,
    state: Mutex<SimDeviceState>,
}

/// Simulated PCI function
#[derive(Debug, Clone)]
pub struct SimDevice {
    inner: Arc<SimDeviceInner>,
}

impl SimDevice {
    /// Start describing a device at `addr`
    pub fn builder(addr: PciAddr) -> SimDeviceBuilder {
        SimDeviceBuilder {
            addr,
            vendor: 0xFFFF,
            device: 0xFFFF,
            class: 0,
            acpi: None,
            bridge: None,
            powered: true,
        }
    }

    /// Whether the device currently has power
    pub fn is_powered(&self) -> bool {
        self.inner.state.lock().powered
    }

    /// Force the power state, bypassing firmware
    pub fn set_powered(&self, powered: bool) {
        self.inner.state.lock().powered = powered;
    }

    /// Bind or unbind a driver
    pub fn set_driver(&self, driver: Option<&str>) {
        self.inner.state.lock().driver = driver.map(String::from);
    }

    /// Make configuration reads fail at the bus level
    pub fn set_config_error(&self, failing: bool) {
        self.inner.state.lock().config_error = failing;
    }

    fn identity_word(&self) -> u32 {
        (u32::from(self.inner.device) << 16) | u32::from(self.inner.vendor)
    }
}

impl PciDevice for SimDevice {
    fn address(&self) -> PciAddr {
        self.inner.addr
    }

    fn vendor_id(&self) -> u16 {
        self.inner.vendor
    }

    fn device_id(&self) -> u16 {
        self.inner.device
    }

    fn class(&self) -> u32 {
        self.inner.class
    }

    fn read_config_dword(&self, offset: u16) -> Result<u32> {
        if offset >= PCI_CFG_SPACE_SIZE || offset % 4 != 0 {
            return Err(PciError::BadOffset(offset).into());
        }

        if let Some(bus) = &self.inner.bus {
            bus.record(SimCall::ConfigRead(self.inner.addr, offset));
        }

        let state = self.inner.state.lock();
        if state.config_error {
            return Err(PciError::ConfigAccessFailed.into());
        }

        let bridge_awake = match (&self.inner.bus, self.inner.bridge) {
            (Some(bus), Some(bridge)) => bus.bridge_awake(bridge),
            _ => true,
        };

        if !state.powered || !bridge_awake {
            return Ok(PCI_CFG_ALL_ONES);
        }

        Ok(if offset == 0 { self.identity_word() } else { 0 })
    }

    fn acpi_handle(&self) -> Option<AcpiHandle> {
        self.inner.acpi.as_ref().map(|(handle, _)| *handle)
    }

    fn parent_bridge(&self) -> Option<PciAddr> {
        self.inner.bridge
    }

    fn bound_driver(&self) -> Option<String> {
        self.inner.state.lock().driver.clone()
    }
}

/// Builder for [`SimDevice`]
#[derive(Debug)]
pub struct SimDeviceBuilder {
    addr: PciAddr,
    vendor: u16,
    device: u16,
    class: u32,
    acpi: Option<(AcpiHandle, String)>,
    bridge: Option<PciAddr>,
    powered: bool,
}

impl SimDeviceBuilder {
    /// Vendor and device IDs
    pub fn vendor(mut self, vendor: u16, device: u16) -> Self {
        self.vendor = vendor;
        self.device = device;
        self
    }

    /// 24-bit class code
    pub fn class(mut self, class: u32) -> Self {
        self.class = class;
        self
    }

    /// Attach a firmware node
    pub fn acpi(mut self, id: u64, path: &str) -> Self {
        self.acpi = Some((AcpiHandle::new(id), String::from(path)));
        self
    }

    /// Place the device behind a bridge
    pub fn bridge(mut self, bridge: PciAddr) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Initial power state
    pub fn powered(mut self, powered: bool) -> Self {
        self.powered = powered;
        self
    }

    /// Build a device that is not attached to any platform
    pub fn build(self) -> SimDevice {
        self.build_on(None)
    }

    fn build_on(self, bus: Option<Arc<SimBus>>) -> SimDevice {
        SimDevice {
            inner: Arc::new(SimDeviceInner {
                addr: self.addr,
                vendor: self.vendor,
                device: self.device,
                class: self.class,
                acpi: self.acpi,
                bridge: self.bridge,
                bus,
                state: Mutex::new(SimDeviceState {
                    powered: self.powered,
                    driver: None,
                    config_error: false,
                }),
            }),
        }
    }
}

// =============================================================================
// PLATFORM
// =============================================================================

/// Simulated platform
pub struct SimPlatform {
    bus: Arc<SimBus>,
    devices: Mutex<Vec<SimDevice>>,
    firmware_status: Mutex<AcpiStatus>,
    subscribers: Mutex<Vec<(SubscriptionId, Arc<dyn PmSubscriber>)>>,
}

impl core::fmt::Debug for SimPlatform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimPlatform")
            .field("devices", &self.devices.lock().len())
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}

impl SimPlatform {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            bus: Arc::new(SimBus::default()),
            devices: Mutex::new(Vec::new()),
            firmware_status: Mutex::new(AcpiStatus::AE_OK),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Plug a device into the bus; enumeration order is insertion order
    pub fn add(&self, builder: SimDeviceBuilder) -> SimDevice {
        let dev = builder.build_on(Some(self.bus.clone()));
        self.devices.lock().push(dev.clone());
        dev
    }

    /// Status returned by subsequent firmware evaluations
    ///
    /// A failing status leaves the device's power untouched.
    pub fn set_firmware_status(&self, status: AcpiStatus) {
        *self.firmware_status.lock() = status;
    }

    /// Deliver a PM event to every subscriber, in registration order
    pub fn deliver(&self, event: PmEvent) -> Vec<NotifyResult> {
        // Snapshot so subscribers can (un)register from their callback
        let subscribers: Vec<_> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, sub)| sub.clone())
            .collect();
        subscribers.iter().map(|sub| sub.notify(event)).collect()
    }

    /// Number of registered PM subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Every recorded platform call, oldest first
    pub fn calls(&self) -> Vec<SimCall> {
        self.bus.calls.lock().clone()
    }

    /// Firmware methods evaluated so far, oldest first
    pub fn firmware_calls(&self) -> Vec<AcpiMethod> {
        self.bus
            .calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SimCall::Evaluate(_, method) => Some(*method),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.bus.calls.lock().clear();
    }

    /// Current usage count of a bridge
    pub fn bridge_usage(&self, bridge: PciAddr) -> u32 {
        self.bus.bridge_usage.lock().get(&bridge).copied().unwrap_or(0)
    }

    /// Number of `put_sync` calls that found a zero usage count
    pub fn unbalanced_puts(&self) -> u32 {
        *self.bus.unbalanced_puts.lock()
    }

    /// Whether every bridge reference taken has been dropped
    pub fn bridges_idle(&self) -> bool {
        self.bus.bridge_usage.lock().values().all(|&n| n == 0) && self.unbalanced_puts() == 0
    }
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PciEnumerator for SimPlatform {
    type Device = SimDevice;

    fn devices(&self) -> Vec<SimDevice> {
        self.devices.lock().clone()
    }
}

impl AcpiEvaluator for SimPlatform {
    fn evaluate(&self, handle: AcpiHandle, method: AcpiMethod) -> AcpiStatus {
        self.bus.record(SimCall::Evaluate(handle, method));

        let status = *self.firmware_status.lock();
        if !status.is_ok() {
            return status;
        }

        let devices = self.devices.lock();
        let Some(dev) = devices.iter().find(|d| d.acpi_handle() == Some(handle)) else {
            return AcpiStatus::AE_NOT_FOUND;
        };
        dev.set_powered(method == AcpiMethod::On);
        AcpiStatus::AE_OK
    }

    fn full_path(&self, handle: AcpiHandle) -> Option<String> {
        self.devices.lock().iter().find_map(|d| match &d.inner.acpi {
            Some((h, path)) if *h == handle => Some(path.clone()),
            _ => None,
        })
    }
}

impl RuntimePm for SimPlatform {
    fn get_sync(&self, bridge: PciAddr) {
        self.bus.record(SimCall::BridgeGet(bridge));
        *self.bus.bridge_usage.lock().entry(bridge).or_insert(0) += 1;
    }

    fn put_sync(&self, bridge: PciAddr) {
        self.bus.record(SimCall::BridgePut(bridge));
        let mut usage = self.bus.bridge_usage.lock();
        match usage.get_mut(&bridge) {
            Some(count) if *count > 0 => *count -= 1,
            _ => {
                log::warn!(target: crate::LOG_TARGET, "unbalanced put on bridge {}", bridge);
                *self.bus.unbalanced_puts.lock() += 1;
            }
        }
    }
}

impl PmNotifier for SimPlatform {
    fn register(&self, subscriber: Arc<dyn PmSubscriber>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.subscribers.lock().push((id, subscriber));
        id
    }

    fn unregister(&self, id: SubscriptionId) {
        self.subscribers.lock().retain(|(sid, _)| *sid != id);
    }
}

impl Platform for SimPlatform {
    type Device = SimDevice;
    type Enumerator = Self;
    type Firmware = Self;
    type RuntimePm = Self;
    type Notifier = Self;

    fn name(&self) -> &'static str {
        "sim"
    }

    fn pci_enumerator(&self) -> &Self {
        self
    }

    fn firmware(&self) -> &Self {
        self
    }

    fn runtime_pm(&self) -> &Self {
        self
    }

    fn pm_notifier(&self) -> &Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pci::PCI_VENDOR_ID_NVIDIA;

    const BRIDGE: PciAddr = PciAddr::new(0, 0, 1, 0);

    fn nvidia(platform: &SimPlatform) -> SimDevice {
        platform.add(
            SimDevice::builder(PciAddr::new(0, 1, 0, 0))
                .vendor(PCI_VENDOR_ID_NVIDIA, 0x1C8D)
                .class(0x030200)
                .acpi(2, "\\_SB_.PCI0.PEG0.PEGP")
                .bridge(BRIDGE),
        )
    }

    #[test]
    fn test_config_read_needs_awake_bridge() {
        let platform = SimPlatform::new();
        let dev = nvidia(&platform);

        assert_eq!(dev.read_config_dword(0).unwrap(), PCI_CFG_ALL_ONES);

        platform.get_sync(BRIDGE);
        assert_eq!(dev.read_config_dword(0).unwrap(), 0x1C8D_10DE);
        platform.put_sync(BRIDGE);
        assert!(platform.bridges_idle());
    }

    #[test]
    fn test_power_methods() {
        let platform = SimPlatform::new();
        let dev = nvidia(&platform);
        let handle = dev.acpi_handle().unwrap();

        assert_eq!(platform.evaluate(handle, AcpiMethod::Off), AcpiStatus::AE_OK);
        assert!(!dev.is_powered());
        assert_eq!(platform.evaluate(handle, AcpiMethod::On), AcpiStatus::AE_OK);
        assert!(dev.is_powered());
        assert_eq!(platform.firmware_calls(), [AcpiMethod::Off, AcpiMethod::On]);
    }

    #[test]
    fn test_failing_firmware_keeps_power() {
        let platform = SimPlatform::new();
        let dev = nvidia(&platform);
        platform.set_firmware_status(AcpiStatus::AE_ERROR);

        let status = platform.evaluate(dev.acpi_handle().unwrap(), AcpiMethod::Off);
        assert_eq!(status, AcpiStatus::AE_ERROR);
        assert!(dev.is_powered());
    }

    #[test]
    fn test_unbalanced_put_detected() {
        let platform = SimPlatform::new();
        platform.put_sync(BRIDGE);
        assert_eq!(platform.unbalanced_puts(), 1);
        assert!(!platform.bridges_idle());
    }

    #[test]
    fn test_full_path() {
        let platform = SimPlatform::new();
        let dev = nvidia(&platform);
        assert_eq!(
            platform.full_path(dev.acpi_handle().unwrap()).as_deref(),
            Some("\\_SB_.PCI0.PEG0.PEGP")
        );
        assert_eq!(platform.full_path(AcpiHandle::new(99)), None);
    }
}
