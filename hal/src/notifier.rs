//! # PM Notifier
//!
//! System sleep lifecycle events, delivered synchronously and serially to
//! registered subscribers.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// EVENTS
// =============================================================================

/// System sleep lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum PmEvent {
    /// Going to hibernate
    HibernatePrepare = 1,
    /// Hibernation finished
    PostHibernation  = 2,
    /// Going to suspend to RAM
    SuspendPrepare   = 3,
    /// Suspend finished
    PostSuspend      = 4,
    /// About to restore a hibernation image
    RestorePrepare   = 5,
    /// Image restore failed
    PostRestore      = 6,
}

impl PmEvent {
    /// Decode a raw notifier code; unknown codes yield `None`
    pub const fn from_raw(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::HibernatePrepare),
            2 => Some(Self::PostHibernation),
            3 => Some(Self::SuspendPrepare),
            4 => Some(Self::PostSuspend),
            5 => Some(Self::RestorePrepare),
            6 => Some(Self::PostRestore),
            _ => None,
        }
    }

    /// Raw notifier code
    pub const fn raw(self) -> u64 {
        self as u64
    }

    /// Events that precede the platform saving device state
    pub const fn is_prepare(self) -> bool {
        matches!(self, Self::HibernatePrepare | Self::SuspendPrepare)
    }

    /// Events that follow resume (or a failed restore)
    pub const fn is_post(self) -> bool {
        matches!(
            self,
            Self::PostHibernation | Self::PostSuspend | Self::PostRestore
        )
    }
}

// =============================================================================
// SUBSCRIBERS
// =============================================================================

/// Value returned by a subscriber
///
/// Event sources ignore it by convention; the host binding maps it onto its
/// notifier chain's return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyResult {
    /// Event processed (or deliberately ignored), keep delivering
    Done,
}

/// Receiver of PM events
pub trait PmSubscriber: Send + Sync {
    /// Handle one event; never called concurrently with itself
    fn notify(&self, event: PmEvent) -> NotifyResult;
}

/// Subscription ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocate a fresh, process-unique ID
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// PM event source
pub trait PmNotifier: Send + Sync {
    /// Register a subscriber
    fn register(&self, subscriber: Arc<dyn PmSubscriber>) -> SubscriptionId;

    /// Remove a subscriber; unknown IDs are ignored
    fn unregister(&self, id: SubscriptionId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_codes() {
        for code in 1..=6 {
            let event = PmEvent::from_raw(code).unwrap();
            assert_eq!(event.raw(), code);
        }
        assert_eq!(PmEvent::from_raw(0), None);
        assert_eq!(PmEvent::from_raw(7), None);
    }

    #[test]
    fn test_event_groups() {
        assert!(PmEvent::SuspendPrepare.is_prepare());
        assert!(PmEvent::HibernatePrepare.is_prepare());
        assert!(PmEvent::PostRestore.is_post());
        assert!(!PmEvent::RestorePrepare.is_prepare());
        assert!(!PmEvent::RestorePrepare.is_post());
    }

    #[test]
    fn test_subscription_ids_unique() {
        let a = SubscriptionId::next();
        let b = SubscriptionId::next();
        assert_ne!(a, b);
    }
}
