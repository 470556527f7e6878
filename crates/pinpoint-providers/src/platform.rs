//! Platform collaborator contract
//!
//! The real location services live behind this trait so the session and
//! fusion layers can be driven by a mock in tests. Subscriptions deliver
//! asynchronously through a `ProviderEventSink`, never by direct call into
//! the subscriber.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::PlatformError;
use crate::fix::Fix;
use crate::provider::ProviderKind;

/// What a platform pushes into a session's delivery channel.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// A raw position fix arrived
    Fix(Fix),
    /// A provider became enabled
    ProviderEnabled(ProviderKind),
    /// A provider became disabled
    ProviderDisabled(ProviderKind),
}

/// Cloneable handle a platform uses to deliver events to one session.
///
/// Sends never block. Once the owning channel has shut down, sends fail
/// silently: late callbacks after teardown are dropped by contract.
#[derive(Debug, Clone)]
pub struct ProviderEventSink {
    id: Uuid,
    tx: mpsc::UnboundedSender<ProviderEvent>,
}

impl ProviderEventSink {
    pub fn new(tx: mpsc::UnboundedSender<ProviderEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
        }
    }

    /// Identifies this sink across `subscribe`/`unsubscribe` calls.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn push_fix(&self, fix: Fix) {
        let _ = self.tx.send(ProviderEvent::Fix(fix));
    }

    pub fn provider_enabled(&self, kind: ProviderKind) {
        let _ = self.tx.send(ProviderEvent::ProviderEnabled(kind));
    }

    pub fn provider_disabled(&self, kind: ProviderKind) {
        let _ = self.tx.send(ProviderEvent::ProviderDisabled(kind));
    }
}

/// Injected platform location services.
pub trait LocationPlatform: Send + Sync {
    /// Raw provider identifiers known to the platform.
    fn enumerate_providers(&self) -> Result<Vec<String>, PlatformError>;

    /// Provider kinds currently enabled by the user/system.
    fn enabled_providers(&self) -> Result<Vec<ProviderKind>, PlatformError>;

    /// Last cached fix for a provider kind, if any.
    fn last_known_fix(&self, kind: ProviderKind) -> Result<Option<Fix>, PlatformError>;

    /// Subscribe the sink to regular updates from one provider kind.
    fn subscribe(
        &self,
        kind: ProviderKind,
        interval_ms: u32,
        sink: ProviderEventSink,
    ) -> Result<(), PlatformError>;

    /// Subscribe the sink for exactly one update from one provider kind.
    fn subscribe_once(&self, kind: ProviderKind, sink: ProviderEventSink)
        -> Result<(), PlatformError>;

    /// Remove every subscription held by the identified sink.
    fn unsubscribe(&self, sink_id: Uuid);
}
