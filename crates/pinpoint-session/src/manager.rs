//! Session Manager
//!
//! The audit point for every start/stop call: serializes structural
//! mutations under one operation lock, enforces single-session-per-key,
//! and translates collaborator failures into the stable result codes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use pinpoint_fusion::FusionEngine;
use pinpoint_providers::{LocationPlatform, ProviderCatalog, ProviderMask};

use crate::channel::{ChannelContext, DeliveryChannel, SessionTable};
use crate::listener::FixListener;
use crate::session::{Session, SessionInfo};
use crate::status::StartStatus;

/// Requested intervals below this floor are raised to it; a request of 0
/// means "as often as the platform allows" and normalizes to the floor.
pub const MIN_UPDATE_INTERVAL_MS: u32 = 1_000;

/// Default bound on the channel readiness barrier.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(5);

enum StartMode {
    Continuous { interval_ms: u32 },
    SingleShot,
}

pub struct SessionManager {
    /// Serializes start/stop; never held while a channel thread is joined
    /// inside a table operation of its own
    ops: Arc<Mutex<()>>,
    /// Key -> active session; channel threads read through for
    /// self-teardown without taking the operation lock
    table: SessionTable,
    platform: Arc<dyn LocationPlatform>,
    catalog: ProviderCatalog,
    listener: Arc<dyn FixListener>,
    ready_timeout: Duration,
}

impl SessionManager {
    pub fn new(platform: Arc<dyn LocationPlatform>, listener: Arc<dyn FixListener>) -> Self {
        let catalog = ProviderCatalog::new(Arc::clone(&platform));

        Self {
            ops: Arc::new(Mutex::new(())),
            table: Arc::new(RwLock::new(HashMap::new())),
            platform,
            catalog,
            listener,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }

    pub fn with_ready_timeout(mut self, ready_timeout: Duration) -> Self {
        self.ready_timeout = ready_timeout;
        self
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Start regular updates for `key`, replacing any session already
    /// registered under it.
    pub fn start_continuous(
        &self,
        key: &str,
        providers: ProviderMask,
        interval_ms: u32,
    ) -> StartStatus {
        self.start_session(key, providers, StartMode::Continuous { interval_ms })
    }

    /// Subscribe `key` for exactly one fix per requested provider; the
    /// session self-destructs after the first delivery.
    pub fn start_single_shot(&self, key: &str, providers: ProviderMask) -> StartStatus {
        self.start_session(key, providers, StartMode::SingleShot)
    }

    /// Remove and tear down the session if present. A missing key is a
    /// no-op, not an error; calling twice equals calling once.
    pub fn stop(&self, key: &str) {
        let _ops = self.ops.lock();

        if self.teardown(key) {
            tracing::info!(session_key = %key, "Stopped session");
        } else {
            tracing::debug!(session_key = %key, "Stop requested for unknown session");
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.read().contains_key(key)
    }

    pub fn session_count(&self) -> usize {
        self.table.read().len()
    }

    pub fn sessions(&self) -> Vec<SessionInfo> {
        self.table.read().values().map(Session::info).collect()
    }

    fn start_session(&self, key: &str, providers: ProviderMask, mode: StartMode) -> StartStatus {
        let _ops = self.ops.lock();

        if providers.is_empty() {
            tracing::warn!(session_key = %key, "Rejected start with empty provider mask");
            return StartStatus::UnknownSourceError;
        }

        // A second start under the same key replaces the first; the old
        // channel must be gone before the new subscriptions exist or both
        // would deliver.
        if self.teardown(key) {
            tracing::info!(session_key = %key, "Replaced existing session");
        }

        let (engine, interval_ms, single_shot) = match mode {
            StartMode::Continuous { interval_ms } => {
                let interval_ms = normalize_interval(interval_ms);
                (FusionEngine::continuous(providers, interval_ms), interval_ms, false)
            }
            StartMode::SingleShot => (FusionEngine::single_shot(providers), 0, true),
        };

        let ctx = ChannelContext {
            key: key.to_string(),
            providers,
            engine,
            platform: Arc::clone(&self.platform),
            catalog: self.catalog.clone(),
            listener: Arc::clone(&self.listener),
            table: Arc::clone(&self.table),
        };

        let mut channel = match DeliveryChannel::start(ctx, self.ready_timeout) {
            Ok(channel) => channel,
            Err(e) => {
                tracing::error!(session_key = %key, error = %e, "Delivery channel start failed");
                return StartStatus::AccessError;
            }
        };

        let sink = channel.sink().clone();
        let mut attempted = 0usize;
        let mut granted = 0usize;
        let mut denied = 0usize;

        for kind in providers.kinds() {
            attempted += 1;
            let result = if single_shot {
                self.platform.subscribe_once(kind, sink.clone())
            } else {
                self.platform.subscribe(kind, interval_ms, sink.clone())
            };

            match result {
                Ok(()) => {
                    tracing::debug!(session_key = %key, provider = %kind, "Subscribed");
                    granted += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        session_key = %key,
                        provider = %kind,
                        error = %e,
                        "Provider subscription failed"
                    );
                    if e.is_permission_denied() {
                        denied += 1;
                    }
                }
            }
        }

        if granted == 0 {
            // No session may stay registered with a channel that never got
            // a subscription.
            self.platform.unsubscribe(sink.id());
            channel.stop();
            return if denied == attempted {
                StartStatus::AccessError
            } else {
                StartStatus::UnknownSourceError
            };
        }

        let session = Session {
            key: key.to_string(),
            providers,
            interval_ms,
            single_shot,
            created_at: Utc::now(),
            channel,
        };
        self.table.write().insert(key.to_string(), session);

        tracing::info!(
            session_key = %key,
            providers = ?providers,
            interval_ms,
            single_shot,
            "Registered session"
        );

        if !self.catalog.is_any_enabled(providers) {
            // The session stays registered and resumes automatically once
            // a provider comes back.
            return StartStatus::ClosedError;
        }

        StartStatus::NoError
    }

    /// Remove `key` from the table and tear its channel down. The table
    /// lock is released before the join so a channel mid-self-teardown can
    /// never deadlock against us.
    fn teardown(&self, key: &str) -> bool {
        let removed = self.table.write().remove(key);

        match removed {
            Some(mut session) => {
                self.platform.unsubscribe(session.channel.sink().id());
                session.channel.stop();
                true
            }
            None => false,
        }
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            ops: Arc::clone(&self.ops),
            table: Arc::clone(&self.table),
            platform: Arc::clone(&self.platform),
            catalog: self.catalog.clone(),
            listener: Arc::clone(&self.listener),
            ready_timeout: self.ready_timeout,
        }
    }
}

fn normalize_interval(interval_ms: u32) -> u32 {
    interval_ms.max(MIN_UPDATE_INTERVAL_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use pinpoint_providers::{
        Fix, PlatformError, Position, ProviderEventSink, ProviderKind,
    };
    use std::collections::HashSet;
    use std::sync::mpsc as std_mpsc;
    use uuid::Uuid;

    struct MockSubscription {
        kind: ProviderKind,
        sink: ProviderEventSink,
    }

    /// Injectable platform double: records subscriptions and lets tests
    /// push fixes and availability events through the captured sinks.
    struct MockPlatform {
        enabled: Mutex<Vec<ProviderKind>>,
        subscriptions: Mutex<Vec<MockSubscription>>,
        deny_all: Mutex<bool>,
    }

    impl MockPlatform {
        fn new(enabled: Vec<ProviderKind>) -> Arc<Self> {
            Arc::new(Self {
                enabled: Mutex::new(enabled),
                subscriptions: Mutex::new(Vec::new()),
                deny_all: Mutex::new(false),
            })
        }

        fn set_enabled(&self, enabled: Vec<ProviderKind>) {
            *self.enabled.lock() = enabled;
        }

        fn deny_all(&self) {
            *self.deny_all.lock() = true;
        }

        fn push_fix(&self, fix: Fix) {
            for sub in self.subscriptions.lock().iter() {
                if sub.kind == fix.provider {
                    sub.sink.push_fix(fix.clone());
                }
            }
        }

        fn broadcast_disabled(&self, kind: ProviderKind) {
            for sub in self.subscriptions.lock().iter() {
                sub.sink.provider_disabled(kind);
            }
        }

        fn broadcast_enabled(&self, kind: ProviderKind) {
            for sub in self.subscriptions.lock().iter() {
                sub.sink.provider_enabled(kind);
            }
        }

        fn subscription_count(&self) -> usize {
            self.subscriptions.lock().len()
        }

        fn live_sink_ids(&self) -> HashSet<Uuid> {
            self.subscriptions.lock().iter().map(|s| s.sink.id()).collect()
        }

        fn record(&self, kind: ProviderKind, sink: ProviderEventSink) -> Result<(), PlatformError> {
            if *self.deny_all.lock() {
                return Err(PlatformError::PermissionDenied);
            }
            self.subscriptions.lock().push(MockSubscription { kind, sink });
            Ok(())
        }
    }

    impl LocationPlatform for MockPlatform {
        fn enumerate_providers(&self) -> Result<Vec<String>, PlatformError> {
            Ok(vec!["gps".into(), "network".into(), "passive".into()])
        }

        fn enabled_providers(&self) -> Result<Vec<ProviderKind>, PlatformError> {
            Ok(self.enabled.lock().clone())
        }

        fn last_known_fix(&self, _kind: ProviderKind) -> Result<Option<Fix>, PlatformError> {
            Ok(None)
        }

        fn subscribe(
            &self,
            kind: ProviderKind,
            _interval_ms: u32,
            sink: ProviderEventSink,
        ) -> Result<(), PlatformError> {
            self.record(kind, sink)
        }

        fn subscribe_once(
            &self,
            kind: ProviderKind,
            sink: ProviderEventSink,
        ) -> Result<(), PlatformError> {
            self.record(kind, sink)
        }

        fn unsubscribe(&self, sink_id: Uuid) {
            self.subscriptions.lock().retain(|s| s.sink.id() != sink_id);
        }
    }

    #[derive(Debug, PartialEq)]
    enum Delivered {
        Fix {
            key: String,
            provider: ProviderKind,
            single_shot: bool,
        },
        Unavailable {
            key: String,
        },
    }

    struct ChannelListener {
        tx: Mutex<std_mpsc::Sender<Delivered>>,
    }

    impl ChannelListener {
        fn new() -> (Arc<Self>, std_mpsc::Receiver<Delivered>) {
            let (tx, rx) = std_mpsc::channel();
            (Arc::new(Self { tx: Mutex::new(tx) }), rx)
        }
    }

    impl FixListener for ChannelListener {
        fn on_fix_delivered(&self, fix: Fix, session_key: &str, single_shot: bool) {
            let _ = self.tx.lock().send(Delivered::Fix {
                key: session_key.to_string(),
                provider: fix.provider,
                single_shot,
            });
        }

        fn on_providers_unavailable(&self, session_key: &str) {
            let _ = self.tx.lock().send(Delivered::Unavailable {
                key: session_key.to_string(),
            });
        }
    }

    const WAIT: Duration = Duration::from_secs(2);
    const QUIET: Duration = Duration::from_millis(150);

    fn fix(kind: ProviderKind, millis: i64) -> Fix {
        Fix::new(
            kind,
            chrono::Utc.timestamp_millis_opt(millis).unwrap(),
            Position::new(59.33, 18.07),
        )
    }

    fn both() -> ProviderMask {
        ProviderMask::SATELLITE.with(ProviderKind::Network)
    }

    fn setup(
        enabled: Vec<ProviderKind>,
    ) -> (Arc<MockPlatform>, SessionManager, std_mpsc::Receiver<Delivered>) {
        let platform = MockPlatform::new(enabled);
        let (listener, rx) = ChannelListener::new();
        let manager = SessionManager::new(platform.clone() as Arc<dyn LocationPlatform>, listener);
        (platform, manager, rx)
    }

    fn wait_until_gone(manager: &SessionManager, key: &str) {
        let deadline = std::time::Instant::now() + WAIT;
        while manager.contains(key) {
            assert!(std::time::Instant::now() < deadline, "session never tore down");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_start_and_deliver() {
        let (platform, manager, rx) = setup(vec![ProviderKind::Satellite]);

        let status = manager.start_continuous("nav", both(), 1_000);
        assert_eq!(status, StartStatus::NoError);
        assert!(manager.contains("nav"));
        assert_eq!(platform.subscription_count(), 2);

        platform.push_fix(fix(ProviderKind::Satellite, 0));
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            Delivered::Fix {
                key: "nav".into(),
                provider: ProviderKind::Satellite,
                single_shot: false,
            }
        );

        manager.stop("nav");
        assert_eq!(manager.session_count(), 0);
        assert_eq!(platform.subscription_count(), 0);
    }

    #[test]
    fn test_empty_mask_registers_nothing() {
        let (platform, manager, _rx) = setup(vec![ProviderKind::Satellite]);

        let status = manager.start_continuous("nav", ProviderMask::empty(), 1_000);
        assert_eq!(status, StartStatus::UnknownSourceError);
        assert_eq!(manager.session_count(), 0);
        assert_eq!(platform.subscription_count(), 0);
    }

    #[test]
    fn test_permission_denied_everywhere_is_access_error() {
        let (platform, manager, _rx) = setup(vec![ProviderKind::Satellite]);
        platform.deny_all();

        let status = manager.start_continuous("nav", both(), 1_000);
        assert_eq!(status, StartStatus::AccessError);
        assert_eq!(manager.session_count(), 0);
        assert_eq!(platform.subscription_count(), 0);
    }

    #[test]
    fn test_no_enabled_provider_is_closed_error_but_registers() {
        let (_platform, manager, _rx) = setup(Vec::new());

        let status = manager.start_continuous("nav", both(), 1_000);
        assert_eq!(status, StartStatus::ClosedError);
        // Registered so it resumes transparently on re-enablement.
        assert!(manager.contains("nav"));
    }

    #[test]
    fn test_restart_replaces_session_without_double_delivery() {
        let (platform, manager, rx) = setup(vec![ProviderKind::Satellite]);

        assert_eq!(manager.start_continuous("nav", both(), 1_000), StartStatus::NoError);
        let first_sinks = platform.live_sink_ids();

        assert_eq!(manager.start_continuous("nav", both(), 2_000), StartStatus::NoError);
        assert_eq!(manager.session_count(), 1);

        // Only the replacement's sink may still be subscribed.
        let second_sinks = platform.live_sink_ids();
        assert_eq!(second_sinks.len(), 1);
        assert!(first_sinks.is_disjoint(&second_sinks));

        platform.push_fix(fix(ProviderKind::Satellite, 0));
        assert!(matches!(rx.recv_timeout(WAIT).unwrap(), Delivered::Fix { .. }));
        assert!(rx.recv_timeout(QUIET).is_err(), "fix delivered twice");
    }

    #[test]
    fn test_stop_unknown_key_is_noop_and_idempotent() {
        let (_platform, manager, _rx) = setup(vec![ProviderKind::Satellite]);

        manager.stop("ghost");
        assert_eq!(manager.session_count(), 0);

        assert_eq!(manager.start_continuous("nav", both(), 1_000), StartStatus::NoError);
        manager.stop("nav");
        manager.stop("nav");
        assert_eq!(manager.session_count(), 0);
    }

    #[test]
    fn test_single_shot_self_destructs_after_one_fix() {
        let (platform, manager, rx) = setup(vec![ProviderKind::Satellite]);

        assert_eq!(manager.start_single_shot("once", both()), StartStatus::NoError);
        platform.push_fix(fix(ProviderKind::Network, 0));

        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            Delivered::Fix {
                key: "once".into(),
                provider: ProviderKind::Network,
                single_shot: true,
            }
        );

        wait_until_gone(&manager, "once");
        assert_eq!(platform.subscription_count(), 0);

        // The second provider's single update arrives late and is dropped.
        platform.push_fix(fix(ProviderKind::Satellite, 100));
        assert!(rx.recv_timeout(QUIET).is_err());
    }

    #[test]
    fn test_network_suppressed_within_satellite_cadence() {
        let (platform, manager, rx) = setup(vec![ProviderKind::Satellite]);

        assert_eq!(manager.start_continuous("nav", both(), 1_000), StartStatus::NoError);

        platform.push_fix(fix(ProviderKind::Satellite, 0));
        assert!(matches!(
            rx.recv_timeout(WAIT).unwrap(),
            Delivered::Fix { provider: ProviderKind::Satellite, .. }
        ));

        platform.push_fix(fix(ProviderKind::Network, 500));
        assert!(rx.recv_timeout(QUIET).is_err(), "suppressed fix was delivered");

        platform.push_fix(fix(ProviderKind::Network, 1_500));
        assert!(matches!(
            rx.recv_timeout(WAIT).unwrap(),
            Delivered::Fix { provider: ProviderKind::Network, .. }
        ));
    }

    #[test]
    fn test_unavailability_is_edge_triggered() {
        let (platform, manager, rx) = setup(vec![ProviderKind::Satellite]);

        assert_eq!(manager.start_continuous("nav", both(), 1_000), StartStatus::NoError);

        // Every requested provider goes away.
        platform.set_enabled(Vec::new());
        platform.broadcast_disabled(ProviderKind::Satellite);
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            Delivered::Unavailable { key: "nav".into() }
        );
        assert!(manager.contains("nav"), "session must survive the outage");

        // Still disabled: no repeat notification.
        platform.broadcast_disabled(ProviderKind::Network);
        assert!(rx.recv_timeout(QUIET).is_err());

        // Re-enable, then a fresh outage raises a new edge.
        platform.set_enabled(vec![ProviderKind::Satellite]);
        platform.broadcast_enabled(ProviderKind::Satellite);
        platform.set_enabled(Vec::new());
        platform.broadcast_disabled(ProviderKind::Satellite);
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            Delivered::Unavailable { key: "nav".into() }
        );
    }

    #[test]
    fn test_interval_floor_enforced() {
        let (_platform, manager, _rx) = setup(vec![ProviderKind::Satellite]);

        assert_eq!(manager.start_continuous("a", both(), 0), StartStatus::NoError);
        assert_eq!(manager.start_continuous("b", both(), 250), StartStatus::NoError);

        let intervals: HashSet<u32> =
            manager.sessions().iter().map(|s| s.interval_ms).collect();
        assert_eq!(intervals, HashSet::from([MIN_UPDATE_INTERVAL_MS]));
    }

    #[test]
    fn test_sessions_snapshot() {
        let (_platform, manager, _rx) = setup(vec![ProviderKind::Satellite]);

        assert_eq!(manager.start_continuous("nav", both(), 1_000), StartStatus::NoError);
        assert_eq!(manager.start_single_shot("once", ProviderMask::SATELLITE), StartStatus::NoError);

        let infos = manager.sessions();
        assert_eq!(infos.len(), 2);
        let once = infos.iter().find(|i| i.key == "once").unwrap();
        assert!(once.single_shot);
        assert_eq!(once.interval_ms, 0);
    }
}
