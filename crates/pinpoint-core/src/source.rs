//! Position source facade
//!
//! One facade per logical consumer. Wraps the session manager behind the
//! caller-facing operations and keeps two independent subscription keys,
//! one for regular updates and one for single-shot requests, so a one-shot
//! request never disturbs a running update stream.

use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

use pinpoint_providers::{Fix, LocationPlatform, ProviderCatalog, ProviderMask};
use pinpoint_session::{FixListener, SessionManager, StartStatus};

use crate::config::Config;
use crate::error::CoreError;

pub struct PositionSource {
    manager: SessionManager,
    catalog: ProviderCatalog,
    config: Config,
    update_key: String,
    single_key: String,
    providers: RwLock<ProviderMask>,
    interval_ms: RwLock<u32>,
    running: RwLock<bool>,
    last_status: RwLock<StartStatus>,
}

impl PositionSource {
    pub fn new(
        platform: Arc<dyn LocationPlatform>,
        listener: Arc<dyn FixListener>,
        config: Config,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let manager = SessionManager::new(Arc::clone(&platform), listener)
            .with_ready_timeout(config.ready_timeout());
        let catalog = ProviderCatalog::new(platform);
        let key = Uuid::new_v4();

        Ok(Self {
            manager,
            catalog,
            interval_ms: RwLock::new(config.min_update_interval_ms),
            config,
            update_key: format!("{key}-updates"),
            single_key: format!("{key}-single"),
            // All providers by default
            providers: RwLock::new(ProviderMask::all()),
            running: RwLock::new(false),
            last_status: RwLock::new(StartStatus::NoError),
        })
    }

    /// Begin regular updates with the configured providers and interval.
    /// No-op while already running.
    pub fn start_updates(&self) -> StartStatus {
        if *self.running.read() {
            return *self.last_status.read();
        }

        let status = self.manager.start_continuous(
            &self.update_key,
            *self.providers.read(),
            *self.interval_ms.read(),
        );

        *self.last_status.write() = status;
        // ClosedError still registers the session; it resumes by itself
        // once a provider is re-enabled.
        *self.running.write() =
            matches!(status, StartStatus::NoError | StartStatus::ClosedError);

        status
    }

    pub fn stop_updates(&self) {
        self.manager.stop(&self.update_key);
        *self.running.write() = false;
    }

    /// Request exactly one fix, independently of any running update
    /// stream.
    pub fn request_update(&self) -> StartStatus {
        let status = self
            .manager
            .start_single_shot(&self.single_key, *self.providers.read());
        *self.last_status.write() = status;
        status
    }

    /// Best cached fix across providers; `None` when nothing is cached.
    pub fn last_known_position(&self, satellite_only: bool) -> Option<Fix> {
        self.catalog.best_known(satellite_only)
    }

    /// Provider kinds the platform actually has, unrecognized ones
    /// filtered out.
    pub fn supported_providers(&self) -> ProviderMask {
        self.catalog.known_kinds()
    }

    /// Apply a new update cadence, clamped to the configured floor, and
    /// returns the applied value. A running stream is restarted so the new
    /// cadence takes effect.
    pub fn set_update_interval(&self, interval_ms: u32) -> u32 {
        let applied = interval_ms.max(self.config.min_update_interval_ms);

        let changed = {
            let mut current = self.interval_ms.write();
            let changed = *current != applied;
            *current = applied;
            changed
        };

        if changed {
            self.reconfigure_running_stream();
        }
        applied
    }

    /// Change the preferred provider set; a running stream is restarted
    /// with the new mask.
    pub fn set_preferred_providers(&self, providers: ProviderMask) {
        let changed = {
            let mut current = self.providers.write();
            let changed = *current != providers;
            *current = providers;
            changed
        };

        if changed {
            self.reconfigure_running_stream();
        }
    }

    pub fn preferred_providers(&self) -> ProviderMask {
        *self.providers.read()
    }

    pub fn update_interval(&self) -> u32 {
        *self.interval_ms.read()
    }

    pub fn is_running(&self) -> bool {
        *self.running.read()
    }

    /// Result of the most recent start/request call.
    pub fn last_status(&self) -> StartStatus {
        *self.last_status.read()
    }

    fn reconfigure_running_stream(&self) {
        if !*self.running.read() {
            return;
        }

        tracing::debug!(session_key = %self.update_key, "Restarting update stream");
        self.stop_updates();
        self.start_updates();
    }
}
