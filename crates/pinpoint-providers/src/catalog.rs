//! Provider catalog and best-known-location query
//!
//! Both queries here are advisory: collaborator failures degrade to empty
//! results instead of propagating.

use std::sync::Arc;

use crate::fix::Fix;
use crate::platform::LocationPlatform;
use crate::provider::{ProviderKind, ProviderMask};

/// A satellite fix older than the freshest network fix by at least this
/// much loses the accuracy preference in `best_known`.
pub const BEST_KNOWN_STALENESS_MS: i64 = 4 * 60 * 60 * 1000;

/// Normalizes platform provider identifiers and answers availability
/// queries for the session layer.
pub struct ProviderCatalog {
    platform: Arc<dyn LocationPlatform>,
}

impl ProviderCatalog {
    pub fn new(platform: Arc<dyn LocationPlatform>) -> Self {
        Self { platform }
    }

    /// Enumerate platform providers, pairing each raw identifier with its
    /// normalized kind. Unrecognized identifiers map to `None` so callers
    /// can filter instead of failing.
    pub fn list_providers(&self) -> Vec<(String, Option<ProviderKind>)> {
        let raw = match self.platform.enumerate_providers() {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Provider enumeration failed");
                return Vec::new();
            }
        };

        raw.into_iter()
            .map(|id| {
                let kind = normalize_raw_id(&id);
                (id, kind)
            })
            .collect()
    }

    /// Provider kinds the platform knows about, unrecognized ids dropped.
    pub fn known_kinds(&self) -> ProviderMask {
        self.list_providers()
            .into_iter()
            .filter_map(|(_, kind)| kind)
            .fold(ProviderMask::empty(), ProviderMask::with)
    }

    /// True iff at least one of the requested providers is currently
    /// enabled. Side-effect-free; degrades to `false` on platform failure.
    pub fn is_any_enabled(&self, mask: ProviderMask) -> bool {
        let enabled = match self.platform.enabled_providers() {
            Ok(enabled) => enabled,
            Err(e) => {
                tracing::warn!(error = %e, "Enabled-provider query failed");
                return false;
            }
        };

        enabled.iter().any(|kind| mask.contains(*kind))
    }

    /// One-shot combination of the cached satellite and network fixes.
    ///
    /// Satellite wins on accuracy unless the network fix is newer by at
    /// least four hours; then the recency gap overrides the preference.
    pub fn best_known(&self, satellite_only: bool) -> Option<Fix> {
        let satellite = self.cached_fix(ProviderKind::Satellite);
        let network = if satellite_only {
            None
        } else {
            self.cached_fix(ProviderKind::Network)
        };

        match (satellite, network) {
            (Some(sat), Some(net)) => {
                if net.millis_since(&sat) < BEST_KNOWN_STALENESS_MS {
                    Some(sat)
                } else {
                    Some(net)
                }
            }
            (Some(sat), None) => Some(sat),
            (None, Some(net)) => Some(net),
            (None, None) => None,
        }
    }

    fn cached_fix(&self, kind: ProviderKind) -> Option<Fix> {
        match self.platform.last_known_fix(kind) {
            Ok(fix) => fix,
            Err(e) => {
                tracing::warn!(provider = %kind, error = %e, "Last-known-fix query failed");
                None
            }
        }
    }
}

impl Clone for ProviderCatalog {
    fn clone(&self) -> Self {
        Self {
            platform: Arc::clone(&self.platform),
        }
    }
}

/// Map a raw platform identifier to its normalized kind.
pub fn normalize_raw_id(raw: &str) -> Option<ProviderKind> {
    match raw.to_lowercase().as_str() {
        "gps" | "satellite" => Some(ProviderKind::Satellite),
        "network" => Some(ProviderKind::Network),
        "passive" => Some(ProviderKind::Passive),
        _ => None,
    }
}
