//! Per-session fix arbitration

use pinpoint_providers::{Fix, ProviderKind, ProviderMask};

use crate::state::FusionState;

/// Outcome of observing one incoming fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Forward the fix to the consumer
    Forward,
    /// Forward the fix, then tear the session down (single-shot delivery)
    ForwardAndTerminate,
    /// Withhold the fix; the satellite cadence has not lapsed yet
    Suppress,
    /// Late callback after termination; drop silently
    Discard,
}

impl Decision {
    pub fn forwards(&self) -> bool {
        matches!(self, Decision::Forward | Decision::ForwardAndTerminate)
    }
}

/// The per-session arbitration state machine.
///
/// Owned exclusively by the session's delivery channel, which serializes
/// all provider callbacks before they reach `observe`; decisions are
/// therefore computed and applied atomically per session.
pub struct FusionEngine {
    providers: ProviderMask,
    interval_ms: u32,
    single_shot: bool,
    state: FusionState,
    last_satellite: Option<Fix>,
    last_network: Option<Fix>,
}

impl FusionEngine {
    pub fn continuous(providers: ProviderMask, interval_ms: u32) -> Self {
        Self {
            providers,
            interval_ms,
            single_shot: false,
            state: FusionState::AwaitingFirstFix,
            last_satellite: None,
            last_network: None,
        }
    }

    pub fn single_shot(providers: ProviderMask) -> Self {
        Self {
            providers,
            interval_ms: 0,
            single_shot: true,
            state: FusionState::AwaitingFirstFix,
            last_satellite: None,
            last_network: None,
        }
    }

    pub fn state(&self) -> FusionState {
        self.state
    }

    pub fn is_single_shot(&self) -> bool {
        self.single_shot
    }

    pub fn last_satellite(&self) -> Option<&Fix> {
        self.last_satellite.as_ref()
    }

    pub fn last_network(&self) -> Option<&Fix> {
        self.last_network.as_ref()
    }

    /// Feed one incoming fix through the state machine.
    pub fn observe(&mut self, fix: &Fix) -> Decision {
        if self.state.is_terminated() {
            return Decision::Discard;
        }

        if self.single_shot {
            self.state = FusionState::Terminated;
            return Decision::ForwardAndTerminate;
        }

        // A lone provider has nothing to arbitrate against.
        if self.providers.is_single() {
            self.record(fix);
            return Decision::Forward;
        }

        match fix.provider {
            ProviderKind::Satellite => {
                self.record(fix);
                self.state = FusionState::SatelliteLocked;
                // Satellite fixes are always trusted immediately.
                Decision::Forward
            }
            // Passive fixes carry whatever provider last produced them;
            // arbitrate them like network fixes.
            ProviderKind::Network | ProviderKind::Passive => {
                self.record(fix);

                let Some(satellite) = &self.last_satellite else {
                    // Nothing better yet.
                    return Decision::Forward;
                };

                let delta = fix.millis_since(satellite);
                if delta < i64::from(self.interval_ms) {
                    // The satellite channel still has time to produce a
                    // fresher fix within its own cadence. Also covers
                    // network fixes older than the last satellite fix
                    // (delta < 0).
                    Decision::Suppress
                } else {
                    // Satellite timed out relative to the requested
                    // cadence; fall back to network.
                    Decision::Forward
                }
            }
        }
    }

    /// Mark the session terminated; further fixes are discarded.
    pub fn terminate(&mut self) {
        self.state = FusionState::Terminated;
    }

    /// Record the fix as the provider's latest. Timestamps never regress:
    /// an out-of-order fix is observed but does not displace a newer one.
    fn record(&mut self, fix: &Fix) {
        let slot = match fix.provider {
            ProviderKind::Satellite => &mut self.last_satellite,
            ProviderKind::Network | ProviderKind::Passive => &mut self.last_network,
        };

        match slot {
            Some(current) if fix.millis_since(current) < 0 => {}
            _ => *slot = Some(fix.clone()),
        }
    }
}
