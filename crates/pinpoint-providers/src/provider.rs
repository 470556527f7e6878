//! Provider kinds and the requested-provider bit set

use serde::{Deserialize, Serialize};

/// The closed set of provider kinds the system arbitrates between.
///
/// Raw platform identifiers outside this set are reported as unrecognized
/// by the catalog rather than failing enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Satellite-based positioning (GPS and friends)
    Satellite,
    /// Network-based positioning (cell towers, wifi)
    Network,
    /// Passive provider: receives fixes other consumers requested
    Passive,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Satellite,
        ProviderKind::Network,
        ProviderKind::Passive,
    ];

    /// Stable ordinal shared with the platform collaborator.
    pub fn code(&self) -> u8 {
        match self {
            ProviderKind::Satellite => 0,
            ProviderKind::Network => 1,
            ProviderKind::Passive => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Satellite => "satellite",
            ProviderKind::Network => "network",
            ProviderKind::Passive => "passive",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "satellite" => Ok(ProviderKind::Satellite),
            "network" => Ok(ProviderKind::Network),
            "passive" => Ok(ProviderKind::Passive),
            _ => Err(format!("Unknown provider kind: {}", s)),
        }
    }
}

/// Bit set over the provider kinds a session requested.
///
/// Immutable once a session is created; supplied by the caller at start.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProviderMask(u8);

impl ProviderMask {
    pub const SATELLITE: ProviderMask = ProviderMask(0b001);
    pub const NETWORK: ProviderMask = ProviderMask(0b010);
    pub const PASSIVE: ProviderMask = ProviderMask(0b100);

    pub fn empty() -> Self {
        ProviderMask(0)
    }

    pub fn all() -> Self {
        ProviderMask(0b111)
    }

    pub fn from_bits(bits: u8) -> Self {
        ProviderMask(bits & 0b111)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.0 & (1 << kind.code()) != 0
    }

    pub fn with(self, kind: ProviderKind) -> Self {
        ProviderMask(self.0 | (1 << kind.code()))
    }

    pub fn intersects(&self, other: ProviderMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Number of requested provider kinds.
    pub fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// True if the mask selects exactly one provider kind.
    pub fn is_single(&self) -> bool {
        self.count() == 1
    }

    /// Iterate the requested kinds in ordinal order.
    pub fn kinds(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        ProviderKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl From<ProviderKind> for ProviderMask {
    fn from(kind: ProviderKind) -> Self {
        ProviderMask::empty().with(kind)
    }
}

impl std::fmt::Debug for ProviderMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.kinds().map(|k| k.as_str()).collect();
        write!(f, "ProviderMask({})", names.join("|"))
    }
}
