//! Quality tiers: totally ordered, saturating value types.
//!
//! Each product family defines its own tier set by implementing
//! [`QualityTier`] on a fieldless enum. Only `TIERS` and `name` are required;
//! the algebra (`upgrade`, `downgrade`, `level`, name lookup) is shared.

use std::fmt::Debug;
use std::hash::Hash;

/// An ordered quality tier of one product family.
///
/// `TIERS` must list every tier in ascending order, and the derived `Ord`
/// must agree with that order.
pub trait QualityTier: Copy + Ord + Eq + Hash + Debug + Send + Sync + 'static {
    /// All tiers, lowest first.
    const TIERS: &'static [Self];

    /// Stable tier name. Persisted documents store this, not the ordinal.
    fn name(self) -> &'static str;

    /// Ordinal of this tier (0 = lowest).
    fn level(self) -> u8 {
        Self::TIERS.iter().position(|t| *t == self).unwrap_or(0) as u8
    }

    /// The next tier up. Saturates at the top.
    fn upgrade(self) -> Self {
        Self::TIERS
            .get(self.level() as usize + 1)
            .copied()
            .unwrap_or(self)
    }

    /// The next tier down. Saturates at the bottom.
    fn downgrade(self) -> Self {
        match self.level() {
            0 => self,
            l => Self::TIERS[l as usize - 1],
        }
    }

    /// The lowest tier.
    fn bottom() -> Self {
        Self::TIERS[0]
    }

    /// The highest tier.
    fn top() -> Self {
        Self::TIERS[Self::TIERS.len() - 1]
    }

    fn is_top(self) -> bool {
        self == Self::top()
    }

    fn is_bottom(self) -> bool {
        self == Self::bottom()
    }

    /// Look a tier up by its stable name.
    fn from_name(name: &str) -> Option<Self> {
        Self::TIERS.iter().copied().find(|t| t.name() == name)
    }
}

/// The best tier in `tiers`, or `None` if it is empty.
pub fn best_of<Q: QualityTier>(tiers: impl IntoIterator<Item = Q>) -> Option<Q> {
    tiers.into_iter().max()
}

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

/// Five-tier grading used by the standard production line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    Poor,
    Standard,
    Good,
    Excellent,
    Legendary,
}

impl QualityTier for Grade {
    const TIERS: &'static [Self] = &[
        Grade::Poor,
        Grade::Standard,
        Grade::Good,
        Grade::Excellent,
        Grade::Legendary,
    ];

    fn name(self) -> &'static str {
        match self {
            Grade::Poor => "poor",
            Grade::Standard => "standard",
            Grade::Good => "good",
            Grade::Excellent => "excellent",
            Grade::Legendary => "legendary",
        }
    }
}

/// Two-tier family for products that are either rough or finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Finish {
    Rough,
    Fine,
}

impl QualityTier for Finish {
    const TIERS: &'static [Self] = &[Finish::Rough, Finish::Fine];

    fn name(self) -> &'static str {
        match self {
            Finish::Rough => "rough",
            Finish::Fine => "fine",
        }
    }
}
