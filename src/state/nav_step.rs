/// Navigation step definitions for listing traversal
///
/// This module defines the steps a listing page moves through while the
/// navigator is working on it, and which moves between them are legal.
use std::fmt;

/// Represents the current step of the listing traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavStep {
    // ===== Per-page Steps =====
    /// Loading the listing page
    Navigate,

    /// Single bounded attempt to close a login/overlay interstitial
    DismissOverlay,

    /// Short pause to let lazily rendered content appear
    Settle,

    /// Waiting for item-link anchors to be present
    WaitForContent,

    /// Collecting anchors into the link set
    Extract,

    // ===== Between Pages =====
    /// Ready to move to the next page index
    Advance,

    // ===== Terminal State =====
    /// Traversal finished (page bound reached or too many misses)
    Stop,
}

impl NavStep {
    /// Returns true if the traversal is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stop)
    }

    /// Returns true if `next` is a legal successor of this step
    ///
    /// A page that fails to load or shows no item links leaves through
    /// `Advance` (skip) or `Stop`.
    pub fn can_transition_to(&self, next: NavStep) -> bool {
        use NavStep::*;

        match self {
            Navigate => matches!(next, DismissOverlay | Advance | Stop),
            DismissOverlay => matches!(next, Settle),
            Settle => matches!(next, WaitForContent),
            WaitForContent => matches!(next, Extract | Advance | Stop),
            Extract => matches!(next, Advance),
            Advance => matches!(next, Navigate | Stop),
            Stop => false,
        }
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::DismissOverlay => "dismiss_overlay",
            Self::Settle => "settle",
            Self::WaitForContent => "wait_for_content",
            Self::Extract => "extract",
            Self::Advance => "advance",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for NavStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
