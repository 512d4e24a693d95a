//! Viewport follow - Decides whether new content should pull the view down
//!
//! The follow flag is a pure function of the last scroll position the
//! presentation layer reported. Content growth never changes it.

use serde::{Deserialize, Serialize};

use crate::accumulator::GrowthEvent;

/// Slack absorbing sub-unit rounding from the host layout.
const AT_BOTTOM_TOLERANCE: f64 = 1.0;

/// Scroll geometry as reported by the host rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    /// Total height of the scrollable content.
    pub scroll_height: f64,
    /// Height of the visible area.
    pub client_height: f64,
    /// Current distance scrolled from the top.
    pub scroll_top: f64,
}

impl ScrollMetrics {
    pub fn is_at_bottom(&self) -> bool {
        self.scroll_height - self.client_height <= self.scroll_top + AT_BOTTOM_TOLERANCE
    }
}

/// What the presentation layer should do after a growth event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowDecision {
    ScrollToBottom,
    Hold,
}

#[derive(Debug, Clone)]
pub struct ViewportFollowController {
    follow: bool,
}

impl Default for ViewportFollowController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportFollowController {
    /// Starts in follow mode.
    pub fn new() -> Self {
        Self { follow: true }
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn on_scroll_position_observed(&mut self, at_bottom: bool) {
        if self.follow != at_bottom {
            tracing::trace!("Viewport follow {}", if at_bottom { "resumed" } else { "paused" });
        }
        self.follow = at_bottom;
    }

    /// Convenience for hosts that report raw geometry. Returns the new flag.
    pub fn observe_scroll(&mut self, metrics: ScrollMetrics) -> bool {
        self.on_scroll_position_observed(metrics.is_at_bottom());
        self.follow
    }

    pub fn on_growth_event(&self, _growth: &GrowthEvent) -> FollowDecision {
        if self.follow {
            FollowDecision::ScrollToBottom
        } else {
            FollowDecision::Hold
        }
    }
}
