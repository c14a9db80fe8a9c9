/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Scroll-direction affordance with a debounced auto-hide.
//!
//! The hide timer is a single deadline slot: every qualifying scroll
//! replaces it, so at most one hide is ever pending per window.

use std::time::{Duration, Instant};

use crate::types::ScrollAffordance;

/// Where a dismissed affordance asks the page to scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Top,
    Bottom,
}

impl ScrollTarget {
    /// Vertical offset for this target on a page of the given geometry.
    pub fn offset(self, content_height: u32, viewport_height: u32) -> u32 {
        match self {
            ScrollTarget::Top => 0,
            ScrollTarget::Bottom => content_height.saturating_sub(viewport_height),
        }
    }
}

#[derive(Debug)]
pub struct ScrollAffordanceController {
    state: ScrollAffordance,
    hide_at: Option<Instant>,
    debounce: Duration,
}

impl ScrollAffordanceController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: ScrollAffordance::Hidden,
            hide_at: None,
            debounce,
        }
    }

    pub fn state(&self) -> ScrollAffordance {
        self.state
    }

    /// When the pending hide fires, if one is scheduled.
    pub fn deadline(&self) -> Option<Instant> {
        self.hide_at
    }

    /// Feed one scroll event. Returns the new state if it changed.
    pub fn on_scroll(
        &mut self,
        delta_y: i32,
        offset: u32,
        content_height: u32,
        viewport_height: u32,
        now: Instant,
    ) -> Option<ScrollAffordance> {
        if content_height <= viewport_height {
            return None;
        }

        let previous = self.state;
        if delta_y > 0 && offset > 0 {
            self.state = ScrollAffordance::ShowDown;
        } else if delta_y < 0 && offset < content_height - viewport_height {
            self.state = ScrollAffordance::ShowUp;
        }

        if self.state != ScrollAffordance::Hidden {
            self.hide_at = Some(now + self.debounce);
        }

        (self.state != previous).then_some(self.state)
    }

    /// Hide once the quiet period has elapsed. Returns `true` on transition.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.hide_at {
            Some(deadline) if now >= deadline => {
                self.hide_at = None;
                let was_visible = self.state != ScrollAffordance::Hidden;
                self.state = ScrollAffordance::Hidden;
                was_visible
            }
            _ => false,
        }
    }

    /// The user tapped the affordance. Returns where to scroll, if it was shown.
    pub fn dismiss(&mut self) -> Option<ScrollTarget> {
        self.hide_at = None;
        let target = match self.state {
            ScrollAffordance::Hidden => None,
            ScrollAffordance::ShowDown => Some(ScrollTarget::Bottom),
            ScrollAffordance::ShowUp => Some(ScrollTarget::Top),
        };
        self.state = ScrollAffordance::Hidden;
        target
    }

    /// Drop any pending hide and return to `Hidden`.
    pub fn cancel(&mut self) {
        self.hide_at = None;
        self.state = ScrollAffordance::Hidden;
    }
}
