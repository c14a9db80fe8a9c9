/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Notifications the session sends to the surrounding screen.

use serde::Serialize;

use crate::types::{LoadingState, ScrollAffordance, WindowId};

/// Receiver for screen-level notifications. Every method defaults to a no-op.
pub trait ScreenDelegate {
    fn on_title_changed(&mut self, _window: WindowId, _title: &str) {}
    fn on_url_changed(&mut self, _window: WindowId, _url: &str) {}
    fn on_loading_state_changed(&mut self, _window: WindowId, _state: &LoadingState) {}
    /// The top of the stack changed; the rendering surface must be rebuilt
    /// from scratch for `window`.
    fn on_active_window_changed(&mut self, _window: WindowId) {}
    fn on_affordance_changed(&mut self, _window: WindowId, _affordance: ScrollAffordance) {}
    /// A page finished loading; `content` is its rendered markup.
    fn on_rendered_content(&mut self, _window: WindowId, _content: &str) {}
    /// Back was pressed on the last window.
    fn request_leave_screen(&mut self) {}
}

/// A screen notification captured by [`EventQueue`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScreenEvent {
    TitleChanged { window: WindowId, title: String },
    UrlChanged { window: WindowId, url: String },
    LoadingStateChanged { window: WindowId, state: LoadingState },
    ActiveWindowChanged { window: WindowId },
    AffordanceChanged { window: WindowId, affordance: ScrollAffordance },
    RenderedContent { window: WindowId, content: String },
    LeaveScreen,
}

/// Delegate that buffers every notification until drained.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<ScreenEvent>,
}

impl EventQueue {
    /// Drain and return buffered events.
    pub fn drain(&mut self) -> Vec<ScreenEvent> {
        self.events.drain(..).collect()
    }

    pub fn events(&self) -> &[ScreenEvent] {
        &self.events
    }
}

impl ScreenDelegate for EventQueue {
    fn on_title_changed(&mut self, window: WindowId, title: &str) {
        self.events.push(ScreenEvent::TitleChanged {
            window,
            title: title.to_string(),
        });
    }

    fn on_url_changed(&mut self, window: WindowId, url: &str) {
        self.events.push(ScreenEvent::UrlChanged {
            window,
            url: url.to_string(),
        });
    }

    fn on_loading_state_changed(&mut self, window: WindowId, state: &LoadingState) {
        self.events.push(ScreenEvent::LoadingStateChanged {
            window,
            state: state.clone(),
        });
    }

    fn on_active_window_changed(&mut self, window: WindowId) {
        self.events.push(ScreenEvent::ActiveWindowChanged { window });
    }

    fn on_affordance_changed(&mut self, window: WindowId, affordance: ScrollAffordance) {
        self.events
            .push(ScreenEvent::AffordanceChanged { window, affordance });
    }

    fn on_rendered_content(&mut self, window: WindowId, content: &str) {
        self.events.push(ScreenEvent::RenderedContent {
            window,
            content: content.to_string(),
        });
    }

    fn request_leave_screen(&mut self) {
        self.events.push(ScreenEvent::LeaveScreen);
    }
}
