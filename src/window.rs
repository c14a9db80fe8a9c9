/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Browsing windows and the stack that owns them.

use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::engine::EngineHandle;
use crate::handshake::PopupHandshake;
use crate::scroll::ScrollAffordanceController;
use crate::types::{
    ContentTarget, HandleId, Headers, LoadingState, NodeId, ScrollAffordance, SessionError,
    WindowId,
};

/// Point-in-time view of a window, safe to hand across threads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub title: Option<String>,
    pub url: Option<String>,
    pub loading_state: LoadingState,
    /// `true` while the window still targets its original URL.
    pub navigates_on_attach: bool,
    pub handle: Option<HandleId>,
    pub attached_node: Option<NodeId>,
    /// `None` for windows that were not opened as popups.
    pub handshake_resolved: Option<bool>,
    pub affordance: ScrollAffordance,
}

/// One logical tab or popup, with or without a materialized engine.
#[derive(Debug)]
pub struct BrowsingWindow {
    id: WindowId,
    pub content: ContentTarget,
    pub loading_state: LoadingState,
    pub page_title: Option<String>,
    /// Last URL the engine reported for this window.
    pub url: Option<Url>,
    pub(crate) handle: Option<EngineHandle>,
    pub(crate) pending_handshake: Option<PopupHandshake>,
    pub(crate) affordance: ScrollAffordanceController,
}

impl BrowsingWindow {
    fn new(id: WindowId, content: ContentTarget, debounce: Duration) -> Self {
        Self {
            id,
            content,
            loading_state: LoadingState::Initializing,
            page_title: None,
            url: None,
            handle: None,
            pending_handshake: None,
            affordance: ScrollAffordanceController::new(debounce),
        }
    }

    /// A window that navigates to `url` on first attach.
    pub fn navigate_to(id: WindowId, url: Url, headers: Headers, debounce: Duration) -> Self {
        Self::new(id, ContentTarget::NavigateTo { url, headers }, debounce)
    }

    /// A popup window whose engine is delivered to its opener through `handshake`.
    pub fn popup(id: WindowId, handshake: PopupHandshake, debounce: Duration) -> Self {
        let mut window = Self::new(id, ContentTarget::NavigatorOnly, debounce);
        window.pending_handshake = Some(handshake);
        window
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn handle(&self) -> Option<&EngineHandle> {
        self.handle.as_ref()
    }

    pub fn handle_id(&self) -> Option<HandleId> {
        self.handle.as_ref().map(EngineHandle::id)
    }

    /// UI node this window's engine is mounted in, if any.
    pub fn attached_node(&self) -> Option<NodeId> {
        self.handle.as_ref().and_then(EngineHandle::node)
    }

    pub fn pending_handshake(&self) -> Option<&PopupHandshake> {
        self.pending_handshake.as_ref()
    }

    pub fn affordance(&self) -> &ScrollAffordanceController {
        &self.affordance
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            id: self.id,
            title: self.page_title.clone(),
            url: self.url.as_ref().map(Url::to_string),
            loading_state: self.loading_state.clone(),
            navigates_on_attach: matches!(self.content, ContentTarget::NavigateTo { .. }),
            handle: self.handle_id(),
            attached_node: self.attached_node(),
            handshake_resolved: self.pending_handshake.as_ref().map(PopupHandshake::is_resolved),
            affordance: self.affordance.state(),
        }
    }

    /// Tear the window down: cancel its hide timer, then destroy its engine.
    /// Returns whether an engine was destroyed by this call.
    pub(crate) fn close(&mut self) -> bool {
        self.affordance.cancel();
        self.pending_handshake = None;
        self.handle.as_mut().is_some_and(EngineHandle::destroy)
    }
}

/// Ordered, never-empty stack of windows. The top is the active window.
#[derive(Debug)]
pub struct WindowStack {
    windows: Vec<BrowsingWindow>,
}

impl WindowStack {
    pub fn new(root: BrowsingWindow) -> Self {
        Self {
            windows: vec![root],
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn push(&mut self, window: BrowsingWindow) {
        self.windows.push(window);
    }

    /// Remove and return the top window. The last window cannot be popped.
    pub fn pop(&mut self) -> Result<BrowsingWindow, SessionError> {
        if self.windows.len() <= 1 {
            return Err(SessionError::InvalidOperation(
                "cannot pop the last browsing window".into(),
            ));
        }
        self.windows
            .pop()
            .ok_or_else(|| SessionError::InvalidOperation("window stack is empty".into()))
    }

    pub fn active(&self) -> &BrowsingWindow {
        &self.windows[self.windows.len() - 1]
    }

    pub fn active_mut(&mut self) -> &mut BrowsingWindow {
        let top = self.windows.len() - 1;
        &mut self.windows[top]
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.iter().any(|w| w.id == id)
    }

    pub fn get(&self, id: WindowId) -> Option<&BrowsingWindow> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut BrowsingWindow> {
        self.windows.iter_mut().find(|w| w.id == id)
    }

    /// The window owning the handle `id`.
    pub fn find_by_handle(&mut self, id: HandleId) -> Option<&mut BrowsingWindow> {
        self.windows
            .iter_mut()
            .find(|w| w.handle_id() == Some(id))
    }

    /// The window whose handle is mounted in `node`.
    pub fn find_by_node(&mut self, node: NodeId) -> Option<&mut BrowsingWindow> {
        self.windows
            .iter_mut()
            .find(|w| w.attached_node() == Some(node))
    }

    /// Bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &BrowsingWindow> {
        self.windows.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut BrowsingWindow> {
        self.windows.iter_mut()
    }
}
