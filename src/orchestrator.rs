/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Layer 1: `SessionOrchestrator`, the single-threaded owner of the window
//! stack and of every engine instance in it.
//!
//! Engine lifetime follows stack membership, not UI-node lifetime: a UI
//! node going away only unmounts the engine, closing the window destroys
//! it. The orchestrator never keeps references into windows; it looks them
//! up in the stack by id every time.

use std::time::Instant;

use log::{debug, warn};
use url::Url;

use crate::engine::{EngineEvent, EngineFactory, EngineHandle};
use crate::handshake::{PopupDelivery, PopupHandshake};
use crate::screen::ScreenDelegate;
use crate::types::{
    ContentTarget, HandleId, LoadingState, NodeId, ScrollAffordance, SessionError,
    SessionOptions, WindowId,
};
use crate::window::{BrowsingWindow, WindowSnapshot, WindowStack};

/// What a back request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// The top window was closed.
    ClosedWindow(WindowId),
    /// Only one window was left; the screen was asked to close instead.
    LeftScreen,
}

/// Single-threaded session core. **Not** `Send` or `Sync`.
///
/// Drive it from the UI event loop, or use [`Session`](crate::Session) to
/// run it on a dedicated thread.
pub struct SessionOrchestrator<F: EngineFactory, S: ScreenDelegate> {
    stack: WindowStack,
    factory: F,
    screen: S,
    options: SessionOptions,
    next_window: u64,
    next_handle: u64,
}

impl<F: EngineFactory, S: ScreenDelegate> SessionOrchestrator<F, S> {
    /// Open a session with one window targeting `options.initial_url`.
    pub fn new(options: SessionOptions, factory: F, screen: S) -> Self {
        let root = BrowsingWindow::navigate_to(
            WindowId(0),
            options.initial_url.clone(),
            options.headers.clone(),
            options.scroll_debounce,
        );
        Self {
            stack: WindowStack::new(root),
            factory,
            screen,
            options,
            next_window: 1,
            next_handle: 0,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    pub fn stack(&self) -> &WindowStack {
        &self.stack
    }

    pub fn active_window(&self) -> &BrowsingWindow {
        self.stack.active()
    }

    pub fn active_handle_id(&self) -> Option<HandleId> {
        self.stack.active().handle_id()
    }

    /// Title for the screen: the active page's, or the configured initial one.
    pub fn title(&self) -> Option<&str> {
        self.stack
            .active()
            .page_title
            .as_deref()
            .or(self.options.initial_title.as_deref())
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.stack.active().url.as_ref()
    }

    pub fn affordance(&self) -> ScrollAffordance {
        self.stack.active().affordance().state()
    }

    /// Whether the screen should offer a close-tab action.
    pub fn can_close_top_window(&self) -> bool {
        self.stack.len() > 1
    }

    pub fn snapshot(&self) -> Vec<WindowSnapshot> {
        self.stack.iter().map(BrowsingWindow::snapshot).collect()
    }

    // -- UI attach / detach --

    /// A UI node wants to show `window`. Reuses the window's engine if it has
    /// one, otherwise creates, configures and mounts a new one. Only a new
    /// engine is navigated; a reused one keeps whatever page it is showing.
    pub fn attach(&mut self, window: WindowId, node: NodeId) -> Result<HandleId, SessionError> {
        let active = self.stack.active().id();
        if window != active {
            return Err(SessionError::InvalidOperation(format!(
                "{window} is not the active window ({active})"
            )));
        }

        if let Some(handle) = self.stack.active_mut().handle.as_mut() {
            handle.attach(node)?;
            debug!("{window}: reusing {} in {node}", handle.id());
            return Ok(handle.id());
        }

        let mut handle = self.materialize(node)?;
        let id = handle.id();
        let target = self.stack.active_mut();
        if let Some(handshake) = target.pending_handshake.as_mut() {
            match handle.transport().and_then(|t| handshake.resolve(t)) {
                Ok(()) => debug!("{window}: popup handshake resolved with {id}"),
                Err(SessionError::HandshakeAlreadyResolved) => {
                    debug!("{window}: popup handshake already resolved")
                }
                Err(e) => return Err(e),
            }
        }
        if let ContentTarget::NavigateTo { url, headers } = &target.content {
            handle.load(url, headers)?;
        }
        target.handle = Some(handle);
        Ok(id)
    }

    /// Create an engine and mount it in `node`; nothing sees it half-built.
    fn materialize(&mut self, node: NodeId) -> Result<EngineHandle, SessionError> {
        let engine = self.factory.create()?;
        let id = HandleId(self.next_handle);
        self.next_handle += 1;

        let mut handle = EngineHandle::new(id, engine);
        handle.configure(&self.options)?;
        handle.attach(node)?;
        debug!("created {id} in {node}");
        Ok(handle)
    }

    /// A UI node went away. If its engine's window is still on the stack the
    /// engine survives and the window resumes it on the next attach.
    pub fn detach(&mut self, node: NodeId) {
        match self.stack.find_by_node(node) {
            Some(window) => {
                if let Some(handle) = window.handle.as_mut()
                    && let Err(e) = handle.detach()
                {
                    warn!("{}: detach from {node} failed: {e}", window.id());
                }
                window.content = ContentTarget::NavigatorOnly;
                debug!("{}: preserved engine after {node} teardown", window.id());
            }
            None => debug!("{node} holds no live engine"),
        }
    }

    // -- Stack navigation --

    /// Close the top window, or ask the screen to leave if it is the last.
    pub fn back(&mut self) -> BackOutcome {
        match self.close_top_window() {
            Ok(closed) => BackOutcome::ClosedWindow(closed),
            Err(_) => {
                self.screen.request_leave_screen();
                BackOutcome::LeftScreen
            }
        }
    }

    /// Leave the screen regardless of how many windows are open.
    pub fn leave_screen(&mut self) {
        self.screen.request_leave_screen();
    }

    /// Close the top window and destroy its engine. Fails on the last window.
    pub fn close_top_window(&mut self) -> Result<WindowId, SessionError> {
        let mut closed = self.stack.pop()?;
        if closed.close() {
            debug!("{}: closed and destroyed its engine", closed.id());
        } else {
            debug!("{}: closed before any engine was attached", closed.id());
        }
        self.announce_active();
        Ok(closed.id())
    }

    /// A page asked for a new browsing context. Returns whether a window was
    /// opened for it.
    pub fn request_popup(&mut self, user_gesture: bool, token: Box<dyn PopupDelivery>) -> bool {
        if !user_gesture {
            debug!("{}", SessionError::PopupRejected);
            return false;
        }

        self.release_active_surface();
        let id = WindowId(self.next_window);
        self.next_window += 1;
        self.stack.push(BrowsingWindow::popup(
            id,
            PopupHandshake::new(token),
            self.options.scroll_debounce,
        ));
        debug!("{id}: opened popup window");
        self.announce_active();
        true
    }

    /// Unmount the current top's engine before another window covers it.
    fn release_active_surface(&mut self) {
        let window = self.stack.active_mut();
        window.affordance.cancel();
        if let Some(handle) = window.handle.as_mut() {
            if let Err(e) = handle.detach() {
                warn!("{}: detach failed: {e}", window.id());
            }
            window.content = ContentTarget::NavigatorOnly;
        }
    }

    fn announce_active(&mut self) {
        let window = self.stack.active();
        let id = window.id();
        self.screen.on_active_window_changed(id);
        if let Some(title) = window.page_title.as_deref() {
            self.screen.on_title_changed(id, title);
        }
        if let Some(url) = window.url.as_ref() {
            self.screen.on_url_changed(id, url.as_str());
        }
    }

    // -- Engine navigation on the active window --

    fn active_handle(&self) -> Result<&EngineHandle, SessionError> {
        self.stack.active().handle.as_ref().ok_or(SessionError::NoHandle)
    }

    fn active_handle_mut(&mut self) -> Result<&mut EngineHandle, SessionError> {
        self.stack
            .active_mut()
            .handle
            .as_mut()
            .ok_or(SessionError::NoHandle)
    }

    /// Navigate the active window to `url` with the session headers.
    pub fn load(&mut self, url: &Url) -> Result<(), SessionError> {
        let headers = &self.options.headers;
        self.stack
            .active_mut()
            .handle
            .as_mut()
            .ok_or(SessionError::NoHandle)?
            .load(url, headers)
    }

    pub fn go_back(&mut self) -> Result<bool, SessionError> {
        self.active_handle_mut()?.go_back()
    }

    pub fn go_forward(&mut self) -> Result<bool, SessionError> {
        self.active_handle_mut()?.go_forward()
    }

    pub fn can_go_back(&self) -> bool {
        self.active_handle()
            .and_then(EngineHandle::can_go_back)
            .unwrap_or(false)
    }

    pub fn can_go_forward(&self) -> bool {
        self.active_handle()
            .and_then(EngineHandle::can_go_forward)
            .unwrap_or(false)
    }

    pub fn reload(&mut self) -> Result<(), SessionError> {
        self.active_handle_mut()?.reload()
    }

    /// Decide whether the session handles a link instead of the engine.
    ///
    /// `intent://` links are swallowed. Web links to a different page are
    /// loaded with the session headers. Anything else is left to the engine.
    pub fn should_override_url_loading(&mut self, handle: HandleId, url: &str) -> bool {
        if url.starts_with("intent://") {
            return true;
        }
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }

        let headers = &self.options.headers;
        let Some(engine) = self
            .stack
            .find_by_handle(handle)
            .and_then(|w| w.handle.as_mut())
        else {
            return false;
        };
        if engine.url().ok().flatten().as_ref() == Some(&parsed) {
            return false;
        }
        match engine.load(&parsed, headers) {
            Ok(()) => true,
            Err(e) => {
                warn!("{handle}: could not load {parsed}: {e}");
                false
            }
        }
    }

    /// Tap on the scroll affordance: jump to the top or bottom, then hide.
    pub fn dismiss_affordance(&mut self) -> Result<(), SessionError> {
        let window = self.stack.active_mut();
        let id = window.id();
        let Some(target) = window.affordance.dismiss() else {
            return Ok(());
        };
        if let Some(handle) = window.handle.as_mut() {
            let offset = target.offset(handle.content_height()?, handle.viewport()?.height);
            handle.scroll_to(offset)?;
        }
        self.screen
            .on_affordance_changed(id, ScrollAffordance::Hidden);
        Ok(())
    }

    // -- Engine events and timers --

    /// Drain every live engine, route its events, then fire due timers.
    pub fn pump(&mut self, now: Instant) {
        let mut pending = Vec::new();
        for window in self.stack.iter_mut() {
            if let Some(handle) = window.handle.as_mut() {
                let id = handle.id();
                pending.extend(handle.drain_events().into_iter().map(|e| (id, e)));
            }
        }
        for (handle, event) in pending {
            self.dispatch(handle, event, now);
        }
        self.tick(now);
    }

    /// Hide every affordance whose quiet period has elapsed.
    pub fn tick(&mut self, now: Instant) {
        for window in self.stack.iter_mut() {
            if window.affordance.poll(now) {
                self.screen
                    .on_affordance_changed(window.id(), ScrollAffordance::Hidden);
            }
        }
    }

    /// Earliest pending hide across all windows.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.stack
            .iter()
            .filter_map(|w| w.affordance().deadline())
            .min()
    }

    /// Route one engine event to the window owning `handle`. Events from
    /// engines no longer on the stack are dropped.
    pub fn dispatch(&mut self, handle: HandleId, event: EngineEvent, now: Instant) {
        if self.stack.find_by_handle(handle).is_none() {
            debug!("dropping {event:?} from stale {handle}");
            return;
        }

        match event {
            EngineEvent::CreateWindow {
                user_gesture,
                token,
            } => {
                self.request_popup(user_gesture, token);
            }
            event => self.apply_window_event(handle, event, now),
        }
    }

    fn apply_window_event(&mut self, handle: HandleId, event: EngineEvent, now: Instant) {
        let Some(window) = self.stack.find_by_handle(handle) else {
            return;
        };
        let id = window.id();

        match event {
            EngineEvent::PageStarted { url } => {
                self.screen.on_url_changed(id, url.as_str());
                window.url = Some(url);
                window.loading_state = LoadingState::Loading { progress: 0.0 };
                self.screen.on_loading_state_changed(id, &window.loading_state);
            }
            EngineEvent::HistoryUpdated { url } => {
                self.screen.on_url_changed(id, url.as_str());
                window.url = Some(url);
            }
            EngineEvent::TitleChanged { title } => {
                self.screen.on_title_changed(id, &title);
                window.page_title = Some(title);
            }
            EngineEvent::Progress { progress } => {
                window.loading_state = LoadingState::Loading {
                    progress: progress.clamp(0.0, 1.0),
                };
                self.screen.on_loading_state_changed(id, &window.loading_state);
            }
            EngineEvent::PageFinished { url } => {
                window.url = Some(url);
                window.loading_state = LoadingState::Finished;
                self.screen.on_loading_state_changed(id, &window.loading_state);
                match window.handle.as_ref().map(EngineHandle::rendered_content) {
                    Some(Ok(content)) => self.screen.on_rendered_content(id, &content),
                    Some(Err(e)) => warn!("{id}: could not read rendered content: {e}"),
                    None => {}
                }
            }
            EngineEvent::LoadFailed { description } => {
                warn!("{id}: load failed: {description}");
                window.loading_state = LoadingState::Error { description };
                self.screen.on_loading_state_changed(id, &window.loading_state);
            }
            EngineEvent::Scroll { delta_y, offset } => {
                let Some(engine) = window.handle.as_ref() else {
                    return;
                };
                let (Ok(content_height), Ok(viewport)) = (engine.content_height(), engine.viewport())
                else {
                    return;
                };
                if let Some(state) =
                    window
                        .affordance
                        .on_scroll(delta_y, offset, content_height, viewport.height, now)
                {
                    self.screen.on_affordance_changed(id, state);
                }
            }
            EngineEvent::CreateWindow { .. } => {}
        }
    }
}

impl<F: EngineFactory, S: ScreenDelegate> Drop for SessionOrchestrator<F, S> {
    fn drop(&mut self) {
        for window in self.stack.iter_mut() {
            window.close();
        }
    }
}
