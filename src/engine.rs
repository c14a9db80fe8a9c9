/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The rendering-engine capability interface and the owning handle the
//! session keeps around each native instance.

use std::fmt;

use dpi::PhysicalSize;
use log::{debug, warn};
use url::Url;

use crate::handshake::{PopupDelivery, TransportRef};
use crate::types::{Headers, HandleId, NodeId, SessionError, SessionOptions};

// ---------------------------------------------------------------------------
// Engine capability interface
// ---------------------------------------------------------------------------

/// Notifications an engine instance queues for the session.
pub enum EngineEvent {
    /// A main-frame navigation started.
    PageStarted { url: Url },
    /// The history changed without a new load (fragment, pushState, reload).
    HistoryUpdated { url: Url },
    TitleChanged { title: String },
    /// Load progress in `0.0..=1.0`.
    Progress { progress: f32 },
    PageFinished { url: Url },
    LoadFailed { description: String },
    /// The viewport scrolled by `delta_y` to the new vertical `offset`.
    Scroll { delta_y: i32, offset: u32 },
    /// A page script asked for a new browsing context.
    CreateWindow {
        user_gesture: bool,
        token: Box<dyn PopupDelivery>,
    },
}

impl fmt::Debug for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::PageStarted { url } => write!(f, "PageStarted({url})"),
            EngineEvent::HistoryUpdated { url } => write!(f, "HistoryUpdated({url})"),
            EngineEvent::TitleChanged { title } => write!(f, "TitleChanged({title:?})"),
            EngineEvent::Progress { progress } => write!(f, "Progress({progress})"),
            EngineEvent::PageFinished { url } => write!(f, "PageFinished({url})"),
            EngineEvent::LoadFailed { description } => write!(f, "LoadFailed({description:?})"),
            EngineEvent::Scroll { delta_y, offset } => write!(f, "Scroll({delta_y}, {offset})"),
            EngineEvent::CreateWindow { user_gesture, .. } => {
                write!(f, "CreateWindow(user_gesture: {user_gesture})")
            }
        }
    }
}

/// One native rendering-engine instance.
///
/// Implementations only have to do what they are told; lifecycle policy
/// lives in [`EngineHandle`] and the orchestrator.
pub trait RenderEngine {
    /// Mount the instance into a UI node.
    fn attach(&mut self, node: NodeId);
    /// Unmount the instance from its UI node, keeping all page state.
    fn detach(&mut self);
    /// Release the native instance. Called exactly once.
    fn destroy(&mut self);

    fn load(&mut self, url: &Url, headers: &Headers);
    fn go_back(&mut self);
    fn go_forward(&mut self);
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;
    fn reload(&mut self);

    /// Markup of the current document.
    fn rendered_content(&self) -> String;
    fn url(&self) -> Option<Url>;
    /// Height of the laid-out document in physical pixels.
    fn content_height(&self) -> u32;
    fn viewport(&self) -> PhysicalSize<u32>;
    fn scroll_to(&mut self, offset: u32);

    fn set_user_agent(&mut self, user_agent: &str);
    fn set_scripting_enabled(&mut self, enabled: bool);
    fn enable_remote_debugging(&mut self, enabled: bool);

    /// Reference an opener page can use to talk to this instance.
    fn transport(&self) -> TransportRef;
    /// Take every event queued since the last call.
    fn drain_events(&mut self) -> Vec<EngineEvent>;
}

/// Creates engine instances on demand.
pub trait EngineFactory {
    fn create(&mut self) -> Result<Box<dyn RenderEngine>, SessionError>;
}

impl<F> EngineFactory for F
where
    F: FnMut() -> Result<Box<dyn RenderEngine>, SessionError>,
{
    fn create(&mut self) -> Result<Box<dyn RenderEngine>, SessionError> {
        self()
    }
}

// ---------------------------------------------------------------------------
// EngineHandle
// ---------------------------------------------------------------------------

/// Owning wrapper around a [`RenderEngine`]. Not `Clone`.
///
/// The handle tracks which UI node it is mounted in and refuses every call
/// once destroyed. Dropping a live handle destroys it.
pub struct EngineHandle {
    id: HandleId,
    engine: Box<dyn RenderEngine>,
    node: Option<NodeId>,
    destroyed: bool,
}

impl EngineHandle {
    pub(crate) fn new(id: HandleId, engine: Box<dyn RenderEngine>) -> Self {
        Self {
            id,
            engine,
            node: None,
            destroyed: false,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The UI node the handle is currently mounted in.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn live(&self) -> Result<&(dyn RenderEngine + 'static), SessionError> {
        if self.destroyed {
            return Err(SessionError::ResourceAlreadyDestroyed);
        }
        Ok(self.engine.as_ref())
    }

    fn live_mut(&mut self) -> Result<&mut (dyn RenderEngine + 'static), SessionError> {
        if self.destroyed {
            return Err(SessionError::ResourceAlreadyDestroyed);
        }
        Ok(self.engine.as_mut())
    }

    /// Mount into `node`, unmounting from any previous node first.
    pub fn attach(&mut self, node: NodeId) -> Result<(), SessionError> {
        let previous = self.node;
        let engine = self.live_mut()?;
        if previous == Some(node) {
            return Ok(());
        }
        if previous.is_some() {
            engine.detach();
        }
        engine.attach(node);
        self.node = Some(node);
        debug!("{} attached to {node}", self.id);
        Ok(())
    }

    /// Unmount from the current node. Returns the node it was mounted in.
    pub fn detach(&mut self) -> Result<Option<NodeId>, SessionError> {
        let previous = self.node;
        let engine = self.live_mut()?;
        if previous.is_some() {
            engine.detach();
        }
        self.node = None;
        Ok(previous)
    }

    /// Release the native instance. Returns `false` if it was already gone.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        if self.node.take().is_some() {
            self.engine.detach();
        }
        self.engine.destroy();
        self.destroyed = true;
        debug!("{} destroyed", self.id);
        true
    }

    /// Apply the baseline settings every new instance gets.
    pub fn configure(&mut self, options: &SessionOptions) -> Result<(), SessionError> {
        let engine = self.live_mut()?;
        engine.set_scripting_enabled(true);
        if let Some(user_agent) = options.user_agent() {
            engine.set_user_agent(user_agent);
        }
        if options.remote_debugging {
            engine.enable_remote_debugging(true);
        }
        Ok(())
    }

    pub fn load(&mut self, url: &Url, headers: &Headers) -> Result<(), SessionError> {
        debug!("{} loading {url}", self.id);
        self.live_mut()?.load(url, headers);
        Ok(())
    }

    /// Go back in history. Returns `false` if there is no history.
    pub fn go_back(&mut self) -> Result<bool, SessionError> {
        let engine = self.live_mut()?;
        if !engine.can_go_back() {
            return Ok(false);
        }
        engine.go_back();
        Ok(true)
    }

    /// Go forward in history. Returns `false` if there is no forward history.
    pub fn go_forward(&mut self) -> Result<bool, SessionError> {
        let engine = self.live_mut()?;
        if !engine.can_go_forward() {
            return Ok(false);
        }
        engine.go_forward();
        Ok(true)
    }

    pub fn can_go_back(&self) -> Result<bool, SessionError> {
        Ok(self.live()?.can_go_back())
    }

    pub fn can_go_forward(&self) -> Result<bool, SessionError> {
        Ok(self.live()?.can_go_forward())
    }

    pub fn reload(&mut self) -> Result<(), SessionError> {
        self.live_mut()?.reload();
        Ok(())
    }

    pub fn rendered_content(&self) -> Result<String, SessionError> {
        Ok(self.live()?.rendered_content())
    }

    pub fn url(&self) -> Result<Option<Url>, SessionError> {
        Ok(self.live()?.url())
    }

    pub fn content_height(&self) -> Result<u32, SessionError> {
        Ok(self.live()?.content_height())
    }

    pub fn viewport(&self) -> Result<PhysicalSize<u32>, SessionError> {
        Ok(self.live()?.viewport())
    }

    pub fn scroll_to(&mut self, offset: u32) -> Result<(), SessionError> {
        self.live_mut()?.scroll_to(offset);
        Ok(())
    }

    pub fn transport(&self) -> Result<TransportRef, SessionError> {
        Ok(self.live()?.transport())
    }

    /// Queued engine events; always empty once destroyed.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        match self.live_mut() {
            Ok(engine) => engine.drain_events(),
            Err(_) => Vec::new(),
        }
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if !self.destroyed {
            warn!("{} dropped while live; destroying", self.id);
            self.destroy();
        }
    }
}
