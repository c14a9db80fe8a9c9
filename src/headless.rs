/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! In-process engine that serves `about:blank` and `data:` documents.
//!
//! It renders nothing; it keeps a navigation history, reports the events a
//! real engine would, and lays documents out as fixed-height text lines.
//! Programmatic scrolls (`scroll_to`) are not reported as scroll events.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use dpi::PhysicalSize;
use log::debug;
use url::Url;

use crate::engine::{EngineEvent, EngineFactory, RenderEngine};
use crate::handshake::TransportRef;
use crate::types::{Headers, NodeId, SessionError};

/// Height of one text line in physical pixels.
pub const LINE_HEIGHT: u32 = 20;

#[derive(Debug)]
pub struct HeadlessEngine {
    transport: TransportRef,
    viewport: PhysicalSize<u32>,
    history: Vec<Url>,
    index: usize,
    content: String,
    scroll_offset: u32,
    node: Option<NodeId>,
    user_agent: Option<String>,
    scripting: bool,
    remote_debugging: bool,
    destroyed: bool,
    events: Vec<EngineEvent>,
}

impl HeadlessEngine {
    pub fn new(transport: TransportRef, viewport: PhysicalSize<u32>) -> Self {
        Self {
            transport,
            viewport,
            history: Vec::new(),
            index: 0,
            content: String::new(),
            scroll_offset: 0,
            node: None,
            user_agent: None,
            scripting: false,
            remote_debugging: false,
            destroyed: false,
            events: Vec::new(),
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn scripting_enabled(&self) -> bool {
        self.scripting
    }

    pub fn remote_debugging(&self) -> bool {
        self.remote_debugging
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Load the current history entry and queue its events.
    fn navigate_current(&mut self) {
        let Some(url) = self.history.get(self.index).cloned() else {
            return;
        };
        self.events.push(EngineEvent::PageStarted { url: url.clone() });
        self.scroll_offset = 0;

        match render(&url) {
            Ok(content) => {
                self.content = content;
                self.events.push(EngineEvent::Progress { progress: 1.0 });
                if let Some(title) = extract_title(&self.content) {
                    self.events.push(EngineEvent::TitleChanged { title });
                }
                self.events.push(EngineEvent::PageFinished { url });
            }
            Err(description) => {
                self.content.clear();
                self.events.push(EngineEvent::LoadFailed { description });
            }
        }
    }
}

/// Produce the document for `url`.
fn render(url: &Url) -> Result<String, String> {
    match url.scheme() {
        "about" if url.path() == "blank" => Ok(String::new()),
        "data" => {
            // The payload runs to the end of the URL, `?` and `#` included.
            let body = &url.as_str()["data:".len()..];
            let (meta, payload) = body
                .split_once(',')
                .ok_or_else(|| format!("malformed data URL: {url}"))?;
            let decoded = urlencoding::decode_binary(payload.as_bytes());
            let bytes = if meta.ends_with(";base64") {
                STANDARD
                    .decode(decoded.as_ref())
                    .map_err(|e| format!("invalid base64 payload: {e}"))?
            } else {
                decoded.into_owned()
            };
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        scheme => Err(format!("unsupported scheme: {scheme}")),
    }
}

fn extract_title(html: &str) -> Option<String> {
    let start = html.find("<title>")? + "<title>".len();
    let end = html[start..].find("</title>")? + start;
    let title = html[start..end].trim();
    (!title.is_empty()).then(|| title.to_string())
}

impl RenderEngine for HeadlessEngine {
    fn attach(&mut self, node: NodeId) {
        self.node = Some(node);
    }

    fn detach(&mut self) {
        self.node = None;
    }

    fn destroy(&mut self) {
        debug!("headless engine {:?} released", self.transport);
        self.destroyed = true;
        self.events.clear();
    }

    fn load(&mut self, url: &Url, _headers: &Headers) {
        if !self.history.is_empty() {
            self.history.truncate(self.index + 1);
        }
        self.history.push(url.clone());
        self.index = self.history.len() - 1;
        self.navigate_current();
    }

    fn go_back(&mut self) {
        if self.can_go_back() {
            self.index -= 1;
            self.navigate_current();
        }
    }

    fn go_forward(&mut self) {
        if self.can_go_forward() {
            self.index += 1;
            self.navigate_current();
        }
    }

    fn can_go_back(&self) -> bool {
        !self.history.is_empty() && self.index > 0
    }

    fn can_go_forward(&self) -> bool {
        self.index + 1 < self.history.len()
    }

    fn reload(&mut self) {
        self.navigate_current();
    }

    fn rendered_content(&self) -> String {
        self.content.clone()
    }

    fn url(&self) -> Option<Url> {
        self.history.get(self.index).cloned()
    }

    fn content_height(&self) -> u32 {
        let lines = self.content.lines().count() as u32;
        lines.saturating_mul(LINE_HEIGHT)
    }

    fn viewport(&self) -> PhysicalSize<u32> {
        self.viewport
    }

    fn scroll_to(&mut self, offset: u32) {
        let max = self.content_height().saturating_sub(self.viewport.height);
        self.scroll_offset = offset.min(max);
    }

    fn set_user_agent(&mut self, user_agent: &str) {
        self.user_agent = Some(user_agent.to_string());
    }

    fn set_scripting_enabled(&mut self, enabled: bool) {
        self.scripting = enabled;
    }

    fn enable_remote_debugging(&mut self, enabled: bool) {
        self.remote_debugging = enabled;
    }

    fn transport(&self) -> TransportRef {
        self.transport
    }

    fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }
}

/// Factory handing out [`HeadlessEngine`]s with sequential transports.
#[derive(Debug, Clone)]
pub struct HeadlessFactory {
    viewport: PhysicalSize<u32>,
    next_transport: u64,
}

impl HeadlessFactory {
    pub fn new(viewport: PhysicalSize<u32>) -> Self {
        Self {
            viewport,
            next_transport: 1,
        }
    }
}

impl EngineFactory for HeadlessFactory {
    fn create(&mut self) -> Result<Box<dyn RenderEngine>, SessionError> {
        let transport = TransportRef(self.next_transport);
        self.next_transport += 1;
        Ok(Box::new(HeadlessEngine::new(transport, self.viewport)))
    }
}
