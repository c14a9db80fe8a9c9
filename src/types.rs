/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shared public types used across all layers.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Extra HTTP headers sent with every navigation a window issues.
pub type Headers = BTreeMap<String, String>;

/// Identifies a browsing window for as long as it lives on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

/// Identifies a rendering-engine handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(pub u64);

/// Identifies the UI node a handle is mounted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Options for configuring a browsing session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// URL the root window navigates to (default: `about:blank`).
    pub initial_url: Url,
    /// Title shown until the active page reports one.
    pub initial_title: Option<String>,
    /// Headers sent with navigations; a `user-agent` entry also overrides
    /// the engine's user agent.
    pub headers: Headers,
    /// Quiet period before the scroll affordance hides (default: 300 ms).
    pub scroll_debounce: Duration,
    /// Enable the engine's remote debugging hooks (default: debug builds only).
    pub remote_debugging: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            initial_url: Url::parse("about:blank").expect("static URL is valid"),
            initial_title: None,
            headers: Headers::new(),
            scroll_debounce: Duration::from_millis(300),
            remote_debugging: cfg!(debug_assertions),
        }
    }
}

impl SessionOptions {
    /// Options for a session opening `url`.
    pub fn new(initial_url: Url) -> Self {
        Self {
            initial_url,
            ..Self::default()
        }
    }

    /// The user agent override carried in the headers, if any.
    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .map(|(_, value)| value.as_str())
    }
}

/// What a window shows the next time a handle is attached to it.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentTarget {
    /// Navigate to `url` unless the handle already shows it.
    NavigateTo { url: Url, headers: Headers },
    /// Resume whatever the handle already has loaded.
    NavigatorOnly,
}

/// Loading progress of a window's current page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadingState {
    Initializing,
    Loading { progress: f32 },
    Finished,
    Error { description: String },
}

/// Scroll-direction affordance shown over the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollAffordance {
    #[default]
    Hidden,
    /// Offer a jump to the bottom of the page.
    ShowDown,
    /// Offer a jump to the top of the page.
    ShowUp,
}

/// Errors that can occur during session operations.
#[derive(Debug)]
pub enum SessionError {
    /// The operation is not valid in the current state (e.g. popping the
    /// last window, attaching to a window that is not active).
    InvalidOperation(String),
    /// The handle was already destroyed.
    ResourceAlreadyDestroyed,
    /// The popup handshake was already resolved.
    HandshakeAlreadyResolved,
    /// A popup was requested without a user gesture.
    PopupRejected,
    /// The engine factory failed to create an instance.
    EngineInitFailed(String),
    /// A navigation could not be started.
    LoadFailed(String),
    /// The active window has no handle attached yet.
    NoHandle,
    /// Internal channel was closed (thread-safe wrapper).
    ChannelClosed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidOperation(msg) => write!(f, "invalid operation: {msg}"),
            SessionError::ResourceAlreadyDestroyed => write!(f, "engine handle already destroyed"),
            SessionError::HandshakeAlreadyResolved => write!(f, "popup handshake already resolved"),
            SessionError::PopupRejected => write!(f, "popup rejected without user gesture"),
            SessionError::EngineInitFailed(msg) => write!(f, "engine initialization failed: {msg}"),
            SessionError::LoadFailed(msg) => write!(f, "page load failed: {msg}"),
            SessionError::NoHandle => write!(f, "no engine handle attached"),
            SessionError::ChannelClosed => write!(f, "internal channel closed"),
        }
    }
}

impl std::error::Error for SessionError {}
