/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Multi-window browsing sessions on top of an embedded rendering engine.
//!
//! A session keeps a stack of browsing windows (the page plus any popups
//! its scripts opened), decides when an expensive engine instance must be
//! destroyed and when it only needs to be unmounted from a UI node that is
//! being rebuilt, wires popup engines back to the scripts that asked for
//! them, and drives a debounced scroll-direction affordance.
//!
//! Provides two layers:
//!
//! - **[`SessionOrchestrator`]**: single-threaded core. Drive it directly
//!   from the UI event loop that owns the engines.
//! - **[`Session`]**: thread-safe wrapper (`Send + Sync`). Runs a
//!   `SessionOrchestrator` on a dedicated thread and talks to it via
//!   channels.
//!
//! Engines plug in through [`RenderEngine`] and [`EngineFactory`];
//! [`HeadlessEngine`] is a history-only engine for `data:` documents.
//!
//! # Example (Rust, direct)
//!
//! ```no_run
//! use std::time::Instant;
//!
//! use dpi::PhysicalSize;
//! use url::Url;
//! use webview_session::{
//!     EventQueue, HeadlessFactory, NodeId, SessionOptions, SessionOrchestrator,
//! };
//!
//! let options = SessionOptions::new(Url::parse("data:text/html,hello").unwrap());
//! let factory = HeadlessFactory::new(PhysicalSize::new(800, 600));
//! let mut session = SessionOrchestrator::new(options, factory, EventQueue::default());
//!
//! let window = session.active_window().id();
//! session.attach(window, NodeId(1)).unwrap();
//! session.pump(Instant::now());
//! for event in session.screen_mut().drain() {
//!     println!("{event:?}");
//! }
//! ```

mod engine;
mod handshake;
mod headless;
mod orchestrator;
mod screen;
mod scroll;
mod session;
mod types;
mod window;

pub use engine::{EngineEvent, EngineFactory, EngineHandle, RenderEngine};
pub use handshake::{PopupDelivery, PopupHandshake, TransportRef};
pub use headless::{HeadlessEngine, HeadlessFactory, LINE_HEIGHT};
pub use orchestrator::{BackOutcome, SessionOrchestrator};
pub use screen::{EventQueue, ScreenDelegate, ScreenEvent};
pub use scroll::{ScrollAffordanceController, ScrollTarget};
pub use session::Session;
pub use types::{
    ContentTarget, HandleId, Headers, LoadingState, NodeId, ScrollAffordance, SessionError,
    SessionOptions, WindowId,
};
pub use window::{BrowsingWindow, WindowSnapshot, WindowStack};
