/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Replays a script of UI and engine events through a session backed by
//! the headless engine and prints every screen notification as a JSON line.
//!
//! Thin wrapper around [`webview_session::SessionOrchestrator`].
//!
//! ```bash
//! webview-session 'data:text/html,<title>Hi</title>'
//! webview-session --script steps.json --header user-agent=Demo/1.0 'data:text/html,hello'
//! ```
//!
//! A script is a JSON array of steps, e.g.
//! `[{"op":"attach","node":1},{"op":"popup","user_gesture":true},{"op":"back"}]`.

use std::process;
use std::time::{Duration, Instant};

use bpaf::Bpaf;
use dpi::PhysicalSize;
use log::{error, info};
use serde::Deserialize;
use url::Url;
use webview_session::{
    BackOutcome, EngineEvent, EventQueue, HeadlessFactory, NodeId, ScreenEvent,
    SessionError, SessionOptions, SessionOrchestrator, TransportRef,
};

/// Markers of interstitial challenge pages that need the user to step in.
const CHALLENGE_MARKERS: [&str; 2] = ["window._cf_chl_opt", "Ray ID is"];

// ---------------------------------------------------------------------------
// CLI parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, usage("webview-session [OPTIONS] <URL>"))]
struct SessionConfig {
    /// Title shown until the page reports one
    #[bpaf(long, argument("TITLE"))]
    title: Option<String>,

    /// Extra request header, repeatable; user-agent also overrides the engine's
    #[bpaf(long("header"), short('H'), argument::<String>("NAME=VALUE"), parse(parse_header), many)]
    headers: Vec<(String, String)>,

    /// Quiet period before the scroll affordance hides
    #[bpaf(long, argument("MILLIS"), fallback(300u64))]
    debounce_ms: u64,

    /// Viewport width in pixels
    #[bpaf(long, argument("PIXELS"), fallback(800u32))]
    width: u32,

    /// Viewport height in pixels
    #[bpaf(long, argument("PIXELS"), fallback(600u32))]
    height: u32,

    /// Enable the engine's remote debugging hooks
    #[bpaf(long)]
    remote_debugging: bool,

    /// JSON script of steps to replay (default: attach one UI node)
    #[bpaf(long, short, argument("PATH"))]
    script: Option<String>,

    /// URL the first window opens
    #[bpaf(positional::<String>("URL"), parse(parse_url))]
    url: Url,
}

fn parse_url(s: String) -> Result<Url, String> {
    Url::parse(&s).map_err(|e| format!("Invalid URL: {e}"))
}

fn parse_header(s: String) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid header {s:?}: expected NAME=VALUE"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    /// Mount the active window into a UI node.
    Attach { node: u64 },
    /// Tear a UI node down.
    Detach { node: u64 },
    Back,
    CloseTab,
    /// The active page asks for a new window.
    Popup { user_gesture: bool },
    Scroll { delta_y: i32, offset: u32 },
    /// Let time pass without input.
    Wait { ms: u64 },
    /// Tap the scroll affordance.
    Dismiss,
    GoBack,
    GoForward,
    Reload,
    /// The active page follows a link.
    Link { url: String },
}

fn load_script(path: &str) -> Result<Vec<Step>, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid script {path}: {e}"))
}

type Orchestrator = SessionOrchestrator<HeadlessFactory, EventQueue>;

/// Run one step. Returns `false` once the screen has been left.
fn run_step(session: &mut Orchestrator, step: Step, now: &mut Instant) -> Result<bool, SessionError> {
    match step {
        Step::Attach { node } => {
            let window = session.active_window().id();
            session.attach(window, NodeId(node))?;
        }
        Step::Detach { node } => session.detach(NodeId(node)),
        Step::Back => {
            if session.back() == BackOutcome::LeftScreen {
                return Ok(false);
            }
        }
        Step::CloseTab => {
            session.close_top_window()?;
        }
        Step::Popup { user_gesture } => {
            let handle = session.active_handle_id().ok_or(SessionError::NoHandle)?;
            let token = Box::new(|transport: TransportRef| {
                info!("popup delivered to its opener through transport {}", transport.0);
            });
            session.dispatch(handle, EngineEvent::CreateWindow { user_gesture, token }, *now);
        }
        Step::Scroll { delta_y, offset } => {
            let handle = session.active_handle_id().ok_or(SessionError::NoHandle)?;
            session.dispatch(handle, EngineEvent::Scroll { delta_y, offset }, *now);
        }
        Step::Wait { ms } => *now += Duration::from_millis(ms),
        Step::Dismiss => session.dismiss_affordance()?,
        Step::GoBack => {
            session.go_back()?;
        }
        Step::GoForward => {
            session.go_forward()?;
        }
        Step::Reload => session.reload()?,
        Step::Link { url } => {
            let handle = session.active_handle_id().ok_or(SessionError::NoHandle)?;
            if !session.should_override_url_loading(handle, &url) {
                let parsed = Url::parse(&url)
                    .map_err(|e| SessionError::LoadFailed(format!("invalid URL: {e}")))?;
                session.load(&parsed)?;
            }
        }
    }
    Ok(true)
}

fn print_events(session: &mut Orchestrator) {
    for event in session.screen_mut().drain() {
        if let ScreenEvent::RenderedContent { window, content } = &event
            && CHALLENGE_MARKERS.iter().any(|m| content.contains(m))
        {
            eprintln!("Note: {window} shows a browser challenge page; complete it to continue.");
        }
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("Failed to serialize {event:?}: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = session_config().run();

    let steps = match &config.script {
        Some(path) => load_script(path).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            process::exit(1);
        }),
        None => vec![Step::Attach { node: 1 }],
    };

    let options = SessionOptions {
        initial_url: config.url,
        initial_title: config.title,
        headers: config.headers.into_iter().collect(),
        scroll_debounce: Duration::from_millis(config.debounce_ms),
        remote_debugging: config.remote_debugging,
    };
    let factory = HeadlessFactory::new(PhysicalSize::new(config.width, config.height));
    let mut session = SessionOrchestrator::new(options, factory, EventQueue::default());

    let mut now = Instant::now();
    let mut failed = false;
    for step in steps {
        let keep_going = match run_step(&mut session, step, &mut now) {
            Ok(keep_going) => keep_going,
            Err(e) => {
                eprintln!("Error: {e}");
                failed = true;
                true
            }
        };
        session.pump(now);
        print_events(&mut session);
        if !keep_going {
            break;
        }
    }

    if failed {
        drop(session);
        process::exit(1);
    }
}
