/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Integration tests for `SessionOrchestrator`.
//!
//! All tests drive the orchestrator with a recording engine whose state is
//! shared with the test through `Rc<RefCell<..>>`, so every create, mount,
//! load and destroy the orchestrator performs can be observed directly.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use dpi::PhysicalSize;
use url::Url;
use webview_session::{
    BackOutcome, ContentTarget, EngineEvent, EngineFactory, EventQueue, HandleId, Headers,
    LoadingState, NodeId, PopupDelivery, RenderEngine, ScreenEvent, ScrollAffordance,
    SessionError, SessionOptions, SessionOrchestrator, TransportRef, WindowId,
};

// ---------------------------------------------------------------------------
// Recording engine
// ---------------------------------------------------------------------------

const START_URL: &str = "https://example.com/start";
const CONTENT_HEIGHT: u32 = 2000;
const VIEWPORT_HEIGHT: u32 = 800;

#[derive(Default)]
struct EngineState {
    node: Option<NodeId>,
    destroy_calls: u32,
    loads: Vec<(Url, Headers)>,
    reloads: u32,
    url: Option<Url>,
    user_agent: Option<String>,
    scripting: bool,
    debugging: bool,
    scrolled_to: Vec<u32>,
    content: String,
    queued: Vec<EngineEvent>,
}

#[derive(Default)]
struct Log {
    engines: Vec<EngineState>,
}

type SharedLog = Rc<RefCell<Log>>;

struct RecordingEngine {
    index: usize,
    log: SharedLog,
}

impl RecordingEngine {
    fn with<R>(&self, f: impl FnOnce(&mut EngineState) -> R) -> R {
        f(&mut self.log.borrow_mut().engines[self.index])
    }
}

impl RenderEngine for RecordingEngine {
    fn attach(&mut self, node: NodeId) {
        self.with(|s| s.node = Some(node));
    }

    fn detach(&mut self) {
        self.with(|s| s.node = None);
    }

    fn destroy(&mut self) {
        self.with(|s| s.destroy_calls += 1);
    }

    fn load(&mut self, url: &Url, headers: &Headers) {
        self.with(|s| {
            s.loads.push((url.clone(), headers.clone()));
            s.url = Some(url.clone());
            s.queued.push(EngineEvent::PageStarted { url: url.clone() });
            s.queued.push(EngineEvent::PageFinished { url: url.clone() });
        });
    }

    fn go_back(&mut self) {}

    fn go_forward(&mut self) {}

    fn can_go_back(&self) -> bool {
        self.with(|s| s.loads.len() > 1)
    }

    fn can_go_forward(&self) -> bool {
        false
    }

    fn reload(&mut self) {
        self.with(|s| s.reloads += 1);
    }

    fn rendered_content(&self) -> String {
        self.with(|s| s.content.clone())
    }

    fn url(&self) -> Option<Url> {
        self.with(|s| s.url.clone())
    }

    fn content_height(&self) -> u32 {
        CONTENT_HEIGHT
    }

    fn viewport(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(600, VIEWPORT_HEIGHT)
    }

    fn scroll_to(&mut self, offset: u32) {
        self.with(|s| s.scrolled_to.push(offset));
    }

    fn set_user_agent(&mut self, user_agent: &str) {
        self.with(|s| s.user_agent = Some(user_agent.to_string()));
    }

    fn set_scripting_enabled(&mut self, enabled: bool) {
        self.with(|s| s.scripting = enabled);
    }

    fn enable_remote_debugging(&mut self, enabled: bool) {
        self.with(|s| s.debugging = enabled);
    }

    fn transport(&self) -> TransportRef {
        TransportRef(100 + self.index as u64)
    }

    fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.with(|s| std::mem::take(&mut s.queued))
    }
}

struct RecordingFactory {
    log: SharedLog,
}

impl EngineFactory for RecordingFactory {
    fn create(&mut self) -> Result<Box<dyn RenderEngine>, SessionError> {
        let mut log = self.log.borrow_mut();
        log.engines.push(EngineState::default());
        Ok(Box::new(RecordingEngine {
            index: log.engines.len() - 1,
            log: self.log.clone(),
        }))
    }
}

type Orchestrator = SessionOrchestrator<RecordingFactory, EventQueue>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn options() -> SessionOptions {
    let mut options = SessionOptions::new(Url::parse(START_URL).unwrap());
    options.remote_debugging = false;
    options
}

fn session_with(options: SessionOptions) -> (Orchestrator, SharedLog) {
    let log = SharedLog::default();
    let factory = RecordingFactory { log: log.clone() };
    (
        SessionOrchestrator::new(options, factory, EventQueue::default()),
        log,
    )
}

/// A session whose root window is attached to node 1, with the initial
/// load's events already consumed.
fn opened() -> (Orchestrator, SharedLog, Instant) {
    let (mut s, log) = session_with(options());
    let t0 = Instant::now();
    s.attach(WindowId(0), NodeId(1)).expect("attach root window");
    s.pump(t0);
    s.screen_mut().drain();
    (s, log, t0)
}

fn engine<R>(log: &SharedLog, index: usize, f: impl FnOnce(&EngineState) -> R) -> R {
    f(&log.borrow().engines[index])
}

fn queue(log: &SharedLog, index: usize, event: EngineEvent) {
    log.borrow_mut().engines[index].queued.push(event);
}

fn engine_count(log: &SharedLog) -> usize {
    log.borrow().engines.len()
}

/// A popup token that records every transport delivered through it.
fn recorder() -> (Box<dyn PopupDelivery>, Rc<RefCell<Vec<TransportRef>>>) {
    let delivered = Rc::new(RefCell::new(Vec::new()));
    let sink = delivered.clone();
    let token = Box::new(move |t: TransportRef| sink.borrow_mut().push(t));
    (token, delivered)
}

/// Open a gesture-initiated popup from engine 0.
fn open_popup(s: &mut Orchestrator, log: &SharedLog, now: Instant) -> Rc<RefCell<Vec<TransportRef>>> {
    let (token, delivered) = recorder();
    queue(
        log,
        0,
        EngineEvent::CreateWindow {
            user_gesture: true,
            token,
        },
    );
    s.pump(now);
    delivered
}

fn assert_single_mounted_engine(s: &Orchestrator) {
    let mounted: Vec<WindowId> = s
        .stack()
        .iter()
        .filter(|w| w.attached_node().is_some())
        .map(|w| w.id())
        .collect();
    assert!(mounted.len() <= 1, "more than one mounted engine: {mounted:?}");
    if let Some(id) = mounted.first() {
        assert_eq!(*id, s.active_window().id(), "only the top window may be mounted");
    }
}

// ---------------------------------------------------------------------------
// Group 1: Attach
// ---------------------------------------------------------------------------

#[test]
fn test_first_attach_creates_configures_and_navigates() {
    let (mut s, log) = session_with(options());
    let handle = s.attach(WindowId(0), NodeId(1)).unwrap();

    assert_eq!(handle, HandleId(0));
    assert_eq!(engine_count(&log), 1);
    engine(&log, 0, |e| {
        assert_eq!(e.node, Some(NodeId(1)));
        assert!(e.scripting);
        assert!(!e.debugging);
        assert_eq!(e.user_agent, None);
        assert_eq!(e.loads.len(), 1);
        assert_eq!(e.loads[0].0.as_str(), START_URL);
    });
}

#[test]
fn test_user_agent_header_overrides_engine() {
    let mut opts = options();
    opts.headers
        .insert("User-Agent".to_string(), "Reader/2.0".to_string());
    opts.headers
        .insert("Referer".to_string(), "https://example.com/".to_string());
    let (mut s, log) = session_with(opts);
    s.attach(WindowId(0), NodeId(1)).unwrap();

    engine(&log, 0, |e| {
        assert_eq!(e.user_agent.as_deref(), Some("Reader/2.0"));
        let headers = &e.loads[0].1;
        assert_eq!(headers.get("Referer").map(String::as_str), Some("https://example.com/"));
    });
}

#[test]
fn test_remote_debugging_follows_options() {
    let mut opts = options();
    opts.remote_debugging = true;
    let (mut s, log) = session_with(opts);
    s.attach(WindowId(0), NodeId(1)).unwrap();
    assert!(engine(&log, 0, |e| e.debugging));
}

#[test]
fn test_attach_to_inactive_window_fails() {
    let (mut s, log, t0) = opened();
    open_popup(&mut s, &log, t0);

    match s.attach(WindowId(0), NodeId(5)) {
        Err(SessionError::InvalidOperation(msg)) => {
            assert!(msg.contains("not the active window"), "msg: {msg}")
        }
        other => panic!("expected InvalidOperation, got: {other:?}"),
    }
}

#[test]
fn test_reattach_to_new_node_moves_engine() {
    let (mut s, log, _) = opened();
    let handle = s.attach(WindowId(0), NodeId(2)).unwrap();

    assert_eq!(handle, HandleId(0));
    assert_eq!(engine_count(&log), 1);
    engine(&log, 0, |e| {
        assert_eq!(e.node, Some(NodeId(2)));
        assert_eq!(e.loads.len(), 1, "reattach must not renavigate");
    });
}

#[test]
fn test_reattach_after_navigation_keeps_current_page() {
    let (mut s, log, t0) = opened();
    let elsewhere = Url::parse("https://example.com/elsewhere").unwrap();
    s.load(&elsewhere).unwrap();
    s.pump(t0);

    s.attach(WindowId(0), NodeId(2)).unwrap();
    engine(&log, 0, |e| {
        let loaded: Vec<&str> = e.loads.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(loaded, vec![START_URL, "https://example.com/elsewhere"]);
        assert_eq!(e.url.as_ref(), Some(&elsewhere));
    });
}

#[test]
fn test_reattach_same_node_after_redirect_does_not_reload() {
    let (mut s, log, _) = opened();
    let redirected = Url::parse("https://example.com/redirected").unwrap();
    log.borrow_mut().engines[0].url = Some(redirected.clone());

    s.attach(WindowId(0), NodeId(1)).unwrap();
    engine(&log, 0, |e| {
        assert_eq!(e.loads.len(), 1);
        assert_eq!(e.url.as_ref(), Some(&redirected));
    });
}

// ---------------------------------------------------------------------------
// Group 2: Detach / ownership
// ---------------------------------------------------------------------------

#[test]
fn test_detach_then_attach_preserves_engine() {
    let (mut s, log, _) = opened();

    s.detach(NodeId(1));
    assert_eq!(s.active_window().content, ContentTarget::NavigatorOnly);
    engine(&log, 0, |e| {
        assert_eq!(e.node, None);
        assert_eq!(e.destroy_calls, 0);
    });

    let handle = s.attach(WindowId(0), NodeId(2)).unwrap();
    assert_eq!(handle, HandleId(0));
    assert_eq!(engine_count(&log), 1);
    engine(&log, 0, |e| {
        assert_eq!(e.node, Some(NodeId(2)));
        assert_eq!(e.loads.len(), 1, "NavigatorOnly must not renavigate");
    });
}

#[test]
fn test_detach_unknown_node_is_noop() {
    let (mut s, log, _) = opened();
    s.detach(NodeId(42));
    engine(&log, 0, |e| {
        assert_eq!(e.node, Some(NodeId(1)));
        assert_eq!(e.destroy_calls, 0);
    });
    assert!(matches!(
        s.active_window().content,
        ContentTarget::NavigateTo { .. }
    ));
}

#[test]
fn test_closed_window_engine_destroyed_exactly_once() {
    let (mut s, log, t0) = opened();
    open_popup(&mut s, &log, t0);
    s.attach(WindowId(1), NodeId(2)).unwrap();

    assert_eq!(s.back(), BackOutcome::ClosedWindow(WindowId(1)));
    assert_eq!(engine(&log, 1, |e| e.destroy_calls), 1);
    assert_eq!(engine(&log, 1, |e| e.node), None);

    // The UI tears the popup's node down afterwards.
    s.detach(NodeId(2));
    s.detach(NodeId(2));
    assert_eq!(engine(&log, 1, |e| e.destroy_calls), 1);
    assert_eq!(engine(&log, 0, |e| e.destroy_calls), 0);
}

#[test]
fn test_dropping_session_destroys_every_engine_once() {
    let (mut s, log, t0) = opened();
    open_popup(&mut s, &log, t0);
    s.attach(WindowId(1), NodeId(2)).unwrap();
    drop(s);

    assert_eq!(engine(&log, 0, |e| e.destroy_calls), 1);
    assert_eq!(engine(&log, 1, |e| e.destroy_calls), 1);
}

// ---------------------------------------------------------------------------
// Group 3: Stack navigation
// ---------------------------------------------------------------------------

#[test]
fn test_back_on_last_window_leaves_screen() {
    let (mut s, log, _) = opened();

    assert_eq!(s.back(), BackOutcome::LeftScreen);
    assert_eq!(s.stack().len(), 1);
    assert_eq!(s.screen_mut().drain(), vec![ScreenEvent::LeaveScreen]);
    engine(&log, 0, |e| {
        assert_eq!(e.destroy_calls, 0);
        assert_eq!(e.node, Some(NodeId(1)));
    });
}

#[test]
fn test_close_top_window_on_last_window_fails() {
    let (mut s, _log, _) = opened();
    assert!(!s.can_close_top_window());
    match s.close_top_window() {
        Err(SessionError::InvalidOperation(_)) => {}
        other => panic!("expected InvalidOperation, got: {other:?}"),
    }
    assert_eq!(s.stack().len(), 1);
    assert!(s.screen_mut().drain().is_empty());
}

#[test]
fn test_leave_screen_always_signals() {
    let (mut s, log, t0) = opened();
    open_popup(&mut s, &log, t0);
    s.screen_mut().drain();

    s.leave_screen();
    assert_eq!(s.screen_mut().drain(), vec![ScreenEvent::LeaveScreen]);
    assert_eq!(s.stack().len(), 2);
}

#[test]
fn test_closing_popup_resumes_opener() {
    let (mut s, log, t0) = opened();
    open_popup(&mut s, &log, t0);
    s.attach(WindowId(1), NodeId(2)).unwrap();
    s.screen_mut().drain();

    s.close_top_window().unwrap();
    assert_eq!(
        s.screen_mut().drain().first(),
        Some(&ScreenEvent::ActiveWindowChanged {
            window: WindowId(0)
        })
    );

    let handle = s.attach(WindowId(0), NodeId(3)).unwrap();
    assert_eq!(handle, HandleId(0));
    engine(&log, 0, |e| {
        assert_eq!(e.loads.len(), 1);
        assert_eq!(e.node, Some(NodeId(3)));
    });
    assert_single_mounted_engine(&s);
}

// ---------------------------------------------------------------------------
// Group 4: Popups
// ---------------------------------------------------------------------------

#[test]
fn test_popup_without_gesture_is_rejected() {
    let (mut s, log, t0) = opened();
    let (token, delivered) = recorder();
    queue(
        &log,
        0,
        EngineEvent::CreateWindow {
            user_gesture: false,
            token,
        },
    );
    s.pump(t0);

    assert_eq!(s.stack().len(), 1);
    assert!(delivered.borrow().is_empty());
    assert!(s.screen_mut().drain().is_empty());
    assert_eq!(engine(&log, 0, |e| e.node), Some(NodeId(1)));
}

#[test]
fn test_popup_handshake_resolves_on_first_attach() {
    let (mut s, log, t0) = opened();
    let delivered = open_popup(&mut s, &log, t0);

    assert_eq!(s.stack().len(), 2);
    let popup = s.active_window();
    assert_eq!(popup.id(), WindowId(1));
    assert_eq!(popup.content, ContentTarget::NavigatorOnly);
    assert!(!popup.pending_handshake().unwrap().is_resolved());
    assert_eq!(
        s.screen_mut().drain(),
        vec![ScreenEvent::ActiveWindowChanged {
            window: WindowId(1)
        }]
    );

    // The opener is unmounted as soon as the popup covers it.
    engine(&log, 0, |e| assert_eq!(e.node, None));
    assert_eq!(
        s.stack().get(WindowId(0)).unwrap().content,
        ContentTarget::NavigatorOnly
    );
    assert_single_mounted_engine(&s);

    s.attach(WindowId(1), NodeId(2)).unwrap();
    assert!(s.active_window().pending_handshake().unwrap().is_resolved());
    assert_eq!(*delivered.borrow(), vec![TransportRef(101)]);
    assert!(engine(&log, 1, |e| e.loads.is_empty()), "popup must not navigate");

    // Remounting the popup never delivers again.
    s.detach(NodeId(2));
    s.attach(WindowId(1), NodeId(3)).unwrap();
    assert_eq!(delivered.borrow().len(), 1);
    assert_single_mounted_engine(&s);
}

#[test]
fn test_popup_closed_before_attach_is_never_resolved() {
    let (mut s, log, t0) = opened();
    let delivered = open_popup(&mut s, &log, t0);

    assert_eq!(s.back(), BackOutcome::ClosedWindow(WindowId(1)));
    assert!(delivered.borrow().is_empty());
    assert_eq!(engine_count(&log), 1);
    assert_eq!(s.stack().len(), 1);
}

#[test]
fn test_events_from_closed_window_are_dropped() {
    let (mut s, log, t0) = opened();
    open_popup(&mut s, &log, t0);
    s.attach(WindowId(1), NodeId(2)).unwrap();
    s.back();
    s.screen_mut().drain();

    s.dispatch(
        HandleId(1),
        EngineEvent::TitleChanged {
            title: "stale".into(),
        },
        t0,
    );
    assert!(s.screen_mut().drain().is_empty());
    assert_eq!(s.title(), None);
}

// ---------------------------------------------------------------------------
// Group 5: Page state
// ---------------------------------------------------------------------------

#[test]
fn test_page_events_reach_the_screen() {
    let (mut s, log, t0) = opened();
    let url = Url::parse("https://example.com/docs").unwrap();
    log.borrow_mut().engines[0].content = "<html>Ray ID is 123</html>".into();

    for event in [
        EngineEvent::PageStarted { url: url.clone() },
        EngineEvent::Progress { progress: 0.5 },
        EngineEvent::TitleChanged {
            title: "Docs".into(),
        },
        EngineEvent::PageFinished { url: url.clone() },
    ] {
        queue(&log, 0, event);
    }
    s.pump(t0);

    let w = WindowId(0);
    assert_eq!(
        s.screen_mut().drain(),
        vec![
            ScreenEvent::UrlChanged {
                window: w,
                url: url.to_string()
            },
            ScreenEvent::LoadingStateChanged {
                window: w,
                state: LoadingState::Loading { progress: 0.0 }
            },
            ScreenEvent::LoadingStateChanged {
                window: w,
                state: LoadingState::Loading { progress: 0.5 }
            },
            ScreenEvent::TitleChanged {
                window: w,
                title: "Docs".into()
            },
            ScreenEvent::LoadingStateChanged {
                window: w,
                state: LoadingState::Finished
            },
            ScreenEvent::RenderedContent {
                window: w,
                content: "<html>Ray ID is 123</html>".into()
            },
        ]
    );
    assert_eq!(s.title(), Some("Docs"));
    assert_eq!(s.current_url(), Some(&url));
}

#[test]
fn test_title_falls_back_to_initial_title() {
    let mut opts = options();
    opts.initial_title = Some("Source".into());
    let (s, _log) = session_with(opts);
    assert_eq!(s.title(), Some("Source"));
}

#[test]
fn test_progress_is_clamped() {
    let (mut s, log, t0) = opened();
    queue(&log, 0, EngineEvent::Progress { progress: 3.0 });
    s.pump(t0);
    assert_eq!(
        s.active_window().loading_state,
        LoadingState::Loading { progress: 1.0 }
    );
}

#[test]
fn test_load_failure_keeps_window_usable() {
    let (mut s, log, t0) = opened();
    queue(
        &log,
        0,
        EngineEvent::LoadFailed {
            description: "net::ERR_NAME_NOT_RESOLVED".into(),
        },
    );
    s.pump(t0);

    assert_eq!(
        s.active_window().loading_state,
        LoadingState::Error {
            description: "net::ERR_NAME_NOT_RESOLVED".into()
        }
    );
    s.reload().expect("reload after failure");
    assert_eq!(engine(&log, 0, |e| e.reloads), 1);
    assert_eq!(s.stack().len(), 1);
}

#[test]
fn test_navigation_without_engine_reports_no_handle() {
    let (mut s, _log) = session_with(options());
    assert!(matches!(s.reload(), Err(SessionError::NoHandle)));
    assert!(matches!(s.go_back(), Err(SessionError::NoHandle)));
    assert!(!s.can_go_back());
    assert!(!s.can_go_forward());
}

#[test]
fn test_go_back_reports_history() {
    let (mut s, _log, _) = opened();
    assert!(!s.can_go_back());
    assert!(!s.go_back().unwrap());

    s.load(&Url::parse("https://example.com/next").unwrap()).unwrap();
    assert!(s.can_go_back());
    assert!(s.go_back().unwrap());
    assert!(!s.go_forward().unwrap());
}

// ---------------------------------------------------------------------------
// Group 6: URL override policy
// ---------------------------------------------------------------------------

#[test]
fn test_url_override_policy() {
    let mut opts = options();
    opts.headers.insert("X-Token".into(), "abc".into());
    let (mut s, log) = session_with(opts);
    let handle = s.attach(WindowId(0), NodeId(1)).unwrap();

    assert!(s.should_override_url_loading(handle, "intent://scan/#Intent;end"));
    assert_eq!(engine(&log, 0, |e| e.loads.len()), 1);

    assert!(!s.should_override_url_loading(handle, START_URL));
    assert!(!s.should_override_url_loading(handle, "data:text/html,hi"));
    assert!(!s.should_override_url_loading(handle, "not a url"));

    assert!(s.should_override_url_loading(handle, "https://example.com/other"));
    engine(&log, 0, |e| {
        assert_eq!(e.loads.len(), 2);
        let (url, headers) = &e.loads[1];
        assert_eq!(url.as_str(), "https://example.com/other");
        assert_eq!(headers.get("X-Token").map(String::as_str), Some("abc"));
    });

    assert!(!s.should_override_url_loading(HandleId(99), "https://example.com/x"));
}

// ---------------------------------------------------------------------------
// Group 7: Scroll affordance
// ---------------------------------------------------------------------------

fn scroll(s: &mut Orchestrator, log: &SharedLog, delta_y: i32, offset: u32, now: Instant) {
    queue(log, 0, EngineEvent::Scroll { delta_y, offset });
    s.pump(now);
}

#[test]
fn test_scroll_down_shows_then_hides_after_quiet_period() {
    let (mut s, log, t0) = opened();

    scroll(&mut s, &log, 50, 100, t0);
    assert_eq!(s.affordance(), ScrollAffordance::ShowDown);
    assert_eq!(s.next_deadline(), Some(t0 + Duration::from_millis(300)));

    s.pump(t0 + Duration::from_millis(299));
    assert_eq!(s.affordance(), ScrollAffordance::ShowDown);

    s.pump(t0 + Duration::from_millis(300));
    assert_eq!(s.affordance(), ScrollAffordance::Hidden);
    assert_eq!(s.next_deadline(), None);
    assert_eq!(
        s.screen_mut().drain(),
        vec![
            ScreenEvent::AffordanceChanged {
                window: WindowId(0),
                affordance: ScrollAffordance::ShowDown
            },
            ScreenEvent::AffordanceChanged {
                window: WindowId(0),
                affordance: ScrollAffordance::Hidden
            },
        ]
    );
}

#[test]
fn test_continuous_scrolling_never_hides() {
    let (mut s, log, t0) = opened();

    let mut now = t0;
    for i in 0..30u32 {
        now = t0 + Duration::from_millis(100 * u64::from(i));
        scroll(&mut s, &log, 10, 100 + i, now);
        assert_eq!(s.affordance(), ScrollAffordance::ShowDown, "hid at step {i}");
    }

    s.pump(now + Duration::from_millis(299));
    assert_eq!(s.affordance(), ScrollAffordance::ShowDown);
    s.pump(now + Duration::from_millis(300));
    assert_eq!(s.affordance(), ScrollAffordance::Hidden);
}

#[test]
fn test_scroll_direction_changes() {
    let (mut s, log, t0) = opened();
    scroll(&mut s, &log, 50, 100, t0);
    assert_eq!(s.affordance(), ScrollAffordance::ShowDown);
    scroll(&mut s, &log, -30, 70, t0);
    assert_eq!(s.affordance(), ScrollAffordance::ShowUp);
}

#[test]
fn test_dismiss_scrolls_to_bottom_or_top() {
    let (mut s, log, t0) = opened();

    scroll(&mut s, &log, 50, 100, t0);
    s.screen_mut().drain();
    s.dismiss_affordance().unwrap();
    assert_eq!(s.affordance(), ScrollAffordance::Hidden);
    assert_eq!(s.next_deadline(), None);
    assert_eq!(
        engine(&log, 0, |e| e.scrolled_to.clone()),
        vec![CONTENT_HEIGHT - VIEWPORT_HEIGHT]
    );
    assert_eq!(
        s.screen_mut().drain(),
        vec![ScreenEvent::AffordanceChanged {
            window: WindowId(0),
            affordance: ScrollAffordance::Hidden
        }]
    );

    scroll(&mut s, &log, -50, 600, t0);
    s.dismiss_affordance().unwrap();
    assert_eq!(
        engine(&log, 0, |e| e.scrolled_to.clone()),
        vec![CONTENT_HEIGHT - VIEWPORT_HEIGHT, 0]
    );

    // Nothing shown: nothing to do.
    s.dismiss_affordance().unwrap();
    assert_eq!(engine(&log, 0, |e| e.scrolled_to.len()), 2);
}

#[test]
fn test_closing_window_cancels_pending_hide() {
    let (mut s, log, t0) = opened();
    open_popup(&mut s, &log, t0);
    s.attach(WindowId(1), NodeId(2)).unwrap();

    queue(&log, 1, EngineEvent::Scroll { delta_y: 40, offset: 40 });
    s.pump(t0);
    assert_eq!(s.affordance(), ScrollAffordance::ShowDown);
    assert!(s.next_deadline().is_some());

    s.back();
    assert_eq!(s.next_deadline(), None);
    s.screen_mut().drain();
    s.pump(t0 + Duration::from_secs(1));
    assert!(s.screen_mut().drain().is_empty(), "no hide may fire after close");
}
