/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Layer 2: `Session`, a thread-safe wrapper (`Send + Sync`).

use std::sync::Mutex;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use url::Url;

use crate::engine::EngineFactory;
use crate::orchestrator::{BackOutcome, SessionOrchestrator};
use crate::screen::{EventQueue, ScreenEvent};
use crate::types::{HandleId, NodeId, ScrollAffordance, SessionError, SessionOptions, WindowId};
use crate::window::WindowSnapshot;

/// Longest the session thread waits for a command before pumping engines.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait until the next pending hide, or the idle interval if none is sooner.
fn poll_timeout(next_deadline: Option<Instant>, now: Instant) -> Duration {
    next_deadline
        .map(|deadline| deadline.saturating_duration_since(now))
        .map_or(IDLE_POLL_INTERVAL, |due| due.min(IDLE_POLL_INTERVAL))
}

/// Commands sent from the `Session` handle to the background thread.
enum Command {
    Attach {
        window: WindowId,
        node: NodeId,
        response: mpsc::Sender<Result<HandleId, SessionError>>,
    },
    Detach {
        node: NodeId,
        response: mpsc::Sender<()>,
    },
    Back {
        response: mpsc::Sender<BackOutcome>,
    },
    LeaveScreen {
        response: mpsc::Sender<()>,
    },
    CanCloseTopWindow {
        response: mpsc::Sender<bool>,
    },
    ActiveWindow {
        response: mpsc::Sender<WindowId>,
    },
    CloseTopWindow {
        response: mpsc::Sender<Result<WindowId, SessionError>>,
    },
    Load {
        url: Url,
        response: mpsc::Sender<Result<(), SessionError>>,
    },
    GoBack {
        response: mpsc::Sender<Result<bool, SessionError>>,
    },
    GoForward {
        response: mpsc::Sender<Result<bool, SessionError>>,
    },
    CanGoBack {
        response: mpsc::Sender<bool>,
    },
    CanGoForward {
        response: mpsc::Sender<bool>,
    },
    Reload {
        response: mpsc::Sender<Result<(), SessionError>>,
    },
    ShouldOverrideUrlLoading {
        handle: HandleId,
        url: String,
        response: mpsc::Sender<bool>,
    },
    DismissAffordance {
        response: mpsc::Sender<Result<(), SessionError>>,
    },
    Affordance {
        response: mpsc::Sender<ScrollAffordance>,
    },
    Title {
        response: mpsc::Sender<Option<String>>,
    },
    Url {
        response: mpsc::Sender<Option<String>>,
    },
    Windows {
        response: mpsc::Sender<Vec<WindowSnapshot>>,
    },
    Events {
        response: mpsc::Sender<Vec<ScreenEvent>>,
    },
    Shutdown,
}

/// Thread-safe session handle. `Send + Sync`.
///
/// Spawns a dedicated background thread that owns the
/// [`SessionOrchestrator`] and every engine instance. All window and engine
/// mutation happens on that thread; callers communicate via channels.
pub struct Session {
    sender: Mutex<mpsc::Sender<Command>>,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Session {
    /// Start a session. `build_factory` runs on the session thread, so the
    /// factory and its engines never leave it.
    pub fn new<F, B>(options: SessionOptions, build_factory: B) -> Result<Self, SessionError>
    where
        F: EngineFactory + 'static,
        B: FnOnce() -> Result<F, SessionError> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), SessionError>>();

        let thread = thread::spawn(move || {
            let factory = match build_factory() {
                Ok(factory) => {
                    let _ = init_tx.send(Ok(()));
                    factory
                }
                Err(e) => {
                    let _ = init_tx.send(Err(e));
                    return;
                }
            };
            let mut orchestrator =
                SessionOrchestrator::new(options, factory, EventQueue::default());

            loop {
                let timeout = poll_timeout(orchestrator.next_deadline(), Instant::now());
                let cmd = match cmd_rx.recv_timeout(timeout) {
                    Ok(cmd) => Some(cmd),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                };

                match cmd {
                    Some(Command::Attach {
                        window,
                        node,
                        response,
                    }) => {
                        let _ = response.send(orchestrator.attach(window, node));
                    }
                    Some(Command::Detach { node, response }) => {
                        orchestrator.detach(node);
                        let _ = response.send(());
                    }
                    Some(Command::Back { response }) => {
                        let _ = response.send(orchestrator.back());
                    }
                    Some(Command::LeaveScreen { response }) => {
                        orchestrator.leave_screen();
                        let _ = response.send(());
                    }
                    Some(Command::CanCloseTopWindow { response }) => {
                        let _ = response.send(orchestrator.can_close_top_window());
                    }
                    Some(Command::ActiveWindow { response }) => {
                        let _ = response.send(orchestrator.active_window().id());
                    }
                    Some(Command::CloseTopWindow { response }) => {
                        let _ = response.send(orchestrator.close_top_window());
                    }
                    Some(Command::Load { url, response }) => {
                        let _ = response.send(orchestrator.load(&url));
                    }
                    Some(Command::GoBack { response }) => {
                        let _ = response.send(orchestrator.go_back());
                    }
                    Some(Command::GoForward { response }) => {
                        let _ = response.send(orchestrator.go_forward());
                    }
                    Some(Command::CanGoBack { response }) => {
                        let _ = response.send(orchestrator.can_go_back());
                    }
                    Some(Command::CanGoForward { response }) => {
                        let _ = response.send(orchestrator.can_go_forward());
                    }
                    Some(Command::Reload { response }) => {
                        let _ = response.send(orchestrator.reload());
                    }
                    Some(Command::ShouldOverrideUrlLoading {
                        handle,
                        url,
                        response,
                    }) => {
                        let _ = response.send(orchestrator.should_override_url_loading(handle, &url));
                    }
                    Some(Command::DismissAffordance { response }) => {
                        let _ = response.send(orchestrator.dismiss_affordance());
                    }
                    Some(Command::Affordance { response }) => {
                        let _ = response.send(orchestrator.affordance());
                    }
                    Some(Command::Title { response }) => {
                        let _ = response.send(orchestrator.title().map(str::to_string));
                    }
                    Some(Command::Url { response }) => {
                        let _ = response.send(orchestrator.current_url().map(|u| u.to_string()));
                    }
                    Some(Command::Windows { response }) => {
                        let _ = response.send(orchestrator.snapshot());
                    }
                    Some(Command::Events { response }) => {
                        orchestrator.pump(Instant::now());
                        let _ = response.send(orchestrator.screen_mut().drain());
                    }
                    Some(Command::Shutdown) => break,
                    None => {}
                }

                orchestrator.pump(Instant::now());
            }
        });

        init_rx
            .recv()
            .map_err(|_| SessionError::EngineInitFailed("background thread panicked".into()))??;

        Ok(Self {
            sender: Mutex::new(cmd_tx),
            thread: Mutex::new(Some(thread)),
        })
    }

    fn send_cmd<T>(
        &self,
        make_cmd: impl FnOnce(mpsc::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (resp_tx, resp_rx) = mpsc::channel();
        let sender = self.sender.lock().map_err(|_| SessionError::ChannelClosed)?;
        sender
            .send(make_cmd(resp_tx))
            .map_err(|_| SessionError::ChannelClosed)?;
        drop(sender);
        resp_rx.recv().map_err(|_| SessionError::ChannelClosed)
    }

    pub fn attach(&self, window: WindowId, node: NodeId) -> Result<HandleId, SessionError> {
        self.send_cmd(|response| Command::Attach {
            window,
            node,
            response,
        })?
    }

    pub fn detach(&self, node: NodeId) {
        let _ = self.send_cmd(|response| Command::Detach { node, response });
    }

    pub fn back(&self) -> Result<BackOutcome, SessionError> {
        self.send_cmd(|response| Command::Back { response })
    }

    /// Ask the screen to close, whatever the stack depth.
    pub fn leave_screen(&self) {
        let _ = self.send_cmd(|response| Command::LeaveScreen { response });
    }

    /// Whether the screen should offer a close-tab action.
    pub fn can_close_top_window(&self) -> bool {
        self.send_cmd(|response| Command::CanCloseTopWindow { response })
            .unwrap_or(false)
    }

    /// The window a UI node should attach next.
    pub fn active_window(&self) -> Result<WindowId, SessionError> {
        self.send_cmd(|response| Command::ActiveWindow { response })
    }

    pub fn close_top_window(&self) -> Result<WindowId, SessionError> {
        self.send_cmd(|response| Command::CloseTopWindow { response })?
    }

    /// Navigate the active window to `url` with the session headers.
    pub fn load(&self, url: &Url) -> Result<(), SessionError> {
        self.send_cmd(|response| Command::Load {
            url: url.clone(),
            response,
        })?
    }

    pub fn go_back(&self) -> Result<bool, SessionError> {
        self.send_cmd(|response| Command::GoBack { response })?
    }

    pub fn go_forward(&self) -> Result<bool, SessionError> {
        self.send_cmd(|response| Command::GoForward { response })?
    }

    pub fn can_go_back(&self) -> bool {
        self.send_cmd(|response| Command::CanGoBack { response })
            .unwrap_or(false)
    }

    pub fn can_go_forward(&self) -> bool {
        self.send_cmd(|response| Command::CanGoForward { response })
            .unwrap_or(false)
    }

    pub fn reload(&self) -> Result<(), SessionError> {
        self.send_cmd(|response| Command::Reload { response })?
    }

    pub fn should_override_url_loading(&self, handle: HandleId, url: &str) -> bool {
        self.send_cmd(|response| Command::ShouldOverrideUrlLoading {
            handle,
            url: url.to_string(),
            response,
        })
        .unwrap_or(false)
    }

    pub fn dismiss_affordance(&self) -> Result<(), SessionError> {
        self.send_cmd(|response| Command::DismissAffordance { response })?
    }

    pub fn affordance(&self) -> ScrollAffordance {
        self.send_cmd(|response| Command::Affordance { response })
            .unwrap_or_default()
    }

    pub fn title(&self) -> Option<String> {
        self.send_cmd(|response| Command::Title { response })
            .ok()
            .flatten()
    }

    pub fn url(&self) -> Option<String> {
        self.send_cmd(|response| Command::Url { response })
            .ok()
            .flatten()
    }

    /// Bottom-to-top snapshot of the window stack.
    pub fn windows(&self) -> Vec<WindowSnapshot> {
        self.send_cmd(|response| Command::Windows { response })
            .unwrap_or_default()
    }

    /// Drain and return buffered screen notifications.
    pub fn events(&self) -> Vec<ScreenEvent> {
        self.send_cmd(|response| Command::Events { response })
            .unwrap_or_default()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(Command::Shutdown);
        }
        if let Ok(mut handle) = self.thread.lock()
            && let Some(thread) = handle.take()
        {
            let _ = thread.join();
        }
    }
}
