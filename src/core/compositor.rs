//! The compositor facade: owns the display, the listening socket and the
//! shared state, and surfaces shell activity as [`ShellEvent`]s for the
//! embedding desktop UI.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use wayland_server::{Display, ListeningSocket};

use crate::core::errors::Result;
use crate::core::state::{ClientState, CompositorState};
use crate::mlog;
use crate::util::logging;

/// Something the shell-facing side of the desktop needs to react to.
///
/// Protocol handlers push these into `CompositorState::pending_events`;
/// [`Compositor::drain_events`] hands them to the embedder after each
/// dispatch pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    /// First window of this application identifier appeared.
    ApplicationAdded { app_id: String, pid: u32 },
    /// Last window of this application identifier went away.
    ApplicationRemoved { app_id: String, pid: u32 },
    /// The active window now belongs to this application.
    ApplicationFocused { app_id: String },

    WindowCreated { window_id: u32 },
    WindowClosed { window_id: u32 },
    WindowTitleChanged { window_id: u32, title: String },
    WindowAppIdChanged { window_id: u32, app_id: String },
    WindowMaximized { window_id: u32, maximized: bool },
    WindowFullscreen { window_id: u32, fullscreen: bool },
    WindowMinimized { window_id: u32 },
    /// gtk_surface1 modality hint changed.
    WindowModalChanged { window_id: u32, modal: bool },
    /// Client asked for an interactive move (compositor drives the drag).
    MoveRequested { window_id: u32 },
    /// Client asked for an interactive resize; `edges` uses xdg_toplevel
    /// resize-edge values.
    ResizeRequested { window_id: u32, edges: u32 },

    PopupCreated { window_id: u32, parent_id: u32 },
    PopupDismissed { window_id: u32 },

    /// A window gained a presence on an output.
    ViewCreated { window_id: u32, output_id: u32 },
    ViewDestroyed { window_id: u32, output_id: u32 },

    /// A ping went unanswered past the timeout.
    ClientUnresponsive { window_id: u32 },
    /// gtk_shell1 system bell, optionally tied to a window.
    SystemBell { window_id: Option<u32> },

    /// Scene contents changed; the render side should composite a frame.
    RedrawNeeded,
}

/// How long a ping may stay unanswered before the owning windows are
/// reported unresponsive.
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// An in-flight ping, keyed by its serial in `Compositor::pending_pings`.
#[derive(Debug, Clone)]
pub struct PendingPing {
    /// Windows reported unresponsive if the pong never arrives.
    pub window_ids: Vec<u32>,
    pub sent: Instant,
}

/// The embedding-facing compositor object.
///
/// Single-threaded: everything here runs on the protocol thread, the only
/// cross-thread handle is the scene snapshot inside `CompositorState`.
pub struct Compositor {
    pub display: Display<CompositorState>,
    pub state: Arc<RwLock<CompositorState>>,
    socket: ListeningSocket,
    /// Outstanding shell pings by serial.
    pending_pings: HashMap<u32, PendingPing>,
    last_ping: Instant,
}

impl Compositor {
    /// Create the display, bind the socket and register every global.
    pub fn new(config: crate::config::Config) -> Result<Self> {
        let display = Display::<CompositorState>::new()
            .map_err(|e| crate::core::errors::CoreError::Protocol(e.to_string()))?;

        let mut state = CompositorState::new();
        for output in &config.outputs {
            state.add_new_output(&output.name, output.x, output.y, output.width, output.height);
        }
        if state.outputs.is_empty() {
            state.add_new_output("headless-1", 0, 0, 1920, 1080);
        }

        let socket = match &config.socket_name {
            Some(name) => ListeningSocket::bind(name.as_str())
                .map_err(|e| crate::core::errors::CoreError::Protocol(e.to_string()))?,
            None => ListeningSocket::bind_auto("wayland", 1..33)
                .map_err(|e| crate::core::errors::CoreError::Protocol(e.to_string()))?,
        };
        if let Some(name) = socket.socket_name() {
            mlog!(logging::MAIN, "Listening on {}", name.to_string_lossy());
        }

        let handle = display.handle();
        crate::core::wayland::create_globals(&handle, &state);

        Ok(Self {
            display,
            state: Arc::new(RwLock::new(state)),
            socket,
            pending_pings: HashMap::new(),
            last_ping: Instant::now(),
        })
    }

    pub fn socket_name(&self) -> Option<String> {
        self.socket
            .socket_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Accept any queued client connections.
    pub fn accept_connections(&mut self) -> Result<()> {
        while let Ok(Some(stream)) = self.socket.accept() {
            let client = self
                .display
                .handle()
                .insert_client(stream, Arc::new(ClientState::default()))
                .map_err(|e| crate::core::errors::CoreError::Protocol(e.to_string()))?;
            mlog!(logging::MAIN, "Accepted client {:?}", client.id());
        }
        Ok(())
    }

    /// Run one dispatch pass and flush outgoing events.
    pub fn dispatch(&mut self) -> Result<()> {
        {
            let mut state = self.state.write().unwrap();
            self.display
                .dispatch_clients(&mut state)
                .map_err(|e| crate::core::errors::CoreError::Protocol(e.to_string()))?;
        }
        self.display
            .flush_clients()
            .map_err(|e| crate::core::errors::CoreError::Protocol(e.to_string()))?;
        Ok(())
    }

    /// Take the shell events accumulated since the last call.
    pub fn drain_events(&mut self) -> Vec<ShellEvent> {
        let mut state = self.state.write().unwrap();
        std::mem::take(&mut state.pending_events)
    }

    /// Ping every shell surface that supports it, at most once per timeout
    /// interval, and report windows whose previous ping never came back.
    pub fn ping_clients(&mut self) -> Vec<ShellEvent> {
        let mut events = Vec::new();
        let now = Instant::now();

        self.pending_pings.retain(|serial, ping| {
            if now.duration_since(ping.sent) > PING_TIMEOUT {
                mlog!(
                    logging::SHELL,
                    "Ping {} timed out (windows {:?})",
                    serial,
                    ping.window_ids
                );
                for &window_id in &ping.window_ids {
                    events.push(ShellEvent::ClientUnresponsive { window_id });
                }
                false
            } else {
                true
            }
        });

        if now.duration_since(self.last_ping) >= PING_TIMEOUT {
            self.last_ping = now;
            let mut state = self.state.write().unwrap();
            for (serial, window_ids) in state.ping_all() {
                self.pending_pings
                    .insert(serial, PendingPing { window_ids, sent: now });
            }
        }

        events
    }

    /// Protocol handlers report answered pings through the state; clear the
    /// matching in-flight entries.
    pub fn collect_pongs(&mut self) {
        let mut state = self.state.write().unwrap();
        for serial in state.answered_pings.drain(..) {
            if let Some(ping) = self.pending_pings.remove(&serial) {
                tracing::trace!(
                    "pong for serial {} after {:?}",
                    serial,
                    ping.sent.elapsed()
                );
            }
        }
    }
}
