//! Core data structures and the main window manager event loop
use crate::{
    core::bindings::{KeyBinding, KeyCode, ModMask},
    pure::{
        client::ClientState,
        geometry::{Point, Rect},
        desktop::Desktop,
        monitor::Monitor,
    },
    x::{XConn, XEvent},
    Color, Result,
};
use nix::sys::signal::{signal, SigHandler, Signal};
use std::{collections::HashMap, ops::Deref, path::PathBuf};
use tracing::{error, info, span, trace, Level};

pub mod bindings;
pub mod commands;
pub mod drag;
pub mod handle;

use drag::DragState;

/// An X11 ID for a given resource
#[derive(Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Xid(pub u32);

impl std::fmt::Display for Xid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for Xid {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u32> for Xid {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<Xid> for u32 {
    fn from(id: Xid) -> Self {
        id.0
    }
}

/// A per-class placement rule from the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// The WM_CLASS class name this rule matches (case insensitive)
    pub class: String,
    /// The state forced onto matching clients
    pub state: ClientState,
    /// The desktop matching clients are sent to (1-based, current if None)
    pub desktop: Option<usize>,
}

/// The runtime options driving the manager, populated from the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Pixels of border drawn around each window
    pub border_width: u32,
    /// Pixels between siblings and between the tree and the screen edges
    pub window_gap: u32,
    /// Border color of the focused window
    pub active_border: Color,
    /// Border color of unfocused windows
    pub normal_border: Color,
    /// Number of desktops per monitor
    pub virtual_desktops: usize,
    /// Whether moving the pointer into a window focuses it
    pub focus_follow_pointer: bool,
    /// Whether newly mapped windows take focus
    pub focus_follow_spawn: bool,
    /// Whether switching desktops restores that desktop's previous focus
    pub restore_last_focus: bool,
    /// Per-class placement rules, in file order
    pub rules: Vec<Rule>,
    /// Key bindings, in file order
    pub bindings: Vec<KeyBinding>,
    /// One-shot commands spawned on startup
    pub startup: Vec<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            border_width: 2,
            window_gap: 10,
            active_border: Color::from(0x83a598),
            normal_border: Color::from(0x30302f),
            virtual_desktops: 5,
            focus_follow_pointer: true,
            focus_follow_spawn: true,
            restore_last_focus: true,
            rules: Vec::new(),
            bindings: Vec::new(),
            startup: Vec::new(),
        }
    }
}

/// The single dock window whose strip is reserved on the primary monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bar {
    /// The dock window id
    pub window: Xid,
    /// Its geometry as reported when it mapped
    pub rect: Rect,
}

/// Mutable internal state for the window manager.
///
/// All handlers and commands receive this context explicitly: there are no
/// globals, so tests construct isolated states at will.
#[derive(Debug)]
pub struct State {
    /// The runtime configuration
    pub config: Config,
    /// Where the configuration was loaded from (reload re-reads this)
    pub config_path: Option<PathBuf>,
    /// All connected monitors in discovery order
    pub monitors: Vec<Monitor>,
    /// Index of the monitor holding focus
    pub focused_monitor: usize,
    /// The dock window, when one is mapped
    pub bar: Option<Bar>,
    /// The root window id
    pub root: Xid,
    /// The supporting wm check window
    pub check_win: Xid,
    /// Manager-initiated unmaps awaiting their UnmapNotify
    pub pending_unmap: HashMap<Xid, usize>,
    /// The interactive drag session, if one is active
    pub drag: DragState,
    /// Key codes currently grabbed on the root window
    pub(crate) grabbed_codes: Vec<KeyCode>,
    /// Binding lookup for incoming key presses
    pub(crate) resolved_bindings: HashMap<KeyCode, usize>,
    /// Key codes that cancel an active drag
    pub(crate) escape_codes: Vec<u8>,
}

impl State {
    /// The monitor currently holding focus.
    pub fn focused_monitor(&self) -> &Monitor {
        &self.monitors[self.focused_monitor]
    }

    /// Mutable access to the monitor currently holding focus.
    pub fn focused_monitor_mut(&mut self) -> &mut Monitor {
        let ix = self.focused_monitor;
        &mut self.monitors[ix]
    }

    /// The focused desktop of the focused monitor.
    pub fn focused_desktop(&self) -> &Desktop {
        self.focused_monitor().focused_desktop()
    }

    /// Mutable access to the focused desktop of the focused monitor.
    pub fn focused_desktop_mut(&mut self) -> &mut Desktop {
        self.focused_monitor_mut().focused_desktop_mut()
    }

    /// Move monitor focus to the given index, keeping the per-monitor
    /// focus flags in sync.
    pub fn focus_monitor(&mut self, ix: usize) {
        if ix >= self.monitors.len() {
            return;
        }
        self.focused_monitor = ix;
        for (i, m) in self.monitors.iter_mut().enumerate() {
            m.focused = i == ix;
        }
    }

    /// Locate the monitor and desktop holding the given window.
    pub fn find_window(&self, window: Xid) -> Option<(usize, usize)> {
        for (mi, m) in self.monitors.iter().enumerate() {
            for (di, d) in m.desktops.iter().enumerate() {
                if d.tree.leaf_for_window(window).is_some() {
                    return Some((mi, di));
                }
            }
        }

        None
    }

    /// Whether the given desktop is the visible one on its monitor.
    pub fn desktop_is_visible(&self, mon_ix: usize, desk_ix: usize) -> bool {
        self.monitors[mon_ix].focused_desktop_ix() == desk_ix
    }

    /// The index of the monitor containing the given point, if any.
    pub fn monitor_containing(&self, p: Point) -> Option<usize> {
        self.monitors.iter().position(|m| m.contains(p))
    }

    /// The index of the primary monitor.
    pub fn primary_monitor(&self) -> usize {
        self.monitors.iter().position(|m| m.primary).unwrap_or(0)
    }

    /// The bar strip height reserved on the given monitor.
    pub fn bar_height_for(&self, mon_ix: usize) -> u32 {
        match &self.bar {
            Some(bar) if self.monitors[mon_ix].primary => bar.rect.h,
            _ => 0,
        }
    }

    /// The rectangle available to tiled clients on the given monitor.
    pub fn usable_rect(&self, mon_ix: usize) -> Rect {
        self.monitors[mon_ix].usable_rect(
            self.bar_height_for(mon_ix),
            self.config.window_gap,
            self.config.border_width,
        )
    }

    /// Every managed window across all monitors and desktops.
    pub fn all_windows(&self) -> Vec<Xid> {
        self.monitors
            .iter()
            .flat_map(|m| m.desktops.iter())
            .flat_map(|d| d.tree.windows())
            .collect()
    }

    /// Desktop names in the EWMH linear order (monitor by monitor).
    pub fn desktop_names(&self) -> Vec<String> {
        self.monitors
            .iter()
            .flat_map(|m| m.desktops.iter().map(|d| d.name.clone()))
            .collect()
    }

    /// Each desktop's viewport origin in the EWMH linear order.
    pub fn desktop_viewports(&self) -> Vec<Point> {
        self.monitors
            .iter()
            .flat_map(|m| {
                m.desktops
                    .iter()
                    .map(|_| Point::new(m.rect.x, m.rect.y))
                    .collect::<Vec<Point>>()
            })
            .collect()
    }

    /// The EWMH linear index of the given desktop.
    pub fn global_desktop_index(&self, mon_ix: usize, desk_ix: usize) -> usize {
        let earlier: usize = self.monitors[..mon_ix]
            .iter()
            .map(|m| m.desktops.len())
            .sum();

        earlier + desk_ix
    }

    /// Resolve an EWMH linear desktop index back to (monitor, desktop).
    pub fn desktop_for_global_index(&self, mut ix: usize) -> Option<(usize, usize)> {
        for (mi, m) in self.monitors.iter().enumerate() {
            if ix < m.desktops.len() {
                return Some((mi, ix));
            }
            ix -= m.desktops.len();
        }

        None
    }

    /// The EWMH linear index of the currently focused desktop.
    pub fn current_global_desktop(&self) -> usize {
        self.global_desktop_index(
            self.focused_monitor,
            self.focused_monitor().focused_desktop_ix(),
        )
    }
}

/// Discover the connected outputs, falling back to a single synthetic
/// monitor covering the root window when randr reports nothing.
pub(crate) fn discover_monitors<X: XConn>(x: &X, n_desktops: usize) -> Result<Vec<Monitor>> {
    let outputs = x.current_outputs()?;

    let mut monitors: Vec<Monitor> = outputs
        .into_iter()
        .enumerate()
        .map(|(i, o)| Monitor::new(i + 1, o.name, o.rect, o.randr_id, o.primary, n_desktops))
        .collect();

    if monitors.is_empty() {
        info!("no outputs reported: falling back to a single monitor");
        let r = x.screen_rect()?;
        monitors.push(Monitor::new(1, "screen", r, 0, true, n_desktops));
    }

    if !monitors.iter().any(|m| m.primary) {
        monitors[0].primary = true;
    }

    Ok(monitors)
}

/// A top level struct holding everything needed to run as an X11 window
/// manager: the connection, the pure state and the binding lookup.
#[derive(Debug)]
pub struct WindowManager<X>
where
    X: XConn,
{
    x: X,
    /// The manager state driven by incoming events
    pub state: State,
}

impl<X> WindowManager<X>
where
    X: XConn,
{
    /// Construct a new [WindowManager] with the provided config and X connection.
    ///
    /// This claims substructure redirection (failing if another window
    /// manager is running), discovers monitors and publishes the initial
    /// EWMH properties.
    pub fn new(config: Config, config_path: Option<PathBuf>, x: X) -> Result<Self> {
        x.become_wm()?;

        let monitors = discover_monitors(&x, config.virtual_desktops)?;
        let check_win = x.create_check_window()?;

        let mut state = State {
            config,
            config_path,
            monitors,
            focused_monitor: 0,
            bar: None,
            root: x.root(),
            check_win,
            pending_unmap: HashMap::new(),
            drag: DragState::default(),
            grabbed_codes: Vec::new(),
            resolved_bindings: HashMap::new(),
            escape_codes: Vec::new(),
        };
        state.focus_monitor(state.primary_monitor());

        crate::x::ewmh::advertise_support(&x, check_win)?;
        crate::x::ewmh::set_desktop_details(
            &x,
            &state.desktop_names(),
            &state.desktop_viewports(),
        )?;
        crate::x::ewmh::set_current_desktop(&x, state.current_global_desktop())?;

        Ok(Self { x, state })
    }

    /// Immutable access to the underlying connection.
    pub fn conn(&self) -> &X {
        &self.x
    }

    /// Run a single command against the current state, exactly as a key
    /// binding would.
    pub fn run_command(&mut self, cmd: commands::Command, arg: &commands::CommandArg) -> Result<()> {
        commands::run_command(cmd, arg, &mut self.state, &self.x)
    }

    /// Start the window manager and run it until told to exit.
    pub fn run(&mut self) -> Result<()> {
        trace!("registering SIGCHLD signal handler");
        // children from `run` / `exec` are never reaped by us
        if let Err(e) = unsafe { signal(Signal::SIGCHLD, SigHandler::SigIgn) } {
            panic!("unable to set signal handler: {}", e);
        }

        handle::resolve_bindings(&mut self.state, &self.x)?;

        for cmd in self.state.config.startup.clone() {
            commands::spawn_command(&cmd);
        }

        loop {
            match self.x.next_event() {
                Ok(event) => {
                    let span = span!(target: "arbor", Level::DEBUG, "XEvent", %event);
                    let _enter = span.enter();
                    trace!(details = ?event, "event details");

                    if let Err(e) = self.handle_xevent(event) {
                        error!(%e, "error handling event");
                    }
                    self.x.flush();
                }

                Err(e) => error!(%e, "error pulling next x event"),
            }
        }
    }

    /// Dispatch a single event to its handler.
    ///
    /// Transient X errors bubble up from here and are logged by the event
    /// loop: the pure state is mutated before side effects are issued, so a
    /// failed request against an already-dead window never corrupts it.
    pub fn handle_xevent(&mut self, event: XEvent) -> Result<()> {
        use XEvent::*;

        // an active drag session owns the pointer events
        if self.state.drag.active {
            match &event {
                MotionNotify(p) => return drag::drag_move(&mut self.state, &self.x, *p),
                ButtonRelease(p) => return drag::drag_end(&mut self.state, &self.x, *p),
                KeyPress(code) if self.state.escape_codes.contains(&code.code) => {
                    return drag::drag_cancel(&mut self.state, &self.x)
                }
                _ => (),
            }
        }

        match event {
            ButtonPress(p) => handle::button_press(&mut self.state, &self.x, p),
            ButtonRelease(_) => Ok(()),
            ClientMessage(m) => handle::client_message(&mut self.state, &self.x, m),
            ConfigureRequest(e) => handle::configure_request(&mut self.state, &self.x, &e),
            Destroy(id) => handle::destroy_notify(&mut self.state, &self.x, id),
            Enter(p) => handle::enter_notify(&mut self.state, &self.x, p),
            KeyPress(code) => handle::key_press(&mut self.state, &self.x, code),
            Leave(p) => handle::leave_notify(&mut self.state, &self.x, p),
            MappingNotify => handle::resolve_bindings(&mut self.state, &self.x),
            MapRequest(id) => handle::map_request(&mut self.state, &self.x, id),
            MotionNotify(_) => Ok(()),
            RandrNotify => handle::randr_notify(&mut self.state, &self.x),
            UnmapNotify(id) => handle::unmap_notify(&mut self.state, &self.x, id),
        }
    }
}

/// Strip the lock-key noise from an incoming key press before lookup.
pub(crate) fn normalized(code: KeyCode) -> KeyCode {
    code.ignoring_modifier(ModMask::NUM_LOCK | ModMask::LOCK)
}
