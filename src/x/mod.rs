//! Logic for interacting with the X server
use crate::{
    core::bindings::KeyCode,
    pure::geometry::{Point, Rect},
    Color, Result, Xid,
};
use std::collections::HashMap;
use tracing::trace;

pub mod atom;
pub mod event;
pub mod ewmh;
pub mod property;

pub use atom::{Atom, EWMH_SUPPORTED_ATOMS, FLOATING_WINDOW_TYPES};
pub use event::XEvent;
pub use property::{Prop, WindowAttributes, WmNormalHints, WmNormalHintsFlags, WmState};

/// A physical output as reported by the randr extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputInfo {
    /// The output name (e.g. "eDP-1")
    pub name: String,
    /// Position and size within the virtual screen
    pub rect: Rect,
    /// The randr id for this output
    pub randr_id: u32,
    /// Whether the server reports this output as primary
    pub primary: bool,
}

/// On screen configuration options for X clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientConfig {
    /// The border width in pixels
    BorderPx(u32),
    /// Absolute size and position on the screen as a [Rect]
    Position(Rect),
    /// Mark this window as stacking above all other windows
    StackTop,
    /// Mark this window as stacking below all other windows
    StackBottom,
}

/// Attributes for an X11 client window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientAttr {
    /// Border color as an argb hex value
    BorderColor(u32),
    /// Set the pre-defined client event mask
    ClientEventMask,
    /// Set the pre-defined root event mask
    RootEventMask,
}

/// A handle on a running X11 connection that we can use for issuing requests.
///
/// XConn is an abstraction layer over the underlying display server
/// connection: the core window manager logic only ever talks to this trait,
/// which keeps it testable with in-memory stubs. The production
/// implementation is [RustConn][crate::x11::RustConn].
pub trait XConn {
    /// The ID of the window manager root window.
    fn root(&self) -> Xid;
    /// The full rectangle of the root screen, used when no outputs are reported.
    fn screen_rect(&self) -> Result<Rect>;
    /// The currently connected physical outputs.
    fn current_outputs(&self) -> Result<Vec<OutputInfo>>;
    /// The current (x, y) coordinate of the mouse cursor.
    fn cursor_position(&self) -> Result<Point>;
    /// The top level window currently under the mouse cursor, if any.
    fn window_under_cursor(&self) -> Result<Option<Xid>>;

    /// Register for substructure redirection on the root window.
    ///
    /// Only one client may hold this at a time: failure means another window
    /// manager is running and startup must abort.
    fn become_wm(&self) -> Result<()>;
    /// Block and wait for the next event from the X server.
    fn next_event(&self) -> Result<XEvent>;
    /// Flush any pending requests to the X server.
    fn flush(&self);

    /// Look up the id of a given atom name, interning it if required.
    fn intern_atom(&self, atom: &str) -> Result<u32>;
    /// Look up the string name of an atom by id.
    fn atom_name(&self, atom: u32) -> Result<String>;

    /// Look up a specific property on a given client window.
    fn get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>>;
    /// Set a specific property on a given client window.
    fn set_prop(&self, target: Xid, prop_name: &str, value: Prop) -> Result<()>;
    /// Delete a property from a given client window.
    fn delete_prop(&self, target: Xid, prop_name: &str) -> Result<()>;

    /// Request the window attributes for a client.
    fn get_window_attributes(&self, client: Xid) -> Result<WindowAttributes>;
    /// The WM_NORMAL_HINTS size constraints for a client, if set.
    fn normal_hints(&self, client: Xid) -> Result<Option<WmNormalHints>>;
    /// The WM_CLASS class name for a client, if set.
    fn window_class(&self, client: Xid) -> Result<Option<String>>;
    /// The first known _NET_WM_WINDOW_TYPE atom for a client, if set.
    fn window_type(&self, client: Xid) -> Result<Option<Atom>>;
    /// The current geometry of a client window.
    fn client_geometry(&self, client: Xid) -> Result<Rect>;

    /// Apply one or more [ClientConfig] settings to a client window.
    fn set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()>;
    /// Apply one or more [ClientAttr] settings to a client window.
    fn set_client_attributes(&self, client: Xid, attrs: &[ClientAttr]) -> Result<()>;

    /// Map the given client window, making it visible.
    fn map(&self, client: Xid) -> Result<()>;
    /// Unmap the given client window, hiding it.
    fn unmap(&self, client: Xid) -> Result<()>;
    /// Forcibly kill the given client.
    fn kill(&self, client: Xid) -> Result<()>;
    /// Set X input focus to the given client window.
    fn focus(&self, client: Xid) -> Result<()>;
    /// Set the ICCCM WM_STATE property for a client.
    fn set_wm_state(&self, client: Xid, state: WmState) -> Result<()>;

    /// Whether the client advertises the given protocol in WM_PROTOCOLS.
    fn supports_protocol(&self, client: Xid, proto: Atom) -> Result<bool>;
    /// Send a WM_PROTOCOLS client message (e.g. WM_DELETE_WINDOW).
    fn send_protocol_message(&self, client: Xid, proto: Atom) -> Result<()>;

    /// Reposition the mouse cursor within the given window.
    fn warp_pointer(&self, target: Xid, x: i16, y: i16) -> Result<()>;

    /// Grab the given key codes on the root window.
    fn grab_keys(&self, key_codes: &[KeyCode]) -> Result<()>;
    /// Release every key grab held on the root window.
    fn ungrab_keys(&self) -> Result<()>;
    /// Grab mouse button presses on the given client (click to focus).
    fn grab_buttons(&self, client: Xid) -> Result<()>;
    /// Release button grabs on the given client.
    fn ungrab_buttons(&self, client: Xid) -> Result<()>;
    /// Grab the pointer for the duration of an interactive drag.
    fn grab_pointer(&self) -> Result<()>;
    /// Release the pointer grab.
    fn ungrab_pointer(&self) -> Result<()>;

    /// The key codes currently mapped to the given keysym.
    fn keycodes_for_keysym(&self, keysym: u32) -> Result<Vec<u8>>;

    /// Create the hidden window advertised via _NET_SUPPORTING_WM_CHECK.
    fn create_check_window(&self) -> Result<Xid>;
}

/// Extended functionality for [XConn] impls: the window level helpers the
/// event handlers are written in terms of.
pub trait XConnExt: XConn + Sized {
    /// Display a client, setting its WmState to Normal. Idempotent.
    fn reveal(&self, client: Xid) -> Result<()> {
        trace!(%client, "revealing client");
        self.set_wm_state(client, WmState::Normal)?;
        self.map(client)
    }

    /// Hide a client without dropping its state, recording the unmap as
    /// manager-initiated so the resulting UnmapNotify is not treated as a
    /// withdraw.
    fn hide(&self, client: Xid, pending_unmap: &mut HashMap<Xid, usize>) -> Result<()> {
        trace!(%client, "hiding client");
        self.unmap(client)?;
        self.set_wm_state(client, WmState::Iconic)?;

        *pending_unmap.entry(client).or_insert(0) += 1;

        Ok(())
    }

    /// Raise the given window to the top of the stacking order.
    fn raise_window(&self, client: Xid) -> Result<()> {
        self.set_client_config(client, &[ClientConfig::StackTop])
    }

    /// Lower the given window to the bottom of the stacking order.
    fn lower_window(&self, client: Xid) -> Result<()> {
        self.set_client_config(client, &[ClientConfig::StackBottom])
    }

    /// Update the border color of the given client window.
    fn set_client_border_color<C>(&self, client: Xid, color: C) -> Result<()>
    where
        C: Into<Color>,
    {
        let color = color.into();
        self.set_client_attributes(client, &[ClientAttr::BorderColor(color.argb_u32())])
    }

    /// Position a client window and set its border width.
    fn position_client(&self, client: Xid, r: Rect, border: u32) -> Result<()> {
        trace!(%client, ?r, "positioning client");
        self.set_client_config(client, &[ClientConfig::BorderPx(border), ClientConfig::Position(r)])
    }

    /// Close a client politely via WM_DELETE_WINDOW when supported, killing
    /// it otherwise.
    fn close_or_kill(&self, client: Xid) -> Result<()> {
        if self.supports_protocol(client, Atom::WmDeleteWindow)? {
            trace!(%client, "sending WM_DELETE_WINDOW");
            self.send_protocol_message(client, Atom::WmDeleteWindow)
        } else {
            trace!(%client, "client does not support WM_DELETE_WINDOW: killing");
            self.kill(client)
        }
    }

    /// Warp the mouse cursor to the center of the given rectangle.
    fn warp_pointer_to_rect(&self, target: Xid, r: Rect) -> Result<()> {
        self.warp_pointer(target, (r.w / 2) as i16, (r.h / 2) as i16)
    }
}

// Auto impl XConnExt for all XConn impls
impl<T> XConnExt for T where T: XConn {}
