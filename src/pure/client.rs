//! The client record for a managed X window
use crate::{x::Atom, Xid};

/// How a client is currently being displayed.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Positioned by the partition tree
    #[default]
    Tiled,
    /// Positioned by the client itself, above tiled windows
    Floating,
    /// Spanning the full monitor rectangle
    Fullscreen,
}

/// A managed X11 top level window.
///
/// A client is created when the manager decides to manage a newly mapped
/// window and lives for exactly as long as its leaf in the partition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Client {
    /// The X window ID: the identity of this client
    pub id: Xid,
    /// The declared EWMH window type, when one was set
    pub wtype: Option<Atom>,
    /// Border width in pixels applied when tiled or floating
    pub border_width: u32,
    /// Current display state
    pub state: ClientState,
    prev_state: ClientState,
}

impl Client {
    /// Create a new client record in the given initial state.
    pub fn new(id: Xid, wtype: Option<Atom>, border_width: u32, state: ClientState) -> Self {
        Self {
            id,
            wtype,
            border_width,
            state,
            prev_state: state,
        }
    }

    /// True if this client is currently tiled into the partition layout.
    pub fn is_tiled(&self) -> bool {
        self.state == ClientState::Tiled
    }

    /// True if this client positions itself.
    pub fn is_floating(&self) -> bool {
        self.state == ClientState::Floating
    }

    /// True if this client currently spans the monitor.
    pub fn is_fullscreen(&self) -> bool {
        self.state == ClientState::Fullscreen
    }

    /// Move this client into fullscreen, remembering the state to restore later.
    pub fn enter_fullscreen(&mut self) {
        if self.state != ClientState::Fullscreen {
            self.prev_state = self.state;
            self.state = ClientState::Fullscreen;
        }
    }

    /// Restore the tiled-or-floating state this client had before fullscreen.
    pub fn exit_fullscreen(&mut self) {
        if self.state == ClientState::Fullscreen {
            self.state = self.prev_state;
        }
    }

    /// Set a non-fullscreen state directly (rule application, state toggling).
    pub fn set_state(&mut self, state: ClientState) {
        self.prev_state = state;
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case(ClientState::Tiled; "from tiled")]
    #[test_case(ClientState::Floating; "from floating")]
    #[test]
    fn fullscreen_round_trips_previous_state(initial: ClientState) {
        let mut c = Client::new(Xid(1), None, 2, initial);

        c.enter_fullscreen();
        assert!(c.is_fullscreen());

        c.exit_fullscreen();
        assert_eq!(c.state, initial);
    }

    #[test]
    fn exit_fullscreen_is_a_noop_when_not_fullscreen() {
        let mut c = Client::new(Xid(1), None, 2, ClientState::Floating);

        c.exit_fullscreen();

        assert_eq!(c.state, ClientState::Floating);
    }
}
