//! Data types for working with X events
use crate::{
    core::bindings::KeyCode,
    pure::geometry::{Point, Rect},
    Xid,
};

/// Wrapper around the low level X event types that the reducer consumes.
///
/// Events the manager does not react to are filtered out by the backend and
/// never reach the reducer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum XEvent {
    /// A press of one of the grabbed mouse buttons inside a client window
    ButtonPress(PointerChange),
    /// A grabbed mouse button was released
    ButtonRelease(Point),
    /// A message has been sent to a particular client
    ClientMessage(ClientMessage),
    /// A client is requesting to be repositioned
    ConfigureRequest(ConfigureEvent),
    /// A client window has been destroyed
    Destroy(Xid),
    /// The mouse pointer has entered a new client window
    Enter(PointerChange),
    /// A grabbed key combination has been entered by the user
    KeyPress(KeyCode),
    /// The mouse pointer has left the current client window
    Leave(PointerChange),
    /// The keyboard mapping has changed
    MappingNotify,
    /// A client window is requesting to be positioned and rendered on the screen
    MapRequest(Xid),
    /// The pointer has moved while grabbed for an interactive drag
    MotionNotify(Point),
    /// Outputs were added, removed or reconfigured
    RandrNotify,
    /// A client is being unmapped
    UnmapNotify(Xid),
}

impl std::fmt::Display for XEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use XEvent::*;

        match self {
            ButtonPress(_) => write!(f, "ButtonPress"),
            ButtonRelease(_) => write!(f, "ButtonRelease"),
            ClientMessage(_) => write!(f, "ClientMessage"),
            ConfigureRequest(_) => write!(f, "ConfigureRequest"),
            Destroy(_) => write!(f, "Destroy"),
            Enter(_) => write!(f, "Enter"),
            KeyPress(_) => write!(f, "KeyPress"),
            Leave(_) => write!(f, "Leave"),
            MappingNotify => write!(f, "MappingNotify"),
            MapRequest(_) => write!(f, "MapRequest"),
            MotionNotify(_) => write!(f, "MotionNotify"),
            RandrNotify => write!(f, "RandrNotify"),
            UnmapNotify(_) => write!(f, "UnmapNotify"),
        }
    }
}

/// A client message that needs to be parsed and handled based on its type.
///
/// Only format-32 messages are delivered: EWMH root messages all use that
/// format and nothing else is acted on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientMessage {
    /// The ID of the window the message concerns
    pub id: Xid,
    /// The name of the message type atom
    pub dtype: String,
    /// The raw message payload
    pub data: [u32; 5],
}

/// A configure request from a client that wants a new position or size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigureEvent {
    /// The ID of the window requesting the change
    pub id: Xid,
    /// The requested geometry
    pub r: Rect,
}

/// A notification that the mouse pointer has entered or left a window, or
/// that a button was pressed inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerChange {
    /// The ID of the window the pointer event concerns
    pub id: Xid,
    /// Absolute coordinate of the event
    pub abs: Point,
}
