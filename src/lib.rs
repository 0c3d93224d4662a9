//! arbor: a binary space partition tiling window manager for X11.
//!
//! Each virtual desktop owns a full binary tree of client windows. Leaves hold
//! clients, internal nodes hold the split geometry, and one of four layout
//! policies (default, master, stack, grid) maps the tree onto the monitor.
//! The manager reacts to X events, keeps the tree and the server in sync and
//! publishes EWMH state for bars and pagers.
#![warn(
    clippy::complexity,
    clippy::correctness,
    clippy::style,
    future_incompatible,
    missing_debug_implementations,
    rust_2018_idioms
)]

pub mod config;
pub mod core;
pub mod pure;
pub mod x;
pub mod x11;

pub use crate::core::{WindowManager, Xid};

/// Error variants from the core window manager and the X backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unable to establish a connection to the X server
    #[error(transparent)]
    Connect(#[from] ::x11rb::errors::ConnectError),

    /// The underlying connection to the X server broke
    #[error(transparent)]
    Connection(#[from] ::x11rb::errors::ConnectionError),

    /// Could not read the reply for an X request
    #[error(transparent)]
    Reply(#[from] ::x11rb::errors::ReplyError),

    /// Could not read the reply for an X request or generate a new resource id
    #[error(transparent)]
    ReplyOrId(#[from] ::x11rb::errors::ReplyOrIdError),

    /// A malformed line was found while parsing the config file
    #[error("config line {line}: {reason}")]
    Config {
        /// 1-based line number within the config file
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// An invalid hex color code was requested
    #[error("invalid color specification: {0}")]
    InvalidColor(String),

    /// Wm(Normal)Hints received from the X server were invalid
    #[error("invalid window hints property: {0}")]
    InvalidHints(String),

    /// Data received in a client message had an unusable format
    #[error("invalid client message format: {0} (expected 32)")]
    InvalidClientMessageData(u8),

    /// An IO error was encountered while handling the config file
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The requested property is not set for the given client
    #[error("the {0} property is not set for client {1}")]
    MissingProperty(String, Xid),

    /// A command was invoked with nothing to act on
    #[error("no target for command: {0}")]
    NoTarget(&'static str),

    /// Another window manager already holds substructure redirection on the root
    #[error("unable to register for substructure redirection: is another window manager running?")]
    NotTheWm,

    /// No usable screens were reported by the X server
    #[error("the X server reported no usable screens")]
    NoScreens,

    /// Parsing an [Atom][crate::x::Atom] from a str failed
    #[error(transparent)]
    Strum(#[from] strum::ParseError),

    /// An attempt was made to reference a client that is not known to arbor
    #[error("{0} is not a known client")]
    UnknownClient(Xid),
}

/// A Result where the error type is a crate level [Error]
pub type Result<T> = std::result::Result<T, Error>;

/// An RGB color used for window borders.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    /// The raw `0x00rrggbb` pixel value of this color.
    pub fn rgb_u32(&self) -> u32 {
        self.0
    }

    /// This color as an argb u32 with full opacity, as expected for border pixels.
    pub fn argb_u32(&self) -> u32 {
        0xff000000 | self.0
    }
}

impl From<u32> for Color {
    fn from(rgb: u32) -> Self {
        Self(rgb & 0x00ffffff)
    }
}

impl TryFrom<&str> for Color {
    type Error = Error;

    /// Accepts `#rrggbb` and `0xrrggbb` forms.
    fn try_from(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .unwrap_or(s);

        if hex.len() != 6 {
            return Err(Error::InvalidColor(s.to_owned()));
        }

        u32::from_str_radix(hex, 16)
            .map(Color)
            .map_err(|_| Error::InvalidColor(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("#83a598", 0x83a598; "hash prefixed")]
    #[test_case("0x30302f", 0x30302f; "hex prefixed")]
    #[test_case("ffffff", 0xffffff; "bare")]
    #[test]
    fn color_parsing(s: &str, expected: u32) {
        let c = Color::try_from(s).expect("valid color");

        assert_eq!(c.rgb_u32(), expected);
    }

    #[test_case("#83a59"; "too short")]
    #[test_case("#83a598aa"; "too long")]
    #[test_case("#83a59z"; "not hex")]
    #[test]
    fn invalid_colors_are_rejected(s: &str) {
        assert!(Color::try_from(s).is_err());
    }
}
