//! Data types for working with X window properties
use crate::{Error, Result, Xid};
use bitflags::bitflags;

/// Known property types that [XConn][crate::x::XConn] impls can return when
/// they read window properties.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Prop {
    /// One or more X Atoms, by name
    Atom(Vec<String>),
    /// Cardinal numbers
    Cardinal(Vec<u32>),
    /// UTF-8 encoded string data
    UTF8String(Vec<String>),
    /// X window IDs
    Window(Vec<Xid>),
}

bitflags! {
    /// Flags marking which fields of a WM_NORMAL_HINTS property are set.
    #[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct WmNormalHintsFlags: u32 {
        /// Program-specified minimum size
        const P_MIN_SIZE = 0b0000010000;
        /// Program-specified maximum size
        const P_MAX_SIZE = 0b0000100000;
    }
}

/// The size constraints a client declared via WM_NORMAL_HINTS.
///
/// Only the min / max sizes are honoured: a window whose minimum and maximum
/// sizes coincide has a fixed natural size and is floated rather than tiled.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub struct WmNormalHints {
    pub(crate) flags: WmNormalHintsFlags,
    pub(crate) min: Option<(u32, u32)>,
    pub(crate) max: Option<(u32, u32)>,
}

impl WmNormalHints {
    /// Create a new instance from component parts.
    pub fn new(
        flags: WmNormalHintsFlags,
        min: Option<(u32, u32)>,
        max: Option<(u32, u32)>,
    ) -> Self {
        Self { flags, min, max }
    }

    /// Try to construct a [WmNormalHints] instance from raw property words.
    ///
    /// The property is an `XSizeHints` struct of 18 32-bit words; min size
    /// sits at words 5,6 and max size at words 7,8.
    pub fn try_from_bytes(raw: &[u32]) -> Result<Self> {
        if raw.len() < 9 {
            return Err(Error::InvalidHints(format!(
                "raw bytes should be at least [u32; 9] for WmNormalHints, got [u32; {}]",
                raw.len()
            )));
        }

        let flags = WmNormalHintsFlags::from_bits_truncate(raw[0]);
        let if_set = |flag, w: u32, h: u32| {
            if flags.contains(flag) && w > 0 && h > 0 {
                Some((w, h))
            } else {
                None
            }
        };

        Ok(Self {
            flags,
            min: if_set(WmNormalHintsFlags::P_MIN_SIZE, raw[5], raw[6]),
            max: if_set(WmNormalHintsFlags::P_MAX_SIZE, raw[7], raw[8]),
        })
    }

    /// A window with equal, non-zero min and max sizes can not be resized
    /// and is forced to float.
    pub fn forces_floating(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min == max)
    }
}

/// Possible valid values for setting the ICCCM `WM_STATE` property on a client.
///
/// See the [ICCCM docs][1] for more information.
///
/// [1]: https://tronche.com/gui/x/icccm/sec-4.html#s-4.1.3.1
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum WmState {
    /// Window is not visible
    Withdrawn,
    /// Window is visible
    Normal,
    /// Window is iconified
    Iconic,
}

impl From<WmState> for u32 {
    fn from(s: WmState) -> u32 {
        match s {
            WmState::Withdrawn => 0,
            WmState::Normal => 1,
            WmState::Iconic => 3,
        }
    }
}

/// The subset of window attributes the manager inspects.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub struct WindowAttributes {
    /// Windows with override-redirect set are never managed
    pub override_redirect: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    fn raw(flags: u32, min: (u32, u32), max: (u32, u32)) -> [u32; 18] {
        let mut words = [0; 18];
        words[0] = flags;
        (words[5], words[6]) = min;
        (words[7], words[8]) = max;

        words
    }

    #[test_case(raw(0x30, (300, 200), (300, 200)), true; "fixed size floats")]
    #[test_case(raw(0x30, (300, 200), (800, 600)), false; "resizable tiles")]
    #[test_case(raw(0x10, (300, 200), (0, 0)), false; "min only tiles")]
    #[test_case(raw(0x00, (300, 200), (300, 200)), false; "sizes without flags are ignored")]
    #[test]
    fn forces_floating(raw: [u32; 18], expected: bool) {
        let hints = WmNormalHints::try_from_bytes(&raw).expect("valid hints");

        assert_eq!(hints.forces_floating(), expected);
    }

    #[test]
    fn short_properties_are_invalid() {
        assert!(WmNormalHints::try_from_bytes(&[0; 4]).is_err());
    }
}
