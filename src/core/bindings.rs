//! User defined key bindings
use crate::core::commands::{Command, CommandArg};
use bitflags::bitflags;

bitflags! {
    /// X11 modifier mask bits as they appear in key press events.
    #[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct ModMask: u16 {
        /// Shift
        const SHIFT = 1 << 0;
        /// Caps lock
        const LOCK = 1 << 1;
        /// Control
        const CTRL = 1 << 2;
        /// Alt (Mod1)
        const ALT = 1 << 3;
        /// Num lock (Mod2)
        const NUM_LOCK = 1 << 4;
        /// Meta / super / windows (Mod4)
        const SUPER = 1 << 6;
    }
}

impl TryFrom<&str> for ModMask {
    type Error = ();

    fn try_from(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "shift" => Ok(ModMask::SHIFT),
            "ctrl" => Ok(ModMask::CTRL),
            "alt" => Ok(ModMask::ALT),
            "super" => Ok(ModMask::SUPER),
            _ => Err(()),
        }
    }
}

/// A grabbed key press as delivered by the X server: modifier mask plus the
/// hardware key code.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub struct KeyCode {
    /// The held modifier mask
    pub mask: u16,
    /// The key code that was pressed
    pub code: u8,
}

impl KeyCode {
    /// A copy of this [KeyCode] with the given modifiers removed from the mask.
    ///
    /// Used to strip num-lock noise out of incoming events before binding
    /// lookup.
    pub fn ignoring_modifier(&self, mask: ModMask) -> KeyCode {
        KeyCode {
            mask: self.mask & !mask.bits(),
            code: self.code,
        }
    }
}

/// A single `bind = ...` line from the config file, resolved to a command.
///
/// The keysym is translated to grabbable key codes against the live keyboard
/// mapping when the manager starts and again on every MappingNotify.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBinding {
    /// Modifiers that must be held
    pub mods: ModMask,
    /// The bound X keysym
    pub keysym: u32,
    /// The command to run
    pub command: Command,
    /// The argument record handed to the command
    pub arg: CommandArg,
}

/// The fixed table of key names accepted in `bind` lines.
///
/// Names are case sensitive and restricted to this alphabet; the parser
/// rejects anything else with a diagnostic.
pub const KEYSYMS: &[(&str, u32)] = &[
    ("0", 0x0030),
    ("1", 0x0031),
    ("2", 0x0032),
    ("3", 0x0033),
    ("4", 0x0034),
    ("5", 0x0035),
    ("6", 0x0036),
    ("7", 0x0037),
    ("8", 0x0038),
    ("9", 0x0039),
    ("a", 0x0061),
    ("b", 0x0062),
    ("c", 0x0063),
    ("d", 0x0064),
    ("e", 0x0065),
    ("f", 0x0066),
    ("g", 0x0067),
    ("h", 0x0068),
    ("i", 0x0069),
    ("j", 0x006a),
    ("k", 0x006b),
    ("l", 0x006c),
    ("m", 0x006d),
    ("n", 0x006e),
    ("o", 0x006f),
    ("p", 0x0070),
    ("q", 0x0071),
    ("r", 0x0072),
    ("s", 0x0073),
    ("t", 0x0074),
    ("u", 0x0075),
    ("v", 0x0076),
    ("w", 0x0077),
    ("x", 0x0078),
    ("y", 0x0079),
    ("z", 0x007a),
    ("space", 0x0020),
    ("return", 0xff0d),
    ("escape", 0xff1b),
    ("left", 0xff51),
    ("up", 0xff52),
    ("right", 0xff53),
    ("down", 0xff54),
];

/// The keysym bound to the given config file key name, if it is known.
pub fn keysym_for_name(name: &str) -> Option<u32> {
    KEYSYMS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, keysym)| keysym)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("a", Some(0x61); "letter")]
    #[test_case("9", Some(0x39); "digit")]
    #[test_case("return", Some(0xff0d); "named key")]
    #[test_case("Escape", None; "case sensitive")]
    #[test_case("semicolon", None; "outside the alphabet")]
    #[test]
    fn keysym_lookup(name: &str, expected: Option<u32>) {
        assert_eq!(keysym_for_name(name), expected);
    }

    #[test_case("super", ModMask::SUPER; "super_mod")]
    #[test_case("shift", ModMask::SHIFT; "shift")]
    #[test]
    fn modmask_parsing(s: &str, expected: ModMask) {
        assert_eq!(ModMask::try_from(s), Ok(expected));
    }

    #[test]
    fn unknown_modifiers_are_rejected(){
        assert!(ModMask::try_from("hyper").is_err());
    }

    #[test]
    fn ignoring_modifier_strips_numlock() {
        let k = KeyCode {
            mask: (ModMask::SUPER | ModMask::NUM_LOCK).bits(),
            code: 38,
        };

        let stripped = k.ignoring_modifier(ModMask::NUM_LOCK);

        assert_eq!(stripped.mask, ModMask::SUPER.bits());
        assert_eq!(stripped.code, 38);
    }
}
