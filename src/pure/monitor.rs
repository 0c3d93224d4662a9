//! A physical output and the desktops bound to it
use crate::pure::{
    desktop::Desktop,
    geometry::{Point, Rect},
};

/// A connected output with a fixed set of virtual desktops.
///
/// Exactly one monitor is primary and exactly one is focused at any time;
/// the global state enforces both.
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    /// Stable 1-based index in discovery order
    pub id: usize,
    /// The randr output id this monitor was discovered from
    pub randr_id: u32,
    /// The output name reported by randr
    pub name: String,
    /// Position and size within the virtual screen
    pub rect: Rect,
    /// Whether this is the primary output
    pub primary: bool,
    /// Whether this monitor currently holds the focused desktop
    pub focused: bool,
    /// The desktops bound to this output, ordered by id
    pub desktops: Vec<Desktop>,
}

impl Monitor {
    /// Create a monitor with `n_desktops` empty desktops, the first focused.
    pub fn new(
        id: usize,
        name: impl Into<String>,
        rect: Rect,
        randr_id: u32,
        primary: bool,
        n_desktops: usize,
    ) -> Self {
        let mut desktops: Vec<Desktop> = (1..=n_desktops.max(1)).map(Desktop::new).collect();
        desktops[0].focused = true;

        Self {
            id,
            randr_id,
            name: name.into(),
            rect,
            primary,
            focused: false,
            desktops,
        }
    }

    /// Index of the focused desktop on this monitor.
    pub fn focused_desktop_ix(&self) -> usize {
        self.desktops.iter().position(|d| d.focused).unwrap_or(0)
    }

    /// The focused desktop on this monitor.
    pub fn focused_desktop(&self) -> &Desktop {
        &self.desktops[self.focused_desktop_ix()]
    }

    /// Mutable access to the focused desktop on this monitor.
    pub fn focused_desktop_mut(&mut self) -> &mut Desktop {
        let ix = self.focused_desktop_ix();
        &mut self.desktops[ix]
    }

    /// Move desktop focus to index `ix` (no-op when out of range).
    pub fn focus_desktop(&mut self, ix: usize) {
        if ix >= self.desktops.len() {
            return;
        }
        for (i, d) in self.desktops.iter_mut().enumerate() {
            d.focused = i == ix;
        }
    }

    /// Whether the given point falls inside this monitor's rectangle.
    pub fn contains(&self, p: Point) -> bool {
        self.rect.contains_point(p)
    }

    /// The rectangle available to tiled clients on this monitor: the output
    /// rectangle minus the bar strip (primary monitor only), a `gap` on each
    /// edge and the border pixels drawn by the server around each window.
    pub fn usable_rect(&self, bar_height: u32, gap: u32, border: u32) -> Rect {
        let edge = gap + border;

        Rect {
            x: self.rect.x + edge as i32,
            y: self.rect.y + (bar_height + edge) as i32,
            w: self.rect.w.saturating_sub(2 * edge + 2 * border),
            h: self.rect.h.saturating_sub(bar_height + 2 * edge + 2 * border),
        }
    }

    /// Merge the desktops of a disconnected monitor into this one.
    ///
    /// Each client of the vanished output is re-inserted (leftmost leaf)
    /// into this monitor's desktop with the same desktop id, preserving the
    /// left to right window order of the source trees.
    pub fn absorb(&mut self, other: Monitor) {
        for mut src in other.desktops {
            let ix = (src.id - 1).min(self.desktops.len() - 1);
            for window in src.tree.windows() {
                if let Some(client) = src.remove_window(window) {
                    self.desktops[ix].insert(None, client);
                }
            }
        }
    }

    /// Grow or shrink the desktop count on a config reload.
    ///
    /// Clients of removed desktops migrate to the lowest-numbered surviving
    /// desktop rather than being discarded; focus falls back to desktop 1
    /// if the focused desktop was removed.
    pub fn set_desktop_count(&mut self, n: usize) {
        let n = n.max(1);

        while self.desktops.len() < n {
            self.desktops.push(Desktop::new(self.desktops.len() + 1));
        }

        if self.desktops.len() > n {
            let refocus = self.focused_desktop_ix() >= n;
            let removed: Vec<Desktop> = self.desktops.split_off(n);
            for mut src in removed {
                for window in src.tree.windows() {
                    if let Some(client) = src.remove_window(window) {
                        self.desktops[0].insert(None, client);
                    }
                }
            }
            if refocus {
                self.focus_desktop(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pure::client::{Client, ClientState},
        Xid,
    };
    use simple_test_case::test_case;

    fn client(id: u32) -> Client {
        Client::new(Xid(id), None, 2, ClientState::Tiled)
    }

    #[test_case(0, 10, 2, Rect::new(12, 12, 1892, 1052); "no bar")]
    #[test_case(30, 10, 2, Rect::new(12, 42, 1892, 1022); "with bar")]
    #[test_case(0, 0, 0, Rect::new(0, 0, 1920, 1080); "no padding at all")]
    #[test]
    fn usable_rect(bar: u32, gap: u32, border: u32, expected: Rect) {
        let m = Monitor::new(1, "DP-1", Rect::new(0, 0, 1920, 1080), 1, true, 3);

        assert_eq!(m.usable_rect(bar, gap, border), expected);
    }

    #[test]
    fn new_monitor_focuses_its_first_desktop() {
        let m = Monitor::new(1, "DP-1", Rect::new(0, 0, 1920, 1080), 1, true, 4);

        assert_eq!(m.desktops.len(), 4);
        assert_eq!(m.focused_desktop_ix(), 0);
    }

    #[test]
    fn absorb_merges_matching_desktop_ids() {
        let mut a = Monitor::new(1, "DP-1", Rect::new(0, 0, 1920, 1080), 1, true, 3);
        let mut b = Monitor::new(2, "DP-2", Rect::new(1920, 0, 1920, 1080), 2, false, 3);
        a.desktops[0].insert(None, client(1));
        b.desktops[0].insert(None, client(2));
        b.desktops[2].insert(None, client(3));

        a.absorb(b);

        assert_eq!(a.desktops[0].tree.windows(), vec![Xid(1), Xid(2)]);
        assert_eq!(a.desktops[2].tree.windows(), vec![Xid(3)]);
    }

    #[test]
    fn shrinking_desktops_migrates_clients_to_the_first_desktop() {
        let mut m = Monitor::new(1, "DP-1", Rect::new(0, 0, 1920, 1080), 1, true, 4);
        m.desktops[3].insert(None, client(7));
        m.focus_desktop(3);

        m.set_desktop_count(2);

        assert_eq!(m.desktops.len(), 2);
        assert_eq!(m.desktops[0].tree.windows(), vec![Xid(7)]);
        assert_eq!(m.focused_desktop_ix(), 0);
    }

    #[test]
    fn growing_desktops_appends_empty_ones() {
        let mut m = Monitor::new(1, "DP-1", Rect::new(0, 0, 1920, 1080), 1, true, 2);

        m.set_desktop_count(5);

        assert_eq!(m.desktops.len(), 5);
        assert_eq!(m.desktops[4].id, 5);
        assert!(m.desktops[4].is_empty());
    }
}
