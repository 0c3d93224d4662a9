//! A virtual desktop: one partition tree plus its layout policy
use crate::{
    pure::{
        client::Client,
        geometry::Rect,
        tree::{Layout, NodeId, Tree},
    },
    Xid,
};

/// An indexed workspace holding one partition tree.
///
/// Desktops are created with their monitor and live for its lifetime; only
/// their content changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Desktop {
    /// 1-based desktop id, unique per monitor
    pub id: usize,
    /// Name published via _NET_DESKTOP_NAMES
    pub name: String,
    /// The active layout policy
    pub layout: Layout,
    /// The partition tree (possibly empty)
    pub tree: Tree,
    /// The window shown on top when `layout` is [Layout::Stack]
    pub top_window: Option<Xid>,
    /// Whether this is the focused desktop of its monitor
    pub focused: bool,
    n_count: usize,
}

impl Desktop {
    /// Create a new empty desktop.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            name: id.to_string(),
            layout: Layout::default(),
            tree: Tree::new(),
            top_window: None,
            focused: false,
            n_count: 0,
        }
    }

    /// The number of clients on this desktop.
    pub fn client_count(&self) -> usize {
        self.n_count
    }

    /// True when this desktop holds no clients.
    pub fn is_empty(&self) -> bool {
        self.n_count == 0
    }

    /// Insert a client at the given target leaf (or the leftmost leaf when
    /// no target is supplied), keeping the leaf count in sync.
    pub fn insert(&mut self, target: Option<NodeId>, client: Client) -> NodeId {
        let id = match target {
            Some(t) => self.tree.insert_at(t, client),
            None => self.tree.insert(client),
        };
        self.n_count += 1;
        debug_assert_eq!(self.n_count, self.tree.len());

        id
    }

    /// Unlink the leaf holding `window`, clearing any stale stack-top
    /// reference to it. Returns the removed client if it was here.
    pub fn remove_window(&mut self, window: Xid) -> Option<Client> {
        let leaf = self.tree.leaf_for_window(window)?;
        let (client, _) = self.tree.unlink(leaf);
        self.n_count -= 1;
        debug_assert_eq!(self.n_count, self.tree.len());

        // top_window is cleared on every unlink, even while this desktop
        // is hidden, so it can never dangle
        if self.top_window == Some(window) {
            self.top_window = None;
        }

        Some(client)
    }

    /// Recompute the tree's rectangles within `usable`.
    pub fn arrange(&mut self, usable: Rect, gap: u32) {
        self.tree.arrange(self.layout, usable, gap);
    }

    /// Change the layout policy. Entering [Layout::Stack] records the
    /// focused window as the top of the stack.
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;

        if layout == Layout::Stack {
            self.top_window = self
                .tree
                .focused_leaf()
                .or_else(|| self.tree.leftmost_leaf())
                .and_then(|id| self.tree.client(id).map(|c| c.id));
        } else {
            self.top_window = None;
        }
    }

    /// Cycle the stacked window up or down through the leaves. Only
    /// meaningful under [Layout::Stack]; returns the new top window.
    pub fn traverse_stack(&mut self, forward: bool) -> Option<Xid> {
        if self.layout != Layout::Stack {
            return None;
        }

        let current = self
            .top_window
            .and_then(|w| self.tree.leaf_for_window(w))
            .or_else(|| self.tree.leftmost_leaf())?;

        let next = if forward {
            self.tree.next_leaf(current)?
        } else {
            self.tree.prev_leaf(current)?
        };

        self.top_window = self.tree.client(next).map(|c| c.id);
        self.top_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pure::client::ClientState;
    use simple_test_case::test_case;

    fn client(id: u32) -> Client {
        Client::new(Xid(id), None, 2, ClientState::Tiled)
    }

    fn desktop_of(n: u32) -> Desktop {
        let mut d = Desktop::new(1);
        for id in 0..n {
            d.insert(None, client(id));
        }

        d
    }

    #[test]
    fn client_count_tracks_the_tree() {
        let mut d = desktop_of(3);
        assert_eq!(d.client_count(), 3);

        d.remove_window(Xid(1));
        assert_eq!(d.client_count(), 2);
        assert_eq!(d.client_count(), d.tree.len());
    }

    #[test]
    fn removing_an_unknown_window_is_a_noop() {
        let mut d = desktop_of(2);

        assert!(d.remove_window(Xid(99)).is_none());
        assert_eq!(d.client_count(), 2);
    }

    #[test]
    fn unlink_clears_a_stale_stack_top() {
        let mut d = desktop_of(3);
        d.set_layout(Layout::Stack);
        d.top_window = Some(Xid(2));

        d.remove_window(Xid(2));

        assert_eq!(d.top_window, None);
    }

    // leaves of desktop_of(3) run [0, 2, 1]: each insert splits the leftmost leaf
    #[test_case(true, Xid(2); "forward")]
    #[test_case(false, Xid(1); "backward wraps")]
    #[test]
    fn traverse_stack_cycles(forward: bool, expected: Xid) {
        let mut d = desktop_of(3);
        d.set_layout(Layout::Stack);
        d.top_window = Some(Xid(0));

        assert_eq!(d.traverse_stack(forward), Some(expected));
    }

    #[test]
    fn traverse_outside_stack_layout_is_a_noop() {
        let mut d = desktop_of(3);

        assert_eq!(d.traverse_stack(true), None);
    }
}
