//! Quickcheck based tests for the algebraic laws of the partition tree.
//!
//! These tests exercise the tree with arbitrary shapes rather than the
//! hand-built fixtures of the unit tests: inserting then unlinking is the
//! identity, flip and swap are involutions, and arranging never panics for
//! any screen size or client count.
use crate::{
    pure::{
        client::{Client, ClientState},
        geometry::Rect,
        tree::{Layout, Tree},
    },
    Xid,
};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use std::collections::HashSet;

// A tree of unique windows built by splitting a pseudo-randomly chosen
// leaf for each insertion. Window 42 is never used so tests can insert it.
impl Arbitrary for Tree {
    fn arbitrary(g: &mut Gen) -> Self {
        let windows: Vec<u32> = HashSet::<u32>::arbitrary(g)
            .into_iter()
            .filter(|&w| w != 42)
            .take(12)
            .collect();

        let mut t = Tree::new();
        for w in windows {
            let client = Client::new(Xid(w), None, 2, ClientState::Tiled);
            let leaves = t.leaves();
            if leaves.is_empty() {
                t.insert(client);
            } else {
                let target = leaves[usize::arbitrary(g) % leaves.len()];
                t.insert_at(target, client);
            }
        }

        t
    }
}

impl Arbitrary for Rect {
    fn arbitrary(g: &mut Gen) -> Self {
        // dimensions of at least 100px: zero area screens are not valid input
        Rect::new(
            u8::arbitrary(g) as i32,
            u8::arbitrary(g) as i32,
            (u16::arbitrary(g) as u32 % 4000) + 100,
            (u16::arbitrary(g) as u32 % 4000) + 100,
        )
    }
}

#[quickcheck]
fn unlink_of_insert_is_identity(mut t: Tree) -> bool {
    let shape_before = t.clone();
    let client = Client::new(Xid(42), None, 2, ClientState::Tiled);

    let id = match t.leaves().first() {
        Some(&target) => t.insert_at(target, client),
        None => t.insert(client),
    };
    t.unlink(id);

    t.windows() == shape_before.windows() && t.len() == shape_before.len()
}

#[quickcheck]
fn flip_is_an_involution(mut t: Tree, r: Rect) -> bool {
    t.arrange(Layout::Default, r, 10);
    let root = match t.root() {
        Some(root) if !t.node(root).is_leaf() => root,
        _ => return true, // nothing to flip
    };
    let before = t.clone();

    t.flip(root);
    t.flip(root);
    t.arrange(Layout::Default, r, 10);

    t == before
}

#[quickcheck]
fn double_swap_is_identity(mut t: Tree) -> bool {
    let leaves = t.leaves();
    if leaves.len() < 2 {
        return true;
    }
    let before = t.clone();

    t.swap_clients(leaves[0], leaves[1]);
    t.swap_clients(leaves[0], leaves[1]);

    t == before
}

#[quickcheck]
fn arrange_never_panics(mut t: Tree, r: Rect) -> bool {
    for layout in [Layout::Default, Layout::Master, Layout::Stack, Layout::Grid] {
        t.arrange(layout, r, 10);
    }

    true
}

#[quickcheck]
fn arrange_is_idempotent_for_every_layout(mut t: Tree, r: Rect) -> bool {
    [Layout::Default, Layout::Master, Layout::Stack, Layout::Grid]
        .into_iter()
        .all(|layout| {
            t.arrange(layout, r, 10);
            let first: Vec<Rect> = t.leaves().into_iter().map(|id| t.node(id).rect).collect();
            t.arrange(layout, r, 10);
            let second: Vec<Rect> = t.leaves().into_iter().map(|id| t.node(id).rect).collect();

            first == second
        })
}

#[quickcheck]
fn transfers_compose(mut t: Tree) -> bool {
    // transfer(L, D) then transfer(L, D') lands L in D' exactly once, with
    // the source tree unchanged from a single direct transfer
    let leaves = t.leaves();
    if leaves.is_empty() {
        return true;
    }

    let mut d1 = Tree::new();
    let mut d2 = Tree::new();
    let mut t2 = t.clone();

    // via d1
    let (c, _) = t.unlink(leaves[0]);
    let via = d1.insert(c);
    let (c, _) = d1.unlink(via);
    d2.insert(c);

    // direct
    let mut d2_direct = Tree::new();
    let (c, _) = t2.unlink(leaves[0]);
    d2_direct.insert(c);

    d1.is_empty() && d2.windows() == d2_direct.windows() && t.windows() == t2.windows()
}
