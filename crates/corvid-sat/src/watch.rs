//! Per-literal watcher lists for the 2-watched literal scheme

use crate::arena::{ClauseArena, ClauseRef};
use crate::literal::Literal;

/// A watcher entry: the watching clause plus a blocker literal.
///
/// The blocker is some other literal of the clause; if it is already true the
/// clause is satisfied and propagation skips loading the clause at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watcher {
    /// The clause in which the negation of the list's literal is watched.
    pub cref: ClauseRef,
    /// Cached satisfaction hint.
    pub blocker: Literal,
}

impl Watcher {
    /// New watcher for `cref` with the given blocker.
    #[inline]
    pub fn new(cref: ClauseRef, blocker: Literal) -> Self {
        Watcher { cref, blocker }
    }
}

/// Watcher lists indexed by literal.
///
/// `lists[p]` holds the clauses in which `~p` is watched. Deletion is mostly
/// lazy: detaching a clause marks its two lists dirty, and a later
/// [`WatchLists::clean_all`] sweeps dirty lists dropping watchers of freed
/// clauses.
#[derive(Debug, Default)]
pub struct WatchLists {
    lists: Vec<Vec<Watcher>>,
    dirty: Vec<bool>,
    dirties: Vec<Literal>,
}

impl WatchLists {
    /// Empty watch index.
    pub fn new() -> Self {
        WatchLists::default()
    }

    /// Grow the index to cover literals of `num_vars` variables.
    pub fn ensure_vars(&mut self, num_vars: usize) {
        let target = num_vars * 2;
        if self.lists.len() < target {
            self.lists.resize_with(target, Vec::new);
            self.dirty.resize(target, false);
        }
    }

    /// Append a watcher to `lit`'s list.
    #[inline]
    pub fn push(&mut self, lit: Literal, w: Watcher) {
        self.lists[lit.index()].push(w);
    }

    /// Remove the watcher of `cref` from `lit`'s list, preserving order.
    /// Matches on the clause alone: the blocker drifts as propagation updates
    /// it, so it cannot identify the entry.
    pub fn remove(&mut self, lit: Literal, cref: ClauseRef) {
        let list = &mut self.lists[lit.index()];
        if let Some(pos) = list.iter().position(|x| x.cref == cref) {
            list.remove(pos);
        }
    }

    /// Mark `lit`'s list as containing watchers of freed clauses.
    pub fn smudge(&mut self, lit: Literal) {
        if !self.dirty[lit.index()] {
            self.dirty[lit.index()] = true;
            self.dirties.push(lit);
        }
    }

    /// Sweep every dirty list, dropping watchers whose clause is deleted.
    pub fn clean_all(&mut self, arena: &ClauseArena) {
        while let Some(lit) = self.dirties.pop() {
            // A list may have been smudged and cleaned through an alias; the
            // dirty bit is authoritative.
            if self.dirty[lit.index()] {
                self.lists[lit.index()].retain(|w| !arena.is_deleted(w.cref));
                self.dirty[lit.index()] = false;
            }
        }
    }

    /// Watchers of `lit`, read-only.
    #[inline]
    pub fn get(&self, lit: Literal) -> &[Watcher] {
        &self.lists[lit.index()]
    }

    /// Raw pointer and length of `lit`'s list, for in-place compaction during
    /// propagation while other lists are being appended to.
    #[inline]
    pub fn list_raw(&mut self, lit: Literal) -> (*mut Watcher, usize) {
        let list = &mut self.lists[lit.index()];
        (list.as_mut_ptr(), list.len())
    }

    /// Shrink `lit`'s list to `new_len` entries.
    #[inline]
    pub fn truncate(&mut self, lit: Literal, new_len: usize) {
        self.lists[lit.index()].truncate(new_len);
    }

    /// Visit every watcher mutably; used to rewrite clause references at
    /// garbage-collection time.
    pub fn for_each_watcher_mut(&mut self, mut f: impl FnMut(&mut Watcher)) {
        for list in &mut self.lists {
            for w in list.iter_mut() {
                f(w);
            }
        }
    }
}
