//! Partition state.
//!
//! A disjoint-set-union over [`Label`]s. This is the data structure the
//! alias analysis (in `veil-analysis`) threads through a function body: two
//! labels sit in the same equivalence class exactly when the analysis has
//! proven they currently name the same principal.
//!
//! `merge` and `move_to` run in `O(α(n))`; `separate_all` is `O(n)` and
//! recreates a singleton class for every label currently present, which is
//! the "forget everything" operation used at imprecise control-flow joins.

use std::collections::HashMap;
use crate::label::Label;

/// A disjoint-set-union over privacy labels.
///
/// Every inserted label belongs to exactly one equivalence class until it
/// is removed. `PartitionState` is cheaply [`Clone`]-able (a structural
/// copy of two flat vectors) so flow analyses can fork state at branch
/// points without aliasing.
#[derive(Debug, Clone, Default)]
pub struct PartitionState {
    index: HashMap<Label, usize>,
    parent: Vec<usize>,
    rank: Vec<usize>,
    labels: Vec<Label>,
}

impl PartitionState {
    /// Creates an empty partition state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `l` as a new singleton class.
    ///
    /// If `l` is already present this is a no-op: it stays in whatever
    /// class it currently belongs to.
    pub fn insert(&mut self, l: Label) {
        if self.index.contains_key(&l) {
            return;
        }
        let id = self.parent.len();
        self.index.insert(l, id);
        self.parent.push(id);
        self.rank.push(0);
        self.labels.push(l);
    }

    /// Returns `true` if `l` is currently present in the partition.
    pub fn has(&self, l: Label) -> bool {
        self.index.contains_key(&l)
    }

    /// Removes `l` from the partition entirely.
    ///
    /// Removal is O(n): we rebuild the structure from the remaining
    /// labels' current equivalence classes, which keeps the
    /// implementation simple for the small label counts a single
    /// function body carries.
    pub fn remove(&mut self, l: Label) {
        if !self.index.contains_key(&l) {
            return;
        }

        let mut groups: HashMap<usize, Vec<Label>> = HashMap::new();
        for (i, &label) in self.labels.iter().enumerate() {
            if label == l {
                continue;
            }
            let root = self.find(i);
            groups.entry(root).or_default().push(label);
        }

        let mut fresh = PartitionState::new();
        for class in groups.into_values() {
            if class.is_empty() {
                continue;
            }
            let first = class[0];
            fresh.insert(first);
            for &other in &class[1..] {
                fresh.insert(other);
                fresh.merge(first, other);
            }
        }
        *self = fresh;
    }

    /// Unions the classes containing `a` and `b`.
    ///
    /// # Panics
    ///
    /// Panics if either label is not present — callers are expected to
    /// `insert` both labels first.
    pub fn merge(&mut self, a: Label, b: Label) {
        let ra = self.find(self.index[&a]);
        let rb = self.find(self.index[&b]);
        if ra == rb {
            return;
        }
        if self.rank[ra] < self.rank[rb] {
            self.parent[ra] = rb;
        } else if self.rank[ra] > self.rank[rb] {
            self.parent[rb] = ra;
        } else {
            self.parent[rb] = ra;
            self.rank[ra] += 1;
        }
    }

    /// Assignment semantics: `a := ... b ...` is now known to equal `b`.
    ///
    /// Removes `a` from whatever class it currently occupies and places it
    /// into `b`'s class — unlike `merge`, this is directional and does not
    /// carry forward any equivalence `a` had before the assignment.
    ///
    /// # Panics
    ///
    /// Panics if either label is not present.
    pub fn move_to(&mut self, a: Label, b: Label) {
        assert!(self.has(a) && self.has(b));
        self.remove(a);
        self.insert(a);
        self.merge(a, b);
    }

    /// Returns `true` if `a` and `b` are in the same equivalence class.
    ///
    /// # Panics
    ///
    /// Panics if either label is not present.
    pub fn same_partition(&self, a: Label, b: Label) -> bool {
        self.find(self.index[&a]) == self.find(self.index[&b])
    }

    /// Forgets every equivalence: every currently-present label becomes
    /// its own singleton class. Used after side-effecting expressions and
    /// at imprecise control-flow joins.
    pub fn separate_all(&self) -> PartitionState {
        let mut fresh = PartitionState::new();
        for &label in &self.labels {
            fresh.insert(label);
        }
        fresh
    }

    /// A structural clone, used to fork state at branch points.
    pub fn copy(&self) -> PartitionState {
        self.clone()
    }

    fn find(&self, mut i: usize) -> usize {
        while self.parent[i] != i {
            i = self.parent[i];
        }
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_base::Interner;

    fn labels(interner: &mut Interner) -> (Label, Label, Label) {
        let a = Label::Id(interner.intern("a"));
        let b = Label::Id(interner.intern("b"));
        let c = Label::Id(interner.intern("c"));
        (a, b, c)
    }

    #[test]
    fn fresh_labels_are_their_own_class() {
        let mut interner = Interner::new();
        let (a, b, _) = labels(&mut interner);
        let mut p = PartitionState::new();
        p.insert(a);
        p.insert(b);
        assert!(!p.same_partition(a, b));
    }

    #[test]
    fn merge_unifies_classes() {
        let mut interner = Interner::new();
        let (a, b, _) = labels(&mut interner);
        let mut p = PartitionState::new();
        p.insert(a);
        p.insert(b);
        p.merge(a, b);
        assert!(p.same_partition(a, b));
    }

    #[test]
    fn merge_is_transitive() {
        let mut interner = Interner::new();
        let (a, b, c) = labels(&mut interner);
        let mut p = PartitionState::new();
        p.insert(a);
        p.insert(b);
        p.insert(c);
        p.merge(a, b);
        p.merge(b, c);
        assert!(p.same_partition(a, c));
    }

    #[test]
    fn move_to_breaks_old_equivalence() {
        let mut interner = Interner::new();
        let (a, b, c) = labels(&mut interner);
        let mut p = PartitionState::new();
        p.insert(a);
        p.insert(b);
        p.insert(c);
        p.merge(a, b);
        p.move_to(a, c);
        assert!(p.same_partition(a, c));
        assert!(!p.same_partition(a, b));
    }

    #[test]
    fn separate_all_forgets_every_equivalence() {
        let mut interner = Interner::new();
        let (a, b, c) = labels(&mut interner);
        let mut p = PartitionState::new();
        p.insert(a);
        p.insert(b);
        p.insert(c);
        p.merge(a, b);
        p.merge(b, c);
        let after = p.separate_all();
        assert!(!after.same_partition(a, b));
        assert!(!after.same_partition(b, c));
        assert!(after.has(a) && after.has(b) && after.has(c));
    }

    #[test]
    fn copy_forks_state_independently() {
        let mut interner = Interner::new();
        let (a, b, _) = labels(&mut interner);
        let mut p = PartitionState::new();
        p.insert(a);
        p.insert(b);
        let mut forked = p.copy();
        forked.merge(a, b);
        assert!(!p.same_partition(a, b));
        assert!(forked.same_partition(a, b));
    }

    #[test]
    fn remove_drops_label_but_keeps_others_equivalence() {
        let mut interner = Interner::new();
        let (a, b, c) = labels(&mut interner);
        let mut p = PartitionState::new();
        p.insert(a);
        p.insert(b);
        p.insert(c);
        p.merge(b, c);
        p.remove(a);
        assert!(!p.has(a));
        assert!(p.same_partition(b, c));
    }

    #[test]
    #[should_panic]
    fn merge_panics_on_absent_label() {
        let mut interner = Interner::new();
        let (a, b, _) = labels(&mut interner);
        let mut p = PartitionState::new();
        p.insert(a);
        p.merge(a, b);
    }
}
