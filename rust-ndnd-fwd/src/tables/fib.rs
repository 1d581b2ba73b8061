//! The Forwarding Information Base: name prefix → next-hop faces.

use crate::face::FaceId;
use crate::tables::name_tree::{NameTree, TableRef};
use rust_ndnd_common::name::Name;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextHop {
    pub face: FaceId,
    pub cost: u32,
}

/// At most one next-hop per face, ordered by ascending cost.
#[derive(Debug)]
pub struct FibEntry {
    name: Name,
    next_hops: Vec<NextHop>,
}

impl FibEntry {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn next_hops(&self) -> &[NextHop] {
        &self.next_hops
    }
}

#[derive(Debug, Default)]
pub struct Fib {
    entries: HashMap<Name, FibEntry>,
}

impl Fib {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or updates the next-hop for `face` under `name`. Idempotent per
    /// face within an entry.
    pub fn insert_next_hop(
        &mut self,
        name_tree: &mut NameTree,
        name: &Name,
        face: FaceId,
        cost: u32,
    ) {
        let entry = self.entries.entry(name.clone()).or_insert_with(|| {
            name_tree.register(name, TableRef::Fib);
            FibEntry {
                name: name.clone(),
                next_hops: Vec::new(),
            }
        });
        match entry.next_hops.iter_mut().find(|h| h.face == face) {
            Some(hop) => hop.cost = cost,
            None => entry.next_hops.push(NextHop { face, cost }),
        }
        entry.next_hops.sort_by_key(|h| (h.cost, h.face));
    }

    /// Removes the next-hop for `face` under `name`; erases the entry when
    /// it becomes empty. Idempotent.
    pub fn remove_next_hop(&mut self, name_tree: &mut NameTree, name: &Name, face: FaceId) {
        let Some(entry) = self.entries.get_mut(name) else {
            return;
        };
        entry.next_hops.retain(|h| h.face != face);
        if entry.next_hops.is_empty() {
            self.entries.remove(name);
            name_tree.unregister(name, TableRef::Fib);
        }
    }

    /// Erases the whole entry for `name`.
    pub fn erase(&mut self, name_tree: &mut NameTree, name: &Name) {
        if self.entries.remove(name).is_some() {
            name_tree.unregister(name, TableRef::Fib);
        }
    }

    /// Drops `face` from every entry, erasing entries left without
    /// next-hops. Used when a face is retired.
    pub fn remove_face(&mut self, name_tree: &mut NameTree, face: FaceId) {
        let mut emptied = Vec::new();
        for (name, entry) in self.entries.iter_mut() {
            entry.next_hops.retain(|h| h.face != face);
            if entry.next_hops.is_empty() {
                emptied.push(name.clone());
            }
        }
        for name in emptied {
            self.entries.remove(&name);
            name_tree.unregister(&name, TableRef::Fib);
        }
    }

    pub fn find_exact(&self, name: &Name) -> Option<&FibEntry> {
        self.entries.get(name)
    }

    /// Longest-prefix match through the NameTree ancestor walk.
    pub fn find_longest_prefix_match<'f>(
        &'f self,
        name_tree: &NameTree,
        name: &Name,
    ) -> Option<&'f FibEntry> {
        for prefix in name_tree.ancestors_of(name) {
            if let Some(entry) = self.entries.get(&prefix) {
                return Some(entry);
            }
        }
        None
    }

    pub fn entries(&self) -> impl Iterator<Item = &FibEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent_per_face() {
        let mut nt = NameTree::new();
        let mut fib = Fib::new();
        let name = Name::from_string("/a");

        fib.insert_next_hop(&mut nt, &name, FaceId(1), 10);
        fib.insert_next_hop(&mut nt, &name, FaceId(1), 5);

        let entry = fib.find_exact(&name).unwrap();
        assert_eq!(entry.next_hops().len(), 1);
        assert_eq!(entry.next_hops()[0].cost, 5);
    }

    #[test]
    fn test_next_hops_sorted_by_cost() {
        let mut nt = NameTree::new();
        let mut fib = Fib::new();
        let name = Name::from_string("/a");

        fib.insert_next_hop(&mut nt, &name, FaceId(3), 30);
        fib.insert_next_hop(&mut nt, &name, FaceId(1), 10);
        fib.insert_next_hop(&mut nt, &name, FaceId(2), 20);

        let faces: Vec<FaceId> = fib
            .find_exact(&name)
            .unwrap()
            .next_hops()
            .iter()
            .map(|h| h.face)
            .collect();
        assert_eq!(faces, vec![FaceId(1), FaceId(2), FaceId(3)]);
    }

    #[test]
    fn test_longest_prefix_match() {
        let mut nt = NameTree::new();
        let mut fib = Fib::new();

        fib.insert_next_hop(&mut nt, &Name::from_string("/a"), FaceId(1), 10);
        fib.insert_next_hop(&mut nt, &Name::from_string("/a/b"), FaceId(2), 10);

        let hit = fib
            .find_longest_prefix_match(&nt, &Name::from_string("/a/b/c"))
            .unwrap();
        assert_eq!(hit.name(), &Name::from_string("/a/b"));

        let hit = fib
            .find_longest_prefix_match(&nt, &Name::from_string("/a/x"))
            .unwrap();
        assert_eq!(hit.name(), &Name::from_string("/a"));

        assert!(fib
            .find_longest_prefix_match(&nt, &Name::from_string("/z"))
            .is_none());
    }

    #[test]
    fn test_remove_face_purges_entries() {
        let mut nt = NameTree::new();
        let mut fib = Fib::new();

        fib.insert_next_hop(&mut nt, &Name::from_string("/a"), FaceId(1), 10);
        fib.insert_next_hop(&mut nt, &Name::from_string("/a"), FaceId(2), 20);
        fib.insert_next_hop(&mut nt, &Name::from_string("/b"), FaceId(1), 10);

        fib.remove_face(&mut nt, FaceId(1));

        assert_eq!(fib.find_exact(&Name::from_string("/a")).unwrap().next_hops().len(), 1);
        assert!(fib.find_exact(&Name::from_string("/b")).is_none());
        assert!(!nt.contains(&Name::from_string("/b")));
    }

    #[test]
    fn test_empty_entry_is_erased() {
        let mut nt = NameTree::new();
        let mut fib = Fib::new();
        let name = Name::from_string("/a");

        fib.insert_next_hop(&mut nt, &name, FaceId(1), 10);
        fib.remove_next_hop(&mut nt, &name, FaceId(1));

        assert!(fib.find_exact(&name).is_none());
        assert!(!nt.contains(&name));
        // A second removal is a no-op.
        fib.remove_next_hop(&mut nt, &name, FaceId(1));
    }
}
