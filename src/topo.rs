//! Dependency-aware ordering of batch operations
//!
//! [`TopoSortedList`] holds the items of one multi-package operation and
//! yields them in a topological order with respect to their declared
//! dependency edges. Edges to identifiers absent from the collection are
//! ignored; those are resolved elsewhere (typically "already installed").
//!
//! Installation consumes the order front-to-back (dependencies first);
//! uninstallation builds the same order and consumes it back-to-front, so
//! dependents are removed before their dependencies.
//!
//! Batch sizes are tens of items, so the order is recomputed with a stable
//! Kahn pass on every insert rather than maintained incrementally.

use crate::specifier::PackageIdentifier;
use crate::{Error, Result};
use semver::VersionReq;
use std::collections::BTreeMap;

/// An item that can participate in dependency ordering.
pub trait TopoItem {
    /// Stable identity within the collection.
    fn identifier(&self) -> PackageIdentifier;

    /// Declared dependency edges: identifier -> required version range.
    /// The range is not interpreted here; only the edge matters.
    fn dependencies(&self) -> BTreeMap<PackageIdentifier, VersionReq>;
}

/// A collection whose iteration order is always a valid topological order
/// of the items currently present.
pub struct TopoSortedList<T: TopoItem> {
    items: Vec<T>,
    // Indices into `items`, topologically sorted.
    order: Vec<usize>,
}

impl<T: TopoItem> TopoSortedList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert an item, keeping the iteration order topological. Fails with
    /// [`Error::DependencyCycle`] and leaves the collection unchanged when
    /// the item would close a dependency cycle among present items.
    pub fn add(&mut self, item: T) -> Result<()> {
        self.items.push(item);

        match Self::sort(&self.items) {
            Ok(order) => {
                self.order = order;
                Ok(())
            }
            Err(e) => {
                self.items.pop();
                Err(e)
            }
        }
    }

    /// Items in dependencies-first order. The returned iterator is
    /// double-ended; `.rev()` gives the uninstall order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.order.iter().map(move |&i| &self.items[i])
    }

    // Stable Kahn pass: repeatedly emit the earliest-inserted item whose
    // present dependencies have all been emitted. Deterministic for a fixed
    // sequence of adds; unconstrained items keep their insertion order.
    fn sort(items: &[T]) -> Result<Vec<usize>> {
        let ids: Vec<PackageIdentifier> = items.iter().map(|item| item.identifier()).collect();
        let mut emitted = vec![false; items.len()];
        let mut order = Vec::with_capacity(items.len());

        while order.len() < items.len() {
            let next = (0..items.len()).find(|&i| {
                !emitted[i]
                    && items[i].dependencies().keys().all(|dep| {
                        // Edges to absent identifiers are ignored.
                        !ids.iter().enumerate().any(|(j, id)| id == dep && !emitted[j])
                    })
            });

            match next {
                Some(i) => {
                    emitted[i] = true;
                    order.push(i);
                }
                None => {
                    let stuck: Vec<String> = ids
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| !emitted[*i])
                        .map(|(_, id)| id.to_string())
                        .collect();
                    return Err(Error::DependencyCycle(stuck.join(" → ")));
                }
            }
        }

        Ok(order)
    }
}

impl<T: TopoItem> Default for TopoSortedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        id: &'static str,
        deps: Vec<&'static str>,
    }

    impl Item {
        fn new(id: &'static str, deps: &[&'static str]) -> Self {
            Self {
                id,
                deps: deps.to_vec(),
            }
        }
    }

    impl TopoItem for Item {
        fn identifier(&self) -> PackageIdentifier {
            self.id.parse().unwrap()
        }

        fn dependencies(&self) -> BTreeMap<PackageIdentifier, VersionReq> {
            self.deps
                .iter()
                .map(|d| (d.parse().unwrap(), VersionReq::STAR))
                .collect()
        }
    }

    fn ids<T: TopoItem>(list: &TopoSortedList<T>) -> Vec<String> {
        list.iter().map(|i| i.identifier().to_string()).collect()
    }

    #[test]
    fn test_unconstrained_items_keep_insertion_order() {
        let mut list = TopoSortedList::new();
        list.add(Item::new("c", &[])).unwrap();
        list.add(Item::new("a", &[])).unwrap();
        list.add(Item::new("b", &[])).unwrap();
        assert_eq!(ids(&list), ["c", "a", "b"]);
    }

    #[test]
    fn test_dependency_precedes_dependent() {
        let mut list = TopoSortedList::new();
        list.add(Item::new("app", &["lib"])).unwrap();
        list.add(Item::new("lib", &[])).unwrap();
        assert_eq!(ids(&list), ["lib", "app"]);
    }

    #[test]
    fn test_chain_and_reverse() {
        let mut list = TopoSortedList::new();
        list.add(Item::new("c", &["b"])).unwrap();
        list.add(Item::new("b", &["a"])).unwrap();
        list.add(Item::new("a", &[])).unwrap();
        assert_eq!(ids(&list), ["a", "b", "c"]);

        let reversed: Vec<String> = list
            .iter()
            .rev()
            .map(|i| i.identifier().to_string())
            .collect();
        assert_eq!(reversed, ["c", "b", "a"]);
    }

    #[test]
    fn test_edges_to_absent_items_ignored() {
        let mut list = TopoSortedList::new();
        list.add(Item::new("app", &["not-present"])).unwrap();
        list.add(Item::new("tool", &[])).unwrap();
        assert_eq!(ids(&list), ["app", "tool"]);
    }

    #[test]
    fn test_diamond() {
        let mut list = TopoSortedList::new();
        list.add(Item::new("top", &["left", "right"])).unwrap();
        list.add(Item::new("left", &["base"])).unwrap();
        list.add(Item::new("right", &["base"])).unwrap();
        list.add(Item::new("base", &[])).unwrap();

        let order = ids(&list);
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(pos("base") < pos("left"));
        assert!(pos("base") < pos("right"));
        assert!(pos("left") < pos("top"));
        assert!(pos("right") < pos("top"));
    }

    #[test]
    fn test_cycle_rejected_and_list_unchanged() {
        let mut list = TopoSortedList::new();
        list.add(Item::new("a", &["b"])).unwrap();
        list.add(Item::new("b", &["c"])).unwrap();

        let err = list.add(Item::new("c", &["a"])).unwrap_err();
        assert!(matches!(err, Error::DependencyCycle(_)));

        // The failed add left the collection usable.
        assert_eq!(list.len(), 2);
        assert_eq!(ids(&list), ["b", "a"]);
    }

    #[test]
    fn test_self_cycle_rejected() {
        let mut list = TopoSortedList::new();
        let err = list.add(Item::new("a", &["a"])).unwrap_err();
        assert!(err.to_string().contains("cycle"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_deterministic_for_fixed_add_sequence() {
        let build = || {
            let mut list = TopoSortedList::new();
            list.add(Item::new("x", &["z"])).unwrap();
            list.add(Item::new("y", &[])).unwrap();
            list.add(Item::new("z", &[])).unwrap();
            ids(&list)
        };
        assert_eq!(build(), build());
    }
}
