//! Session Store Module
//!
//! Nested key/value storage owned by one UI session. Every node is either a map
//! of further nodes, a cached query result, or a plain JSON value. All access is
//! by path; a missing segment anywhere along the path simply means "absent".

use std::collections::BTreeMap;

use serde_json::Value;

use crate::cache::CacheEntry;

// == Store Node ==
#[derive(Debug, Clone)]
pub enum StoreNode {
    Map(BTreeMap<String, StoreNode>),
    Entry(CacheEntry),
    Value(Value),
}

impl StoreNode {
    pub fn as_map(&self) -> Option<&BTreeMap<String, StoreNode>> {
        match self {
            StoreNode::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<&CacheEntry> {
        match self {
            StoreNode::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            StoreNode::Value(value) => Some(value),
            _ => None,
        }
    }
}

// == Session Store ==
#[derive(Debug, Default)]
pub struct SessionStore {
    root: BTreeMap<String, StoreNode>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if every segment of `path` exists.
    pub fn contains(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    pub fn get(&self, path: &[&str]) -> Option<&StoreNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get(*first)?;
        for segment in rest {
            node = node.as_map()?.get(*segment)?;
        }
        Some(node)
    }

    pub fn get_mut(&mut self, path: &[&str]) -> Option<&mut StoreNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get_mut(*first)?;
        for segment in rest {
            node = match node {
                StoreNode::Map(map) => map.get_mut(*segment)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Writes `node` at `path`, creating intermediate maps as needed.
    ///
    /// An intermediate segment that currently holds a non-map node is replaced.
    /// An empty path is a no-op.
    pub fn set(&mut self, path: &[&str], node: StoreNode) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        self.map_at_mut(parents).insert((*last).to_string(), node);
    }

    /// Removes and returns the node at `path`.
    pub fn remove(&mut self, path: &[&str]) -> Option<StoreNode> {
        let (last, parents) = path.split_last()?;
        if parents.is_empty() {
            return self.root.remove(*last);
        }
        match self.get_mut(parents)? {
            StoreNode::Map(map) => map.remove(*last),
            _ => None,
        }
    }

    /// Returns the map at `path`, creating it (and its parents) if missing.
    pub fn map_at_mut(&mut self, path: &[&str]) -> &mut BTreeMap<String, StoreNode> {
        let mut map = &mut self.root;
        for segment in path {
            let slot = map
                .entry((*segment).to_string())
                .or_insert_with(|| StoreNode::Map(BTreeMap::new()));
            if !matches!(slot, StoreNode::Map(_)) {
                *slot = StoreNode::Map(BTreeMap::new());
            }
            let StoreNode::Map(next) = slot else {
                unreachable!("slot was just made a map");
            };
            map = next;
        }
        map
    }

    /// Removes every top-level key starting with `prefix`.
    pub fn drain_prefixed(&mut self, prefix: &str) -> Vec<(String, StoreNode)> {
        let keys: Vec<String> = self
            .root
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.into_iter()
            .filter_map(|key| self.root.remove(&key).map(|node| (key, node)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}
