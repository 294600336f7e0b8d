use log::info;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Known peer addresses.
///
/// Addresses are stored exactly as given and deduplicated by string
/// equality; the set only grows. Reachability is not checked here.
pub struct NodeRegistry {
    inner: RwLock<HashSet<String>>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> NodeRegistry {
        NodeRegistry {
            inner: RwLock::new(HashSet::new()),
        }
    }

    /// Register `addr`; returns false when it was already known
    pub fn add_node(&self, addr: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let added = inner.insert(addr.to_string());
        if added {
            info!("Adding `{addr}` to registered nodes list.");
        }
        added
    }

    /// Snapshot of the registered addresses, sorted
    pub fn get_nodes(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut nodes: Vec<String> = inner.iter().cloned().collect();
        nodes.sort();
        nodes
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_is_known(&self, addr: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(addr)
    }
}
