use crate::chrdev::DevT;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use common::{Errno, KResult};
use spin::RwLock;

/// `/dev` node table: node name to device number.
///
/// Lookups happen on every open, updates only on device create/destroy.
pub struct DevFs {
    nodes: RwLock<BTreeMap<String, DevT>>,
}

impl DevFs {
    pub const fn new() -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
        }
    }

    pub(crate) fn add(&self, name: &str, dev: DevT) -> KResult {
        let mut nodes = self.nodes.write();
        if nodes.contains_key(name) {
            return Err(Errno::Exist);
        }
        nodes.insert(name.to_string(), dev);
        Ok(())
    }

    pub(crate) fn remove(&self, name: &str) {
        self.nodes.write().remove(name);
    }

    /// Device number behind `/dev/<name>`.
    pub fn lookup(&self, name: &str) -> Option<DevT> {
        self.nodes.read().get(name).copied()
    }

    /// Node names, sorted.
    pub fn ls(&self) -> Vec<String> {
        self.nodes.read().keys().cloned().collect()
    }
}

impl Default for DevFs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_rejected() {
        let devfs = DevFs::new();
        devfs.add("test_counter0", DevT::new(254, 0)).unwrap();
        assert_eq!(devfs.add("test_counter0", DevT::new(254, 1)), Err(Errno::Exist));
        assert_eq!(devfs.lookup("test_counter0"), Some(DevT::new(254, 0)));

        devfs.remove("test_counter0");
        assert!(devfs.lookup("test_counter0").is_none());
        assert!(devfs.ls().is_empty());
    }
}
