//! `/sys` tree.
//!
//! Directories, fixed text files (such as a device's `dev` file) and
//! attribute files whose contents come from a driver's
//! [`AttributeOps`]. Paths are absolute and `/`-separated.

use crate::device::{AttributeOps, DeviceAttribute};
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use common::{Errno, KResult};
use spin::RwLock;

enum Node {
    Dir,
    Text(String),
    Attr {
        attr: DeviceAttribute,
        ops: Arc<dyn AttributeOps>,
    },
}

pub struct SysFs {
    nodes: RwLock<BTreeMap<String, Node>>,
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

impl SysFs {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/sys".to_string(), Node::Dir);
        nodes.insert("/sys/class".to_string(), Node::Dir);
        nodes.insert("/sys/devices".to_string(), Node::Dir);
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    fn insert(&self, path: &str, node: Node) -> KResult {
        let mut nodes = self.nodes.write();
        if nodes.contains_key(path) {
            return Err(Errno::Exist);
        }
        if !matches!(nodes.get(parent(path)), Some(Node::Dir)) {
            return Err(Errno::NoEnt);
        }
        nodes.insert(path.to_string(), node);
        Ok(())
    }

    pub(crate) fn mkdir(&self, path: &str) -> KResult {
        self.insert(path, Node::Dir)
    }

    pub(crate) fn add_text(&self, path: &str, text: String) -> KResult {
        self.insert(path, Node::Text(text))
    }

    pub(crate) fn add_attr(
        &self,
        path: &str,
        attr: DeviceAttribute,
        ops: Arc<dyn AttributeOps>,
    ) -> KResult {
        self.insert(path, Node::Attr { attr, ops })
    }

    /// Remove a single entry.
    pub(crate) fn remove(&self, path: &str) {
        self.nodes.write().remove(path);
    }

    /// Remove a directory and everything below it.
    pub(crate) fn remove_tree(&self, path: &str) {
        let prefix = alloc::format!("{}/", path);
        let mut nodes = self.nodes.write();
        nodes.retain(|p, _| p != path && !p.starts_with(&prefix));
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.read().contains_key(path)
    }

    /// Names of the direct children of `dir`.
    pub fn list(&self, dir: &str) -> KResult<Vec<String>> {
        let nodes = self.nodes.read();
        match nodes.get(dir) {
            Some(Node::Dir) => {}
            Some(_) => return Err(Errno::Inval),
            None => return Err(Errno::NoEnt),
        }
        let prefix = alloc::format!("{}/", dir);
        Ok(nodes
            .keys()
            .filter_map(|p| p.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(ToString::to_string)
            .collect())
    }

    /// Read a text or attribute file.
    pub fn read(&self, path: &str) -> KResult<String> {
        let (attr, ops) = {
            let nodes = self.nodes.read();
            match nodes.get(path).ok_or(Errno::NoEnt)? {
                Node::Dir => return Err(Errno::Inval),
                Node::Text(text) => return Ok(text.clone()),
                Node::Attr { attr, ops } => (*attr, ops.clone()),
            }
        };
        if !attr.is_readable() {
            return Err(Errno::Access);
        }
        ops.show(&attr)
    }

    /// Write to an attribute file. Returns the number of bytes consumed.
    pub fn write(&self, path: &str, buf: &str) -> KResult<usize> {
        let (attr, ops) = {
            let nodes = self.nodes.read();
            match nodes.get(path).ok_or(Errno::NoEnt)? {
                Node::Dir => return Err(Errno::Inval),
                Node::Text(_) => return Err(Errno::Access),
                Node::Attr { attr, ops } => (*attr, ops.clone()),
            }
        };
        if !attr.is_writable() {
            return Err(Errno::Access);
        }
        ops.store(&attr, buf)
    }
}

impl Default for SysFs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::AttrMode;
    use common::sync::SpinLock;

    struct Cell(SpinLock<String>);

    impl AttributeOps for Cell {
        fn show(&self, _attr: &DeviceAttribute) -> KResult<String> {
            Ok(self.0.lock().clone())
        }

        fn store(&self, _attr: &DeviceAttribute, buf: &str) -> KResult<usize> {
            *self.0.lock() = buf.to_string();
            Ok(buf.len())
        }
    }

    #[test]
    fn entries_need_an_existing_parent_directory() {
        let sysfs = SysFs::new();
        assert_eq!(sysfs.mkdir("/sys/class/x/y"), Err(Errno::NoEnt));
        sysfs.mkdir("/sys/class/x").unwrap();
        sysfs.mkdir("/sys/class/x/y").unwrap();
        assert_eq!(sysfs.mkdir("/sys/class/x"), Err(Errno::Exist));
        assert_eq!(sysfs.list("/sys/class").unwrap(), ["x"]);
    }

    #[test]
    fn attribute_modes_are_enforced() {
        let sysfs = SysFs::new();
        sysfs.mkdir("/sys/class/c").unwrap();
        let ops = Arc::new(Cell(SpinLock::new("7\n".to_string())));
        sysfs
            .add_attr("/sys/class/c/ro", DeviceAttribute::new("ro", AttrMode::RO), ops.clone())
            .unwrap();
        sysfs
            .add_attr("/sys/class/c/wo", DeviceAttribute::new("wo", AttrMode::WO), ops.clone())
            .unwrap();

        assert_eq!(sysfs.read("/sys/class/c/ro").unwrap(), "7\n");
        assert_eq!(sysfs.write("/sys/class/c/ro", "1"), Err(Errno::Access));
        assert_eq!(sysfs.read("/sys/class/c/wo"), Err(Errno::Access));
        assert_eq!(sysfs.write("/sys/class/c/wo", "12"), Ok(2));
        assert_eq!(sysfs.read("/sys/class/c/ro").unwrap(), "12");
        assert_eq!(sysfs.read("/sys/class/c/missing"), Err(Errno::NoEnt));
    }

    #[test]
    fn remove_tree_drops_children_only_under_the_prefix() {
        let sysfs = SysFs::new();
        sysfs.mkdir("/sys/class/a").unwrap();
        sysfs.mkdir("/sys/class/ab").unwrap();
        sysfs.add_text("/sys/class/a/dev", "1:2\n".to_string()).unwrap();
        sysfs.remove_tree("/sys/class/a");
        assert!(!sysfs.exists("/sys/class/a/dev"));
        assert!(!sysfs.exists("/sys/class/a"));
        assert!(sysfs.exists("/sys/class/ab"));
    }
}
