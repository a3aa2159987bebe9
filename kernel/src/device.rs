//! Device classes, device nodes and their attribute files.
//!
//! ```text
//! Class::create             -> /sys/class/<class>
//! DeviceNode::create        -> /dev/<name>, /sys/class/<class>/<name>/dev
//! DeviceNode::create_file   -> /sys/class/<class>/<name>/<attr>
//! ```
//!
//! Each call returns a guard that undoes exactly what it created.

use crate::Kernel;
use crate::chrdev::DevT;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use bitflags::bitflags;
use common::KResult;

bitflags! {
    /// Permission bits of an attribute file.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AttrMode: u16 {
        const OWNER_READ = 0o400;
        const OWNER_WRITE = 0o200;
        const GROUP_READ = 0o040;
        const OTHER_READ = 0o004;
    }
}

impl AttrMode {
    pub const RO: Self = Self::OWNER_READ.union(Self::GROUP_READ).union(Self::OTHER_READ);
    pub const WO: Self = Self::OWNER_WRITE;
    pub const RW: Self = Self::RO.union(Self::OWNER_WRITE);
}

/// Name and mode of an attribute file (`DEVICE_ATTR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceAttribute {
    pub name: &'static str,
    pub mode: AttrMode,
}

impl DeviceAttribute {
    pub const fn new(name: &'static str, mode: AttrMode) -> Self {
        Self { name, mode }
    }

    pub fn is_readable(&self) -> bool {
        self.mode.intersects(AttrMode::RO)
    }

    pub fn is_writable(&self) -> bool {
        self.mode.contains(AttrMode::OWNER_WRITE)
    }
}

/// Text callbacks behind attribute files.
pub trait AttributeOps: Send + Sync {
    /// Produce the file contents.
    fn show(&self, attr: &DeviceAttribute) -> KResult<String>;

    /// Consume written text, returning the number of bytes used.
    fn store(&self, attr: &DeviceAttribute, buf: &str) -> KResult<usize>;
}

/// Device class (`class_create`). Dropping it runs `class_destroy`.
pub struct Class {
    kernel: Arc<Kernel>,
    name: String,
}

impl Class {
    pub fn create(kernel: &Arc<Kernel>, name: &str) -> KResult<Self> {
        kernel.sysfs.mkdir(&format!("/sys/class/{}", name))?;
        Ok(Self {
            kernel: kernel.clone(),
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> String {
        format!("/sys/class/{}", self.name)
    }
}

impl Drop for Class {
    fn drop(&mut self) {
        self.kernel.sysfs.remove_tree(&self.path());
    }
}

/// Device node (`device_create`). Dropping it runs `device_destroy`.
pub struct DeviceNode {
    kernel: Arc<Kernel>,
    path: String,
    name: String,
    dev: DevT,
}

impl DeviceNode {
    pub fn create(kernel: &Arc<Kernel>, class: &Class, dev: DevT, name: &str) -> KResult<Self> {
        let path = format!("{}/{}", class.path(), name);
        kernel.devfs.add(name, dev)?;
        let node = Self {
            kernel: kernel.clone(),
            path,
            name: name.to_string(),
            dev,
        };
        node.kernel.sysfs.mkdir(&node.path)?;
        node.kernel
            .sysfs
            .add_text(&format!("{}/dev", node.path), format!("{}\n", dev))?;
        Ok(node)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dev(&self) -> DevT {
        self.dev
    }

    /// Sysfs directory of the device.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Add an attribute file under the device directory
    /// (`device_create_file`).
    pub fn create_file(
        &self,
        attr: DeviceAttribute,
        ops: Arc<dyn AttributeOps>,
    ) -> KResult<AttributeFile> {
        let path = format!("{}/{}", self.path, attr.name);
        self.kernel.sysfs.add_attr(&path, attr, ops)?;
        Ok(AttributeFile {
            kernel: self.kernel.clone(),
            path,
        })
    }
}

impl Drop for DeviceNode {
    fn drop(&mut self) {
        self.kernel.sysfs.remove_tree(&self.path);
        self.kernel.devfs.remove(&self.name);
    }
}

/// Attribute file. Dropping it runs `device_remove_file`.
pub struct AttributeFile {
    kernel: Arc<Kernel>,
    path: String,
}

impl AttributeFile {
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for AttributeFile {
    fn drop(&mut self) {
        self.kernel.sysfs.remove(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::DirectMapper;
    use common::Errno;

    struct Fixed;

    impl AttributeOps for Fixed {
        fn show(&self, attr: &DeviceAttribute) -> KResult<String> {
            Ok(format!("{}\n", attr.name))
        }

        fn store(&self, _attr: &DeviceAttribute, buf: &str) -> KResult<usize> {
            Ok(buf.len())
        }
    }

    #[test]
    fn mode_helpers() {
        assert!(DeviceAttribute::new("a", AttrMode::RO).is_readable());
        assert!(!DeviceAttribute::new("a", AttrMode::RO).is_writable());
        assert!(DeviceAttribute::new("a", AttrMode::WO).is_writable());
        assert!(!DeviceAttribute::new("a", AttrMode::WO).is_readable());
        assert_eq!(AttrMode::RW.bits(), 0o644);
    }

    #[test]
    fn node_creation_and_teardown() {
        let kernel = Kernel::new(Arc::new(DirectMapper));
        let class = Class::create(&kernel, "iob_class").unwrap();
        assert_eq!(Class::create(&kernel, "iob_class").err(), Some(Errno::Exist));

        let dev = DevT::new(254, 0);
        let node = DeviceNode::create(&kernel, &class, dev, "iob_timer").unwrap();
        assert_eq!(kernel.devfs().lookup("iob_timer"), Some(dev));
        assert_eq!(
            kernel.sysfs().read("/sys/class/iob_class/iob_timer/dev").unwrap(),
            "254:0\n"
        );

        let file = node
            .create_file(DeviceAttribute::new("version", AttrMode::RO), Arc::new(Fixed))
            .unwrap();
        assert_eq!(file.path(), "/sys/class/iob_class/iob_timer/version");
        assert_eq!(kernel.sysfs().read(file.path()).unwrap(), "version\n");

        drop(file);
        assert!(!kernel.sysfs().exists("/sys/class/iob_class/iob_timer/version"));
        drop(node);
        assert!(kernel.devfs().lookup("iob_timer").is_none());
        drop(class);
        assert!(!kernel.sysfs().exists("/sys/class/iob_class"));
    }

    #[test]
    fn duplicate_node_name_fails_without_leaving_state() {
        let kernel = Kernel::new(Arc::new(DirectMapper));
        let class = Class::create(&kernel, "c").unwrap();
        let _node = DeviceNode::create(&kernel, &class, DevT::new(254, 0), "n").unwrap();
        assert_eq!(
            DeviceNode::create(&kernel, &class, DevT::new(254, 1), "n").err(),
            Some(Errno::Exist)
        );
        assert_eq!(kernel.devfs().lookup("n"), Some(DevT::new(254, 0)));
    }
}
