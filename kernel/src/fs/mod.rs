//! In-kernel file systems seen by user space: `/dev` nodes, `/sys`
//! attribute files, and the open-file handles returned for device nodes.

pub mod devfs;
pub mod file;
pub mod sysfs;

pub use devfs::DevFs;
pub use file::{File, FileOperations, SeekWhence};
pub use sysfs::SysFs;
