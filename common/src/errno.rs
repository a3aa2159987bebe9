//! Kernel error numbers.
//!
//! Every fallible kernel service and driver entry point returns
//! [`KResult`]. The variants carry the Linux errno values so a caller
//! speaking the C ABI can get the familiar negative return code back with
//! [`Errno::to_raw`].

use core::fmt;

/// Result alias used throughout the kernel and the drivers.
pub type KResult<T = ()> = Result<T, Errno>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Errno {
    /// No such file or directory (`ENOENT`)
    NoEnt,
    /// Out of memory, or a mapping could not be established (`ENOMEM`)
    NoMem,
    /// Permission denied (`EACCES`)
    Access,
    /// Bad user-space address (`EFAULT`)
    Fault,
    /// Resource already claimed, or device already open (`EBUSY`)
    Busy,
    /// Name already in use (`EEXIST`)
    Exist,
    /// No such device, or no resource for it (`ENODEV`)
    NoDev,
    /// Invalid argument (`EINVAL`)
    Inval,
    /// Operation not supported (`EOPNOTSUPP`)
    NotSupported,
}

impl Errno {
    /// Positive errno value.
    pub const fn code(self) -> i32 {
        match self {
            Errno::NoEnt => 2,
            Errno::NoMem => 12,
            Errno::Access => 13,
            Errno::Fault => 14,
            Errno::Busy => 16,
            Errno::Exist => 17,
            Errno::NoDev => 19,
            Errno::Inval => 22,
            Errno::NotSupported => 95,
        }
    }

    /// Kernel-style negative return code, e.g. `-19` for [`Errno::NoDev`].
    pub const fn to_raw(self) -> i32 {
        -self.code()
    }

    /// Accepts either sign.
    pub fn from_raw(raw: i32) -> Option<Self> {
        let errno = match raw.unsigned_abs() {
            2 => Errno::NoEnt,
            12 => Errno::NoMem,
            13 => Errno::Access,
            14 => Errno::Fault,
            16 => Errno::Busy,
            17 => Errno::Exist,
            19 => Errno::NoDev,
            22 => Errno::Inval,
            95 => Errno::NotSupported,
            _ => return None,
        };
        Some(errno)
    }

    /// Symbolic name, as in `<errno.h>`.
    pub const fn name(self) -> &'static str {
        match self {
            Errno::NoEnt => "ENOENT",
            Errno::NoMem => "ENOMEM",
            Errno::Access => "EACCES",
            Errno::Fault => "EFAULT",
            Errno::Busy => "EBUSY",
            Errno::Exist => "EEXIST",
            Errno::NoDev => "ENODEV",
            Errno::Inval => "EINVAL",
            Errno::NotSupported => "EOPNOTSUPP",
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Errno::NoEnt => "no such file or directory",
            Errno::NoMem => "out of memory",
            Errno::Access => "permission denied",
            Errno::Fault => "bad address",
            Errno::Busy => "device or resource busy",
            Errno::Exist => "file exists",
            Errno::NoDev => "no such device",
            Errno::Inval => "invalid argument",
            Errno::NotSupported => "operation not supported",
        };
        write!(f, "{} ({})", text, self.name())
    }
}
