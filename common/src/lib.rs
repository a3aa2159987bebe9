//! Primitives shared by the kernel services and the drivers built on them.
//!
//! - [`sync`]: spinning locks and the exclusive-open lock
//! - [`errno`]: the error type every fallible kernel/driver call returns

#![no_std]

pub mod errno;
pub mod sync;

pub use errno::{Errno, KResult};
