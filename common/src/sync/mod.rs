pub mod exclusive;
pub mod spinlock;
pub use exclusive::ExclusiveLock;
pub use spinlock::{SpinLock, SpinLockGuard};
