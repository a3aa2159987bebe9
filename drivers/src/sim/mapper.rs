use alloc::sync::Arc;
use alloc::vec::Vec;
use common::sync::SpinLock;
use common::{Errno, KResult};
use kernel::io::{IoMapper, RegisterIo};

struct Block {
    base: usize,
    size: usize,
    io: Arc<dyn RegisterIo>,
}

/// [`IoMapper`] backed by simulated blocks placed at fixed addresses.
///
/// Mapping anything that is not exactly a placed block's base, or that is
/// larger than the block, fails with `NoMem`.
#[derive(Default)]
pub struct SimMapper {
    blocks: SpinLock<Vec<Block>>,
}

impl SimMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `io` at `base`, `size` bytes long.
    pub fn place(&self, base: usize, size: usize, io: Arc<dyn RegisterIo>) {
        self.blocks.lock().push(Block { base, size, io });
    }
}

impl IoMapper for SimMapper {
    fn ioremap(&self, start: usize, size: usize) -> KResult<Arc<dyn RegisterIo>> {
        self.blocks
            .lock()
            .iter()
            .find(|b| b.base == start && size <= b.size)
            .map(|b| b.io.clone())
            .ok_or(Errno::NoMem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimCounter;

    #[test]
    fn maps_only_placed_blocks() {
        let mapper = SimMapper::new();
        mapper.place(0x4000_0000, 0x18, Arc::new(SimCounter::new()));
        assert!(mapper.ioremap(0x4000_0000, 0x18).is_ok());
        assert_eq!(mapper.ioremap(0x4000_0000, 0x20).err(), Some(Errno::NoMem));
        assert_eq!(mapper.ioremap(0x5000_0000, 0x18).err(), Some(Errno::NoMem));
    }
}
