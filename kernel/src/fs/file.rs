use crate::chrdev::DevT;
use crate::uaccess::{UserSliceReader, UserSliceWriter};
use alloc::sync::Arc;
use common::{Errno, KResult};
use core::any::Any;
use core::fmt;

/// File operations of a character device.
///
/// `pos` is the handle's position, copied in before the call and written
/// back to the handle only when the call succeeds.
pub trait FileOperations: Send + Sync {
    /// Called once when a handle is created. An error aborts the open and
    /// `release` is never called for that handle.
    fn open(&self, _file: &mut File) -> KResult {
        Ok(())
    }

    /// Called once when a successfully opened handle is closed.
    fn release(&self, _file: &mut File) {}

    fn read(
        &self,
        _file: &File,
        _buf: &mut UserSliceWriter<'_>,
        _pos: &mut i64,
    ) -> KResult<usize> {
        Err(Errno::Inval)
    }

    fn write(
        &self,
        _file: &File,
        _buf: &mut UserSliceReader<'_>,
        _pos: &mut i64,
    ) -> KResult<usize> {
        Err(Errno::Inval)
    }

    /// Reposition the handle. Implementations commit the new position with
    /// [`File::set_pos`].
    fn llseek(&self, _file: &mut File, _offset: i64, _whence: SeekWhence) -> KResult<i64> {
        Err(Errno::NotSupported)
    }
}

/// An open file handle.
///
/// Each handle has its own position, starting at 0. Dropping the handle
/// releases it; [`close`](File::close) does the same explicitly.
pub struct File {
    rdev: DevT,
    pos: i64,
    ops: Arc<dyn FileOperations>,
    private: Option<Arc<dyn Any + Send + Sync>>,
    opened: bool,
}

impl File {
    pub(crate) fn new(rdev: DevT, ops: Arc<dyn FileOperations>) -> Self {
        Self {
            rdev,
            pos: 0,
            ops,
            private: None,
            opened: false,
        }
    }

    pub(crate) fn mark_opened(&mut self) {
        self.opened = true;
    }

    /// Device number of the node this handle was opened through.
    pub fn rdev(&self) -> DevT {
        self.rdev
    }

    /// Current position.
    pub fn pos(&self) -> i64 {
        self.pos
    }

    pub fn set_pos(&mut self, pos: i64) {
        self.pos = pos;
    }

    /// Attach driver context to the handle.
    pub fn set_private_data(&mut self, data: Arc<dyn Any + Send + Sync>) {
        self.private = Some(data);
    }

    /// Driver context attached at open time, if it has type `T`.
    pub fn private_data<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.private.clone()?.downcast::<T>().ok()
    }

    /// Read up to `buf.len()` bytes at the current position.
    pub fn read(&mut self, buf: &mut [u8]) -> KResult<usize> {
        let count = buf.len();
        self.read_count(buf, count)
    }

    /// Read with an explicit byte count, which may disagree with the
    /// buffer's real size.
    pub fn read_count(&mut self, buf: &mut [u8], count: usize) -> KResult<usize> {
        let ops = self.ops.clone();
        let mut pos = self.pos;
        let mut writer = UserSliceWriter::new(buf, count);
        let n = ops.read(self, &mut writer, &mut pos)?;
        self.pos = pos;
        Ok(n)
    }

    /// Write `buf` at the current position.
    pub fn write(&mut self, buf: &[u8]) -> KResult<usize> {
        self.write_count(buf, buf.len())
    }

    /// Write with an explicit byte count.
    pub fn write_count(&mut self, buf: &[u8], count: usize) -> KResult<usize> {
        let ops = self.ops.clone();
        let mut pos = self.pos;
        let mut reader = UserSliceReader::new(buf, count);
        let n = ops.write(self, &mut reader, &mut pos)?;
        self.pos = pos;
        Ok(n)
    }

    pub fn llseek(&mut self, offset: i64, whence: SeekWhence) -> KResult<i64> {
        let ops = self.ops.clone();
        ops.llseek(self, offset, whence)
    }

    /// `lseek(2)` with a raw `whence` value.
    pub fn lseek(&mut self, offset: i64, whence: i32) -> KResult<i64> {
        let whence = SeekWhence::from_raw(whence)?;
        self.llseek(offset, whence)
    }

    /// Release the handle.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.opened {
            self.opened = false;
            let ops = self.ops.clone();
            ops.release(self);
        }
    }
}

impl Drop for File {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("rdev", &self.rdev)
            .field("pos", &self.pos)
            .field("opened", &self.opened)
            .finish()
    }
}

/// Seek whence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekWhence {
    /// Seek from start of file (`SEEK_SET`)
    Start,
    /// Seek from current position (`SEEK_CUR`)
    Current,
    /// Seek from end of file (`SEEK_END`)
    End,
}

pub const SEEK_SET: i32 = 0;
pub const SEEK_CUR: i32 = 1;
pub const SEEK_END: i32 = 2;

impl SeekWhence {
    pub fn from_raw(whence: i32) -> KResult<Self> {
        match whence {
            SEEK_SET => Ok(SeekWhence::Start),
            SEEK_CUR => Ok(SeekWhence::Current),
            SEEK_END => Ok(SeekWhence::End),
            _ => Err(Errno::Inval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        releases: AtomicUsize,
    }

    impl FileOperations for Echo {
        fn release(&self, _file: &mut File) {
            self.releases.fetch_add(1, Ordering::Relaxed);
        }

        fn read(
            &self,
            _file: &File,
            buf: &mut UserSliceWriter<'_>,
            pos: &mut i64,
        ) -> KResult<usize> {
            buf.write_slice(&[*pos as u8])?;
            *pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn position_is_written_back_only_on_success() {
        let ops = Arc::new(Echo {
            releases: AtomicUsize::new(0),
        });
        let mut file = File::new(DevT::new(240, 0), ops);
        file.mark_opened();

        let mut buf = [0u8; 1];
        assert_eq!(file.read(&mut buf), Ok(1));
        assert_eq!(file.pos(), 1);

        let mut empty = [0u8; 0];
        assert_eq!(file.read_count(&mut empty, 1), Err(Errno::Fault));
        assert_eq!(file.pos(), 1);
    }

    #[test]
    fn release_runs_once() {
        let ops = Arc::new(Echo {
            releases: AtomicUsize::new(0),
        });
        let mut file = File::new(DevT::new(240, 0), ops.clone());
        file.mark_opened();
        file.close();
        assert_eq!(ops.releases.load(Ordering::Relaxed), 1);

        // never opened: no release
        drop(File::new(DevT::new(240, 0), ops.clone()));
        assert_eq!(ops.releases.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn unknown_whence_is_invalid() {
        assert_eq!(SeekWhence::from_raw(7), Err(Errno::Inval));
        assert_eq!(SeekWhence::from_raw(SEEK_END), Ok(SeekWhence::End));
    }

    #[test]
    fn private_data_downcasts() {
        let ops = Arc::new(Echo {
            releases: AtomicUsize::new(0),
        });
        let mut file = File::new(DevT::new(240, 1), ops);
        file.set_private_data(Arc::new(42u32));
        assert_eq!(file.private_data::<u32>().as_deref(), Some(&42));
        assert!(file.private_data::<u64>().is_none());
    }
}
