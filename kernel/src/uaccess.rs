//! Copies between kernel and caller-supplied buffers.
//!
//! The caller of `read`/`write` passes a buffer and a byte count, and the
//! two are not guaranteed to agree. A copy that would run past the real
//! buffer fails with [`Errno::Fault`], the way `copy_to_user` and
//! `copy_from_user` do for an unmapped user address.

use common::{Errno, KResult};

/// Destination of a `read` call.
pub struct UserSliceWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
    written: usize,
}

impl<'a> UserSliceWriter<'a> {
    /// `len` is the count the caller asked for.
    pub fn new(buf: &'a mut [u8], len: usize) -> Self {
        Self {
            buf,
            len,
            written: 0,
        }
    }

    /// Remaining requested bytes.
    pub fn len(&self) -> usize {
        self.len - self.written
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `data` out to the caller.
    ///
    /// Fails with `Fault` if the copy would overrun either the requested
    /// count or the actual buffer. Nothing is copied in that case.
    pub fn write_slice(&mut self, data: &[u8]) -> KResult {
        let end = self.written.checked_add(data.len()).ok_or(Errno::Fault)?;
        if end > self.len || end > self.buf.len() {
            return Err(Errno::Fault);
        }
        self.buf[self.written..end].copy_from_slice(data);
        self.written = end;
        Ok(())
    }
}

/// Source of a `write` call.
pub struct UserSliceReader<'a> {
    buf: &'a [u8],
    len: usize,
    consumed: usize,
}

impl<'a> UserSliceReader<'a> {
    /// `len` is the count the caller passed.
    pub fn new(buf: &'a [u8], len: usize) -> Self {
        Self {
            buf,
            len,
            consumed: 0,
        }
    }

    /// Remaining bytes the caller claims to provide.
    pub fn len(&self) -> usize {
        self.len - self.consumed
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `out` from the caller's buffer.
    pub fn read_slice(&mut self, out: &mut [u8]) -> KResult {
        let end = self.consumed.checked_add(out.len()).ok_or(Errno::Fault)?;
        if end > self.len || end > self.buf.len() {
            return Err(Errno::Fault);
        }
        out.copy_from_slice(&self.buf[self.consumed..end]);
        self.consumed = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_faults_when_count_exceeds_buffer() {
        let mut buf = [0u8; 2];
        let mut writer = UserSliceWriter::new(&mut buf, 4);
        assert_eq!(writer.len(), 4);
        assert_eq!(writer.write_slice(&[1, 2, 3, 4]), Err(Errno::Fault));
        assert_eq!(buf, [0, 0]);
    }

    #[test]
    fn writer_copies_within_bounds() {
        let mut buf = [0u8; 4];
        let mut writer = UserSliceWriter::new(&mut buf, 4);
        writer.write_slice(&[9, 8]).unwrap();
        assert_eq!(writer.len(), 2);
        writer.write_slice(&[7]).unwrap();
        assert_eq!(buf, [9, 8, 7, 0]);
    }

    #[test]
    fn reader_faults_on_short_buffer() {
        let data = [1u8];
        let mut reader = UserSliceReader::new(&data, 4);
        let mut out = [0u8; 4];
        assert_eq!(reader.read_slice(&mut out), Err(Errno::Fault));

        let mut one = [0u8; 1];
        reader.read_slice(&mut one).unwrap();
        assert_eq!(one, [1]);
        assert_eq!(reader.len(), 3);
    }
}
