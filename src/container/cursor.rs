//! Bounds-checked little-endian reads over a byte buffer.

use byteorder::{ByteOrder, LittleEndian};

use crate::util::{Error, Result};

/// Forward-only reader with an upper limit.
///
/// The limit is usually the end of the enclosing record, so a record can
/// never read into its sibling's bytes.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    limit: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor over the whole buffer, starting at `pos`.
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos, limit: buf.len() }
    }

    /// Current absolute position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Current read limit.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes left before the limit.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.pos)
    }

    /// Restrict reads to `[pos, limit)`. The limit may only shrink.
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.limit || limit < self.pos {
            return Err(Error::corrupt(format!(
                "limit {} outside window {}..{}",
                limit, self.pos, self.limit
            )));
        }
        self.limit = limit;
        Ok(())
    }

    /// Take `len` bytes and advance.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.limit)
            .ok_or_else(|| {
                Error::corrupt(format!(
                    "read of {} bytes at offset {} overruns limit {}",
                    len, self.pos, self.limit
                ))
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Look at the next `len` bytes without advancing.
    pub fn peek(&self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        (end <= self.limit).then(|| &self.buf[self.pos..end])
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    #[inline]
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_le() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F];
        let mut c = ByteCursor::new(&bytes, 0);
        assert_eq!(c.read_u32().unwrap(), 0x04030201);
        assert_eq!(c.read_f64().unwrap(), 1.0);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn test_overrun_is_corrupt() {
        let bytes = [0u8; 3];
        let mut c = ByteCursor::new(&bytes, 0);
        assert!(matches!(c.read_u32(), Err(Error::CorruptContainer(_))));
        // failed read does not advance
        assert_eq!(c.pos(), 0);
    }

    #[test]
    fn test_limit() {
        let bytes = [0u8; 16];
        let mut c = ByteCursor::new(&bytes, 4);
        c.set_limit(8).unwrap();
        assert!(c.take(4).is_ok());
        assert!(c.read_u8().is_err());
        assert!(c.set_limit(12).is_err());
        assert!(c.peek(1).is_none());
    }
}
