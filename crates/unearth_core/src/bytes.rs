//! Bounds-safe fixed-width reads over a byte window.
//!
//! Every helper here is total: a read that would cross the end of the
//! window yields zero, and slicing clamps instead of panicking. Validators
//! rely on this to walk untrusted, possibly truncated data with plain
//! forward reads and no per-access error handling.

/// Byte order for multi-byte reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Reads a `u16` at `offset`, or 0 if fewer than 2 bytes remain.
#[inline]
#[must_use]
pub fn peek_u16(buf: &[u8], offset: usize, endian: Endian) -> u16 {
    match buf.get(offset..offset + 2) {
        Some(b) => {
            let raw = [b[0], b[1]];
            match endian {
                Endian::Big => u16::from_be_bytes(raw),
                Endian::Little => u16::from_le_bytes(raw),
            }
        }
        None => 0,
    }
}

/// Reads a `u32` at `offset`, or 0 if fewer than 4 bytes remain.
#[inline]
#[must_use]
pub fn peek_u32(buf: &[u8], offset: usize, endian: Endian) -> u32 {
    match buf.get(offset..offset + 4) {
        Some(b) => {
            let raw = [b[0], b[1], b[2], b[3]];
            match endian {
                Endian::Big => u32::from_be_bytes(raw),
                Endian::Little => u32::from_le_bytes(raw),
            }
        }
        None => 0,
    }
}

/// Reads a `u64` at `offset`, or 0 if fewer than 8 bytes remain.
#[inline]
#[must_use]
pub fn peek_u64(buf: &[u8], offset: usize, endian: Endian) -> u64 {
    match buf.get(offset..offset + 8) {
        Some(b) => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(b);
            match endian {
                Endian::Big => u64::from_be_bytes(raw),
                Endian::Little => u64::from_le_bytes(raw),
            }
        }
        None => 0,
    }
}

/// Clamped slice of up to `count` bytes starting at `offset`.
///
/// Both the offset and the length are clamped to the buffer; the result
/// may be shorter than requested or empty, but never out of bounds.
#[inline]
#[must_use]
pub fn subrange(buf: &[u8], offset: usize, count: usize) -> &[u8] {
    let start = offset.min(buf.len());
    let end = offset.saturating_add(count).min(buf.len());
    &buf[start..end]
}

/// Clamped suffix starting at `offset`.
#[inline]
#[must_use]
pub fn tail(buf: &[u8], offset: usize) -> &[u8] {
    &buf[offset.min(buf.len())..]
}

/// A forward cursor over a window.
///
/// `read_*` advances past what it consumed; `skip` and `seek` clamp to the
/// window so the cursor can never move past the end.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[inline]
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn peek_u8(&self) -> u8 {
        self.buf.get(self.pos).copied().unwrap_or(0)
    }

    #[inline]
    #[must_use]
    pub fn peek_u16(&self, endian: Endian) -> u16 {
        peek_u16(self.buf, self.pos, endian)
    }

    #[inline]
    #[must_use]
    pub fn peek_u32(&self, endian: Endian) -> u32 {
        peek_u32(self.buf, self.pos, endian)
    }

    #[inline]
    pub fn read_u8(&mut self) -> u8 {
        let v = self.peek_u8();
        self.skip(1);
        v
    }

    #[inline]
    pub fn read_u16(&mut self, endian: Endian) -> u16 {
        let v = self.peek_u16(endian);
        self.skip(2);
        v
    }

    #[inline]
    pub fn read_u32(&mut self, endian: Endian) -> u32 {
        let v = self.peek_u32(endian);
        self.skip(4);
        v
    }

    /// Advances by up to `n` bytes, clamped to the end of the window.
    #[inline]
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.buf.len());
    }

    /// Moves the cursor to an absolute position, clamped to the window.
    #[inline]
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.buf.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_endianness() {
        let buf = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(peek_u16(&buf, 0, Endian::Big), 0x1234);
        assert_eq!(peek_u16(&buf, 0, Endian::Little), 0x3412);
        assert_eq!(peek_u32(&buf, 0, Endian::Big), 0x1234_5678);
        assert_eq!(peek_u32(&buf, 0, Endian::Little), 0x7856_3412);
    }

    #[test]
    fn peek_truncated_is_zero() {
        let buf = [0xFF];
        assert_eq!(peek_u16(&buf, 0, Endian::Big), 0);
        assert_eq!(peek_u32(&buf, 0, Endian::Big), 0);
        assert_eq!(peek_u64(&buf, 0, Endian::Little), 0);
        assert_eq!(peek_u16(&buf, 100, Endian::Big), 0);
    }

    #[test]
    fn subrange_clamps() {
        let buf = [1u8, 2, 3, 4];
        assert_eq!(subrange(&buf, 1, 2), &[2, 3]);
        assert_eq!(subrange(&buf, 2, 100), &[3, 4]);
        assert_eq!(subrange(&buf, 100, 2), &[] as &[u8]);
        assert_eq!(subrange(&buf, 0, usize::MAX), &buf);
        assert_eq!(tail(&buf, 3), &[4]);
        assert_eq!(tail(&buf, 9), &[] as &[u8]);
    }

    #[test]
    fn cursor_reads_and_clamps() {
        let buf = [0xAA, 0xBB, 0xCC];
        let mut cur = Cursor::new(&buf);
        assert_eq!(cur.read_u16(Endian::Big), 0xAABB);
        assert_eq!(cur.pos(), 2);
        // only one byte left: u16 read yields zero but still clamps forward
        assert_eq!(cur.read_u16(Endian::Big), 0);
        assert_eq!(cur.pos(), 3);
        assert!(cur.is_empty());
        assert_eq!(cur.read_u8(), 0);
        cur.seek(1);
        assert_eq!(cur.read_u8(), 0xBB);
        cur.skip(usize::MAX);
        assert_eq!(cur.pos(), 3);
    }
}
