//! Big-endian readers and writers over byte slices.
//!
//! Every read or write advances an explicit offset owned by the cursor value;
//! the underlying slice is never repositioned.

use core::convert::TryInto;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug)]
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.off
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.off
    }

    /// Takes `n` bytes, reporting a short buffer as [`Error::TruncatedHeader`].
    #[inline]
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::truncated(n, self.remaining()));
        }
        let s = &self.buf[self.off..self.off + n];
        self.off += n;
        Ok(s)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let b = self.read_bytes(N)?;
        // length checked by read_bytes
        Ok(b.try_into().unwrap_or([0; N]))
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_be_bytes)
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_be_bytes)
    }

    #[inline]
    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_array().map(f64::from_be_bytes)
    }
}

/// Writer over a pre-sized slice. Callers size the slice from `packed_size()`,
/// so running out of room is a bug and panics like slice indexing does.
pub(crate) struct ByteWriter<'a> {
    buf: &'a mut [u8],
    off: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, off: 0 }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.off
    }

    #[inline]
    pub fn put_bytes(&mut self, data: &[u8]) {
        self.buf[self.off..self.off + data.len()].copy_from_slice(data);
        self.off += data.len();
    }

    #[inline]
    pub fn put_u8(&mut self, v: u8) {
        self.put_bytes(&[v]);
    }

    #[inline]
    pub fn put_u16(&mut self, v: u16) {
        self.put_bytes(&v.to_be_bytes());
    }

    #[inline]
    pub fn put_u32(&mut self, v: u32) {
        self.put_bytes(&v.to_be_bytes());
    }

    #[inline]
    pub fn put_u64(&mut self, v: u64) {
        self.put_bytes(&v.to_be_bytes());
    }

    #[inline]
    pub fn put_f64(&mut self, v: f64) {
        self.put_bytes(&v.to_be_bytes());
    }
}
