//! Raw (wire) and promoted (in-memory) tuple layouts of a channel, and the
//! conversion between the two.

use alloc::vec::Vec;

use crate::{
    descriptor::{ElementDescriptor, ElementMetaData},
    error::{Error, Result},
};

/// Tuple layout derived from a channel header's element descriptors.
///
/// Wire elements are byte-aligned and packed back to back; promoted elements
/// sit at `offset_in_tuple` with their high-order bytes zero-filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayout {
    elements: Vec<ElementMetaData>,
    raw_offsets: Vec<u32>,
    tuple_size: u32,
    raw_tuple_bytes: u32,
    raw_tuple_bits: u32,
}

impl ChannelLayout {
    pub fn new(descriptors: &[ElementDescriptor]) -> Self {
        let mut elements = Vec::with_capacity(descriptors.len());
        let mut raw_offsets = Vec::with_capacity(descriptors.len());
        let mut tuple_size = 0u32;
        let mut raw_tuple_bytes = 0u32;
        let mut raw_tuple_bits = 0u32;

        for d in descriptors {
            let meta = ElementMetaData::new(d, tuple_size);
            raw_offsets.push(raw_tuple_bytes);
            tuple_size += meta.promoted_size_bytes;
            raw_tuple_bytes += meta.packed_bytes;
            raw_tuple_bits += d.size_in_bits();
            elements.push(meta);
        }

        Self {
            elements,
            raw_offsets,
            tuple_size,
            raw_tuple_bytes,
            raw_tuple_bits,
        }
    }

    pub fn elements(&self) -> &[ElementMetaData] {
        &self.elements
    }

    /// Promoted bytes per tuple.
    pub fn tuple_size(&self) -> u32 {
        self.tuple_size
    }

    /// Wire bytes per tuple.
    pub fn raw_tuple_bytes(&self) -> u32 {
        self.raw_tuple_bytes
    }

    /// Sum of the declared element widths, before byte alignment.
    pub fn raw_tuple_bits(&self) -> u32 {
        self.raw_tuple_bits
    }

    /// Length of the channel body on the wire.
    pub fn data_bytes(&self, num_tuples: u64) -> Result<usize> {
        checked_len(self.raw_tuple_bytes, num_tuples)
    }

    /// Length of the promoted buffer.
    pub fn promoted_bytes(&self, num_tuples: u64) -> Result<usize> {
        checked_len(self.tuple_size, num_tuples)
    }

    /// Widens a wire body into the promoted layout.
    ///
    /// `raw` must hold at least [`data_bytes`](Self::data_bytes); extra bytes
    /// are ignored.
    pub fn unpack(&self, raw: &[u8], num_tuples: u64) -> Result<Vec<u8>> {
        let expected = self.data_bytes(num_tuples)?;
        if raw.len() < expected {
            return Err(Error::ElementCountMismatch {
                expected,
                available: raw.len(),
            });
        }
        let mut out = alloc::vec![0u8; self.promoted_bytes(num_tuples)?];
        if self.tuple_size == 0 {
            return Ok(out);
        }

        let raw_tuples = raw[..expected].chunks_exact(self.raw_tuple_bytes as usize);
        let promoted_tuples = out.chunks_exact_mut(self.tuple_size as usize);
        for (src, dst) in raw_tuples.zip(promoted_tuples) {
            for (meta, raw_off) in self.elements.iter().zip(&self.raw_offsets) {
                let from = *raw_off as usize;
                let to = (meta.offset_in_tuple + meta.pad_bytes()) as usize;
                let n = meta.packed_bytes as usize;
                dst[to..to + n].copy_from_slice(&src[from..from + n]);
            }
        }
        Ok(out)
    }

    /// Narrows a promoted buffer back to the wire layout by dropping the
    /// zero-filled high-order bytes.
    pub fn pack(&self, promoted: &[u8], num_tuples: u64) -> Result<Vec<u8>> {
        let expected = self.promoted_bytes(num_tuples)?;
        if promoted.len() < expected {
            return Err(Error::ElementCountMismatch {
                expected,
                available: promoted.len(),
            });
        }
        let mut out = alloc::vec![0u8; self.data_bytes(num_tuples)?];
        if self.tuple_size == 0 {
            return Ok(out);
        }

        let promoted_tuples = promoted[..expected].chunks_exact(self.tuple_size as usize);
        let raw_tuples = out.chunks_exact_mut(self.raw_tuple_bytes as usize);
        for (src, dst) in promoted_tuples.zip(raw_tuples) {
            for (meta, raw_off) in self.elements.iter().zip(&self.raw_offsets) {
                let from = (meta.offset_in_tuple + meta.pad_bytes()) as usize;
                let to = *raw_off as usize;
                let n = meta.packed_bytes as usize;
                dst[to..to + n].copy_from_slice(&src[from..from + n]);
            }
        }
        Ok(out)
    }
}

fn checked_len(per_tuple: u32, num_tuples: u64) -> Result<usize> {
    (per_tuple as u64)
        .checked_mul(num_tuples)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(Error::SizeOverflow)
}
