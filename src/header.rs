//! Sensor and channel header records.

use alloc::{string::String, vec::Vec};

use crate::{
    cursor::{ByteReader, ByteWriter},
    descriptor::ElementDescriptor,
    error::{Error, Result},
};

/// Fixed 32-byte record at the start of every sensor packet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorHeader {
    pub version: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub num_channels: u16,
    pub timestamp_ms: u64,
    pub frequency_hz: f64,
    pub encryption_flags: u32,
}

impl SensorHeader {
    pub const SIZE: usize = 32;

    pub const fn packed_size(&self) -> usize {
        Self::SIZE
    }

    /// Returns the header and the number of bytes it took (always 32).
    pub fn parse(buf: &[u8]) -> Result<(Self, usize)> {
        if buf.len() < Self::SIZE {
            return Err(Error::truncated(Self::SIZE, buf.len()));
        }
        let mut r = ByteReader::new(buf);
        let version = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let header = Self {
            version,
            vendor_id: r.read_u16()?,
            product_id: r.read_u16()?,
            num_channels: r.read_u16()?,
            timestamp_ms: r.read_u64()?,
            frequency_hz: r.read_f64()?,
            encryption_flags: r.read_u32()?,
        };
        debug_assert_eq!(r.offset(), Self::SIZE);
        Ok((header, Self::SIZE))
    }

    /// Writes the record at the start of `buf`, returning how far the caller's
    /// cursor moves.
    pub fn write(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(Error::truncated(Self::SIZE, buf.len()));
        }
        let mut w = ByteWriter::new(buf);
        self.put(&mut w);
        Ok(w.offset())
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        self.put(&mut ByteWriter::new(&mut out));
        out
    }

    /// `w` must have at least `SIZE` bytes left.
    fn put(&self, w: &mut ByteWriter<'_>) {
        w.put_u8(self.version);
        w.put_u8(0);
        w.put_u16(self.vendor_id);
        w.put_u16(self.product_id);
        w.put_u16(self.num_channels);
        w.put_u64(self.timestamp_ms);
        w.put_f64(self.frequency_hz);
        w.put_u32(self.encryption_flags);
    }
}

/// Variable-size record preceding every channel body.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelHeader {
    num_tuples: u64,
    frequency_hz: f64,
    elements: Vec<ElementDescriptor>,
    name: String,
}

/// num_tuples + frequency + elements_per_tuple
const FIXED_PART: usize = 8 + 8 + 2;

impl ChannelHeader {
    /// Fails with [`Error::InvalidElementCount`] if there are more than
    /// `u16::MAX` elements, or [`Error::InvalidName`] if `name` contains a
    /// null character.
    pub fn new(
        num_tuples: u64,
        frequency_hz: f64,
        elements: Vec<ElementDescriptor>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if elements.len() > u16::MAX as usize {
            return Err(Error::InvalidElementCount {
                declared: elements.len(),
                available: u16::MAX as usize,
            });
        }
        if name.contains('\0') {
            return Err(Error::InvalidName);
        }
        Ok(Self {
            num_tuples,
            frequency_hz,
            elements,
            name,
        })
    }

    pub fn num_tuples(&self) -> u64 {
        self.num_tuples
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn elements(&self) -> &[ElementDescriptor] {
        &self.elements
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn name_units(&self) -> usize {
        self.name.encode_utf16().count()
    }

    pub fn packed_size(&self) -> usize {
        FIXED_PART + self.elements.len() + 2 * (self.name_units() + 1)
    }

    pub fn parse(buf: &[u8]) -> Result<(Self, usize)> {
        let mut r = ByteReader::new(buf);
        let num_tuples = r.read_u64()?;
        let frequency_hz = r.read_f64()?;
        let declared = r.read_u16()? as usize;

        if r.remaining() < declared {
            return Err(Error::InvalidElementCount {
                declared,
                available: r.remaining(),
            });
        }
        let elements = r
            .read_bytes(declared)?
            .iter()
            .map(|b| ElementDescriptor::decode(*b))
            .collect();

        let mut units = Vec::new();
        loop {
            match r.read_u16()? {
                0 => break,
                unit => units.push(unit),
            }
        }
        let name = String::from_utf16(&units).map_err(|_| Error::InvalidName)?;

        Ok((
            Self {
                num_tuples,
                frequency_hz,
                elements,
                name,
            },
            r.offset(),
        ))
    }

    pub fn write(&self, buf: &mut [u8]) -> Result<usize> {
        let size = self.packed_size();
        if buf.len() < size {
            return Err(Error::truncated(size, buf.len()));
        }
        self.put(&mut ByteWriter::new(buf));
        Ok(size)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = alloc::vec![0u8; self.packed_size()];
        self.put(&mut ByteWriter::new(&mut out));
        out
    }

    /// `w` must have at least `packed_size()` bytes left.
    fn put(&self, w: &mut ByteWriter<'_>) {
        let start = w.offset();
        w.put_u64(self.num_tuples);
        w.put_f64(self.frequency_hz);
        w.put_u16(self.elements.len() as u16);
        for d in &self.elements {
            w.put_u8(d.encode());
        }
        for unit in self.name.encode_utf16() {
            w.put_u16(unit);
        }
        w.put_u16(0);
        debug_assert_eq!(w.offset() - start, self.packed_size());
    }
}
