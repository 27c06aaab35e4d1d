//! Driver-side assembly of sensor packets.

use alloc::{boxed::Box, vec::Vec};

use crate::{
    crypt::Crypt,
    error::{Error, Result},
    header::{ChannelHeader, SensorHeader},
    layout::ChannelLayout,
    PROTOCOL_VERSION,
};

/// Source of one channel's wire body.
///
/// The bytes must already follow the channel's element descriptors:
/// byte-aligned elements, big-endian, tuples back to back.
pub trait DataPacker {
    /// Fills `buf`, which is exactly the channel body long, and returns the
    /// number of bytes written.
    fn write_into(&self, buf: &mut [u8]) -> usize;
}

impl DataPacker for [u8] {
    fn write_into(&self, buf: &mut [u8]) -> usize {
        let n = self.len().min(buf.len());
        buf[..n].copy_from_slice(&self[..n]);
        self.len()
    }
}

impl<T: DataPacker + ?Sized> DataPacker for &T {
    fn write_into(&self, buf: &mut [u8]) -> usize {
        (**self).write_into(buf)
    }
}

impl DataPacker for Vec<u8> {
    fn write_into(&self, buf: &mut [u8]) -> usize {
        self.as_slice().write_into(buf)
    }
}

/// A channel header paired with the source of its body.
pub struct ChannelSource<'a> {
    pub header: ChannelHeader,
    pub packer: Box<dyn DataPacker + 'a>,
}

impl<'a> ChannelSource<'a> {
    pub fn new(header: ChannelHeader, packer: impl DataPacker + 'a) -> Self {
        Self {
            header,
            packer: Box::new(packer),
        }
    }

    pub fn data_bytes(&self) -> Result<usize> {
        ChannelLayout::new(self.header.elements()).data_bytes(self.header.num_tuples())
    }

    /// Header plus body.
    pub fn packed_size(&self) -> Result<usize> {
        self.header
            .packed_size()
            .checked_add(self.data_bytes()?)
            .ok_or(Error::SizeOverflow)
    }
}

pub struct SensorPacketBuilder {
    header: SensorHeader,
}

impl SensorPacketBuilder {
    pub fn set_version(mut self, version: u8) -> Self {
        self.header.version = version;
        self
    }

    pub fn set_ids(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.header.vendor_id = vendor_id;
        self.header.product_id = product_id;
        self
    }

    pub fn set_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.header.timestamp_ms = timestamp_ms;
        self
    }

    /// Highest update frequency among the channels.
    pub fn set_frequency(mut self, frequency_hz: f64) -> Self {
        self.header.frequency_hz = frequency_hz;
        self
    }

    pub fn set_encryption_flags(mut self, flags: u32) -> Self {
        self.header.encryption_flags = flags;
        self
    }

    pub fn build(self) -> SensorPacketPacker {
        SensorPacketPacker {
            header: self.header,
        }
    }
}

impl Default for SensorPacketBuilder {
    fn default() -> Self {
        Self {
            header: SensorHeader {
                version: PROTOCOL_VERSION,
                ..SensorHeader::default()
            },
        }
    }
}

pub struct SensorPacketPacker {
    header: SensorHeader,
}

impl SensorPacketPacker {
    pub fn builder() -> SensorPacketBuilder {
        SensorPacketBuilder::default()
    }

    /// Header as it will be written for `num_channels` channels.
    pub fn header(&self, num_channels: u16) -> SensorHeader {
        SensorHeader {
            num_channels,
            ..self.header
        }
    }

    /// Lays out the sensor header, then every channel header followed by the
    /// body its packer writes.
    ///
    /// # Panics
    /// If there are more than `u16::MAX` channels, or a packer reports a byte
    /// count other than its channel's body length.
    pub fn pack(&self, channels: &[ChannelSource<'_>]) -> Result<Vec<u8>> {
        assert!(
            channels.len() <= u16::MAX as usize,
            "{} channels do not fit a sensor header",
            channels.len()
        );
        let header = self.header(channels.len() as u16);

        let total = channels.iter().try_fold(header.packed_size(), |acc, ch| {
            acc.checked_add(ch.packed_size()?).ok_or(Error::SizeOverflow)
        })?;
        let mut buf = alloc::vec![0u8; total];

        let mut off = header.write(&mut buf)?;
        for ch in channels {
            off += ch.header.write(&mut buf[off..])?;
            let n = ch.data_bytes()?;
            let written = ch.packer.write_into(&mut buf[off..off + n]);
            assert_eq!(
                written,
                n,
                "packer for channel {:?} wrote {} bytes, descriptors require {}",
                ch.header.name(),
                written,
                n
            );
            tracing::trace!(
                channel = ch.header.name(),
                tuples = ch.header.num_tuples(),
                bytes = n,
                "packed channel"
            );
            off += n;
        }
        debug_assert_eq!(off, total);

        tracing::debug!(
            channels = channels.len(),
            bytes = total,
            encryption_flags = header.encryption_flags,
            "packed sensor packet"
        );
        Ok(buf)
    }

    /// [`pack`](Self::pack), then encrypts the post-header region when the
    /// encryption flags are set.
    pub fn pack_encrypted(&self, channels: &[ChannelSource<'_>], crypt: &dyn Crypt) -> Result<Vec<u8>> {
        let packet = self.pack(channels)?;
        Ok(encrypt_payload(packet, self.header.encryption_flags, crypt))
    }
}

/// Runs everything after the sensor header through `crypt`; a no-op when
/// `flags` is zero.
pub(crate) fn encrypt_payload(mut packet: Vec<u8>, flags: u32, crypt: &dyn Crypt) -> Vec<u8> {
    if flags == 0 || packet.len() < SensorHeader::SIZE {
        return packet;
    }
    let payload = packet.split_off(SensorHeader::SIZE);
    packet.extend_from_slice(&crypt.encrypt(flags, payload));
    packet
}
