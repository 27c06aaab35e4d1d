//! Consumer-side parsing of sensor packets.
//!
//! A packet is walked front to back: sensor header, optional decryption of
//! everything after it, then one channel header and body at a time. Channel
//! boundaries depend on parsed content, so locating channel `i + 1` requires
//! parsing channel `i`'s header first.

use alloc::{borrow::Cow, sync::Arc, vec::Vec};

use crate::{
    channel::Channel,
    crypt::Crypt,
    error::{Error, Result},
    header::{ChannelHeader, SensorHeader},
    layout::ChannelLayout,
    snapshot::SensorSnapshot,
};

/// One channel located inside a packet payload, not yet promoted.
struct ChannelSpan<'a> {
    header: ChannelHeader,
    layout: Arc<ChannelLayout>,
    body: &'a [u8],
}

impl<'a> ChannelSpan<'a> {
    fn unpack(self) -> Result<Channel> {
        Channel::unpack_with_layout(self.header, self.layout, self.body)
    }
}

/// Yields the channels of a decrypted payload in wire order and stops at the
/// first error.
struct ChannelSpans<'a> {
    payload: &'a [u8],
    off: usize,
    left: u16,
}

impl<'a> ChannelSpans<'a> {
    fn new(payload: &'a [u8], num_channels: u16) -> Self {
        Self {
            payload,
            off: 0,
            left: num_channels,
        }
    }

    fn next_span(&mut self) -> Result<ChannelSpan<'a>> {
        let rest = &self.payload[self.off..];
        let (header, header_len) = ChannelHeader::parse(rest)?;
        let layout = Arc::new(ChannelLayout::new(header.elements()));
        let data_bytes = layout.data_bytes(header.num_tuples())?;

        let body = &rest[header_len..];
        if body.len() < data_bytes {
            return Err(Error::ElementCountMismatch {
                expected: data_bytes,
                available: body.len(),
            });
        }

        tracing::trace!(
            channel = header.name(),
            offset = self.off,
            tuples = header.num_tuples(),
            bytes = data_bytes,
            "located channel"
        );
        self.off += header_len + data_bytes;
        Ok(ChannelSpan {
            header,
            layout,
            body: &body[..data_bytes],
        })
    }
}

impl<'a> Iterator for ChannelSpans<'a> {
    type Item = Result<ChannelSpan<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.left == 0 {
            return None;
        }
        self.left -= 1;
        let span = self.next_span();
        if span.is_err() {
            self.left = 0;
        }
        Some(span)
    }
}

/// Splits off the sensor header and returns the payload the channels live in.
fn open_packet<'a>(
    packet: &'a [u8],
    decryptor: Option<&dyn Crypt>,
) -> Result<(SensorHeader, Cow<'a, [u8]>)> {
    let (header, used) = SensorHeader::parse(packet)?;
    let payload = &packet[used..];
    let flags = header.encryption_flags;

    let payload = match decryptor {
        Some(d) if flags != 0 => Cow::Owned(d.decrypt(flags, payload.to_vec())),
        None if flags != 0 => {
            tracing::warn!(
                encryption_flags = flags,
                "packet is encrypted but no decryptor is configured"
            );
            Cow::Borrowed(payload)
        }
        _ => Cow::Borrowed(payload),
    };
    Ok((header, payload))
}

fn insert(snapshot: &mut SensorSnapshot, channel: Channel) {
    if let Some(old) = snapshot.add_channel(channel) {
        tracing::warn!(channel = old.name(), "duplicate channel name, keeping the later one");
    }
}

/// Parses one complete sensor packet.
///
/// When the header carries encryption flags and `decryptor` is set, the
/// post-header region is decrypted before any channel is read. Any failure
/// discards the whole packet.
pub fn parse_packet(packet: &[u8], decryptor: Option<&dyn Crypt>) -> Result<SensorSnapshot> {
    let (header, payload) = open_packet(packet, decryptor)?;
    let mut snapshot = SensorSnapshot::new(header);

    for span in ChannelSpans::new(&payload, header.num_channels) {
        insert(&mut snapshot, span?.unpack()?);
    }

    tracing::debug!(
        channels = header.num_channels,
        bytes = packet.len(),
        encryption_flags = header.encryption_flags,
        "parsed sensor packet"
    );
    Ok(snapshot)
}

/// Same result as [`parse_packet`], but channel bodies are promoted on the
/// rayon pool once a sequential pass has located all of them.
#[cfg(feature = "unpacker")]
pub fn parse_packet_parallel(
    packet: &[u8],
    decryptor: Option<&dyn Crypt>,
) -> Result<SensorSnapshot> {
    use rayon::prelude::*;

    let (header, payload) = open_packet(packet, decryptor)?;
    let spans = ChannelSpans::new(&payload, header.num_channels).collect::<Result<Vec<_>>>()?;
    let channels = spans
        .into_par_iter()
        .map(ChannelSpan::unpack)
        .collect::<Result<Vec<_>>>()?;

    let mut snapshot = SensorSnapshot::new(header);
    for channel in channels {
        insert(&mut snapshot, channel);
    }

    tracing::debug!(
        channels = header.num_channels,
        bytes = packet.len(),
        encryption_flags = header.encryption_flags,
        "parsed sensor packet in parallel"
    );
    Ok(snapshot)
}

/// Total length of the cleartext packet at the start of `buf`, found by
/// walking its channel headers without promoting any body.
pub fn packet_len(buf: &[u8]) -> Result<usize> {
    let (header, used) = SensorHeader::parse(buf)?;
    let mut spans = ChannelSpans::new(&buf[used..], header.num_channels);
    for span in &mut spans {
        span?;
    }
    Ok(used + spans.off)
}

/// Parses a stream of back-to-back cleartext packets, such as a recording
/// file. Fails on the first malformed packet.
pub fn unpack_stream(data: &[u8]) -> Result<Vec<SensorSnapshot>> {
    let mut snapshots = Vec::new();
    let mut off = 0;
    while off < data.len() {
        let len = packet_len(&data[off..])?;
        snapshots.push(parse_packet(&data[off..off + len], None)?);
        off += len;
    }
    Ok(snapshots)
}
