//! The producer side: a sensor driver that turns its live state into packets.

use alloc::vec::Vec;

use crate::{
    crypt::{Crypt, NullCrypt},
    error::Result,
    header::SensorHeader,
    packer::{encrypt_payload, ChannelSource, SensorPacketPacker},
};

/// Sensor-level values a device stamps on every packet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Highest update frequency among the device's channels.
    pub frequency_hz: f64,
    pub encryption_flags: u32,
}

/// A sensor driver.
///
/// Push-style drivers implement [`update_channels`](Self::update_channels)
/// and inherit packet assembly from [`sensor_packet`](Self::sensor_packet).
/// Drivers that already receive finished packets (from a socket or file)
/// override `sensor_packet` instead and return an empty channel list.
pub trait Device {
    fn identity(&self) -> DeviceIdentity;

    /// Milliseconds since the Unix epoch, or any monotonic clock the consumer
    /// agrees on.
    fn timestamp_ms(&self) -> u64;

    /// Refreshes device state and lists the channels of the next packet.
    /// State lives in the device and is only touched here.
    fn update_channels(&mut self) -> Vec<ChannelSource<'_>>;

    fn encryptor(&self) -> &dyn Crypt {
        &NullCrypt
    }

    /// Blocks until the device produces one complete, possibly encrypted,
    /// sensor packet.
    fn sensor_packet(&mut self) -> Result<Vec<u8>> {
        let identity = self.identity();
        let packer = packer_for(&identity, self.timestamp_ms());
        let packet = {
            let channels = self.update_channels();
            packer.pack(&channels)?
        };
        Ok(encrypt_payload(
            packet,
            identity.encryption_flags,
            self.encryptor(),
        ))
    }

    /// A channel-less sensor header describing the device.
    fn sensor_header(&self) -> [u8; SensorHeader::SIZE] {
        packer_for(&self.identity(), self.timestamp_ms())
            .header(0)
            .to_bytes()
    }
}

fn packer_for(identity: &DeviceIdentity, timestamp_ms: u64) -> SensorPacketPacker {
    SensorPacketPacker::builder()
        .set_ids(identity.vendor_id, identity.product_id)
        .set_frequency(identity.frequency_hz)
        .set_encryption_flags(identity.encryption_flags)
        .set_timestamp(timestamp_ms)
        .build()
}

/// Wall-clock milliseconds since the Unix epoch.
#[cfg(feature = "std")]
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
