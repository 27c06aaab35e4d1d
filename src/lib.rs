//! Self-describing sensor packets.
//!
//! A packet is a 32-byte [`SensorHeader`] followed by channels. Each channel
//! carries its own [`ChannelHeader`] (tuple count, update rate, one
//! [`ElementDescriptor`] per element, UTF-16 name) and a body of bit-packed
//! elements. Producers implement [`Device`]; consumers wrap it in a [`Sensor`]
//! or feed raw packets to [`parse_packet`] and read [`Channel`]s out of the
//! resulting [`SensorSnapshot`].

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod channel;
mod crypt;
mod cursor;
mod descriptor;
mod device;
mod error;
#[cfg(feature = "unpacker")]
mod export;
mod header;
mod layout;
mod packer;
mod parser;
mod sensor;
mod snapshot;

/// Version written into packets produced by this crate.
pub const PROTOCOL_VERSION: u8 = 1;

pub use channel::{Channel, Primitive, Tuple, Value};
pub use crypt::{Crypt, NullCrypt};
pub use descriptor::{ElementDescriptor, ElementMetaData, TypeTag};
#[cfg(feature = "std")]
pub use device::now_ms;
pub use device::{Device, DeviceIdentity};
pub use error::{Error, Result};
pub use header::{ChannelHeader, SensorHeader};
pub use layout::ChannelLayout;
pub use packer::{ChannelSource, DataPacker, SensorPacketBuilder, SensorPacketPacker};
#[cfg(feature = "unpacker")]
pub use parser::parse_packet_parallel;
pub use parser::{packet_len, parse_packet, unpack_stream};
pub use sensor::{Sensor, SensorBuilder};
pub use snapshot::SensorSnapshot;
