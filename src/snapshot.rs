use alloc::{
    collections::{btree_map, BTreeMap, BTreeSet},
    string::String,
};

use crate::{channel::Channel, header::SensorHeader};

/// Every channel of one parsed sensor packet, keyed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    header: SensorHeader,
    channels: BTreeMap<String, Channel>,
}

impl SensorSnapshot {
    pub(crate) fn new(header: SensorHeader) -> Self {
        Self {
            header,
            channels: BTreeMap::new(),
        }
    }

    /// Inserts under the channel's name; returns the channel it replaced.
    pub(crate) fn add_channel(&mut self, channel: Channel) -> Option<Channel> {
        self.channels.insert(channel.name().into(), channel)
    }

    /// The producer's sensor header.
    pub fn header(&self) -> &SensorHeader {
        &self.header
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.header.timestamp_ms
    }

    pub fn get_channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Mutable access, e.g. to [`Channel::set_dimensions`].
    pub fn get_channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(name)
    }

    /// Takes a channel out of the snapshot.
    pub fn take_channel(&mut self, name: &str) -> Option<Channel> {
        self.channels.remove(name)
    }

    pub fn channel_names(&self) -> BTreeSet<String> {
        self.channels.keys().cloned().collect()
    }

    pub fn channels(&self) -> btree_map::Values<'_, String, Channel> {
        self.channels.values()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
