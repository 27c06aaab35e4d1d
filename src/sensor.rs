use alloc::boxed::Box;

use crate::{
    crypt::Crypt,
    device::Device,
    error::Result,
    header::SensorHeader,
    parser::parse_packet,
    snapshot::SensorSnapshot,
};

/// Consumer handle on a [`Device`]: pulls packets and parses them.
pub struct Sensor<D> {
    device: D,
    info: SensorHeader,
    decryptor: Option<Box<dyn Crypt>>,
    #[cfg(feature = "unpacker")]
    parallel: bool,
}

pub struct SensorBuilder<D> {
    device: D,
    decryptor: Option<Box<dyn Crypt>>,
    #[cfg(feature = "unpacker")]
    parallel: bool,
}

impl<D: Device> SensorBuilder<D> {
    pub fn set_decryptor(mut self, decryptor: impl Crypt + 'static) -> Self {
        self.decryptor = Some(Box::new(decryptor));
        self
    }

    /// Promote channel bodies on the rayon pool.
    #[cfg(feature = "unpacker")]
    pub fn set_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Blocks on the device's header-only packet to learn its identity.
    pub fn build(self) -> Result<Sensor<D>> {
        let (info, _) = SensorHeader::parse(&self.device.sensor_header())?;
        tracing::debug!(
            version = info.version,
            vendor_id = info.vendor_id,
            product_id = info.product_id,
            "sensor attached"
        );
        Ok(Sensor {
            device: self.device,
            info,
            decryptor: self.decryptor,
            #[cfg(feature = "unpacker")]
            parallel: self.parallel,
        })
    }
}

impl<D: Device> Sensor<D> {
    pub fn builder(device: D) -> SensorBuilder<D> {
        SensorBuilder {
            device,
            decryptor: None,
            #[cfg(feature = "unpacker")]
            parallel: false,
        }
    }

    pub fn new(device: D) -> Result<Self> {
        Self::builder(device).build()
    }

    pub fn api_version(&self) -> u8 {
        self.info.version
    }

    pub fn vendor_id(&self) -> u16 {
        self.info.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.info.product_id
    }

    /// Highest update frequency among the device's channels.
    pub fn frequency_hz(&self) -> f64 {
        self.info.frequency_hz
    }

    pub fn set_decryptor(&mut self, decryptor: impl Crypt + 'static) {
        self.decryptor = Some(Box::new(decryptor));
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// Asks the device for a new packet, blocking until it arrives, and
    /// parses it.
    pub fn get_sensor_snapshot(&mut self) -> Result<SensorSnapshot> {
        let packet = self.device.sensor_packet()?;
        let decryptor = self.decryptor.as_deref();

        #[cfg(feature = "unpacker")]
        if self.parallel {
            return crate::parser::parse_packet_parallel(&packet, decryptor);
        }

        parse_packet(&packet, decryptor)
    }
}
