use alloc::vec::Vec;

/// Encryption hook applied to everything after the sensor header.
///
/// `flags` is the header's `encryption_flags`; implementations pick their
/// algorithm from it. The header itself always travels in clear.
pub trait Crypt {
    fn encrypt(&self, flags: u32, payload: Vec<u8>) -> Vec<u8>;

    fn decrypt(&self, flags: u32, payload: Vec<u8>) -> Vec<u8>;
}

/// Pass-through used when no cipher is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCrypt;

impl Crypt for NullCrypt {
    fn encrypt(&self, _flags: u32, payload: Vec<u8>) -> Vec<u8> {
        payload
    }

    fn decrypt(&self, _flags: u32, payload: Vec<u8>) -> Vec<u8> {
        payload
    }
}
