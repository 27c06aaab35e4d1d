use thiserror::Error;

use crate::descriptor::TypeTag;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("truncated header: need {needed} bytes, {available} available")]
    TruncatedHeader { needed: usize, available: usize },

    #[error("invalid element count: {declared} descriptors declared, {available} bytes available")]
    InvalidElementCount { declared: usize, available: usize },

    #[error("channel body of {expected} bytes does not fit the {available} bytes left in the packet")]
    ElementCountMismatch { expected: usize, available: usize },

    #[error("dimension product {product} does not match {num_tuples} tuples")]
    DimensionMismatch { product: u64, num_tuples: u64 },

    #[error("too many dimensions: asked for {requested}, channel has {available}")]
    TooManyDimensions { requested: usize, available: usize },

    #[error("tuple byte index {index} out of range (limit {limit})")]
    IndexOutOfRange { index: u64, limit: u64 },

    #[error("element is {actual:?}, not {expected:?}")]
    TypeMismatch { expected: TypeTag, actual: TypeTag },

    #[error("element {index} requested, tuple has {count} elements")]
    NoSuchElement { index: usize, count: usize },

    #[error("channel name contains a null or unpaired surrogate code unit")]
    InvalidName,

    #[error("declared size overflows the address space")]
    SizeOverflow,
}

impl Error {
    pub(crate) const fn truncated(needed: usize, available: usize) -> Self {
        Self::TruncatedHeader { needed, available }
    }
}
