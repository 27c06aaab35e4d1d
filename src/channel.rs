//! Parsed channels and read-only tuple views over them.

use alloc::{sync::Arc, vec::Vec};

use crate::{
    descriptor::{ElementMetaData, TypeTag},
    error::{Error, Result},
    header::ChannelHeader,
    layout::ChannelLayout,
};

/// A named sequence of promoted tuples with multi-dimensional addressing.
///
/// The promoted buffer never changes after construction. Only
/// [`set_dimensions`](Self::set_dimensions) mutates the channel, and it takes
/// `&mut self`, so no [`Tuple`] can be alive while the strides change.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    header: ChannelHeader,
    layout: Arc<ChannelLayout>,
    data: Vec<u8>,
    dimensions: Vec<u32>,
    strides: Vec<u64>,
}

impl Channel {
    /// Builds a channel from its header and wire body.
    pub fn unpack(header: ChannelHeader, raw: &[u8]) -> Result<Self> {
        let layout = Arc::new(ChannelLayout::new(header.elements()));
        Self::unpack_with_layout(header, layout, raw)
    }

    pub(crate) fn unpack_with_layout(
        header: ChannelHeader,
        layout: Arc<ChannelLayout>,
        raw: &[u8],
    ) -> Result<Self> {
        let data = layout.unpack(raw, header.num_tuples())?;
        let num_tuples = u32::try_from(header.num_tuples()).map_err(|_| Error::SizeOverflow)?;
        let tuple_size = layout.tuple_size() as u64;
        Ok(Self {
            header,
            layout,
            data,
            dimensions: alloc::vec![num_tuples],
            strides: alloc::vec![tuple_size],
        })
    }

    pub fn header(&self) -> &ChannelHeader {
        &self.header
    }

    pub fn name(&self) -> &str {
        self.header.name()
    }

    pub fn frequency_hz(&self) -> f64 {
        self.header.frequency_hz()
    }

    pub fn num_tuples(&self) -> u64 {
        self.header.num_tuples()
    }

    pub fn tuple_size(&self) -> u32 {
        self.layout.tuple_size()
    }

    pub fn dimensions(&self) -> &[u32] {
        &self.dimensions
    }

    /// Byte distance between consecutive indices of each dimension.
    pub fn strides(&self) -> &[u64] {
        &self.strides
    }

    pub fn element_metadata(&self) -> &[ElementMetaData] {
        self.layout.elements()
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    /// Promoted bytes of every tuple, back to back.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Re-encodes the promoted data as a wire body.
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        self.layout.pack(&self.data, self.num_tuples())
    }

    /// Reinterprets the tuples as an array of shape `dims`, last dimension
    /// fastest. On failure the previous shape is kept.
    pub fn set_dimensions(&mut self, dims: &[u32]) -> Result<()> {
        let num_tuples = self.num_tuples();
        let product = dims
            .iter()
            .try_fold(1u64, |acc, d| acc.checked_mul(*d as u64))
            .unwrap_or(u64::MAX);
        if dims.is_empty() || product != num_tuples {
            return Err(Error::DimensionMismatch {
                product: if dims.is_empty() { 0 } else { product },
                num_tuples,
            });
        }

        // a zero dimension satisfies the product check with huge neighbours
        let mut strides = alloc::vec![0u64; dims.len()];
        let last = dims.len() - 1;
        strides[last] = self.tuple_size() as u64;
        for i in (0..last).rev() {
            strides[i] = strides[i + 1]
                .checked_mul(dims[i + 1] as u64)
                .ok_or(Error::SizeOverflow)?;
        }

        self.dimensions = dims.to_vec();
        self.strides = strides;
        Ok(())
    }

    /// Looks up a tuple by its index along each dimension.
    ///
    /// Fewer indices than dimensions address the start of the sub-block. Only
    /// the combined byte offset is range-checked, not each index on its own.
    pub fn get_tuple(&self, indices: &[u32]) -> Result<Tuple<'_>> {
        if indices.len() > self.dimensions.len() {
            return Err(Error::TooManyDimensions {
                requested: indices.len(),
                available: self.dimensions.len(),
            });
        }

        let limit = self.data.len() as u64;
        let index = indices
            .iter()
            .zip(&self.strides)
            .try_fold(0u64, |acc, (i, stride)| {
                (*i as u64).checked_mul(*stride)?.checked_add(acc)
            })
            .unwrap_or(u64::MAX);
        if index >= limit {
            return Err(Error::IndexOutOfRange { index, limit });
        }

        let start = index as usize;
        let end = start + self.tuple_size() as usize;
        Ok(Tuple {
            data: &self.data[start..end],
            elements: self.layout.elements(),
        })
    }

    /// Every tuple in storage order.
    pub fn tuples(&self) -> impl Iterator<Item = Tuple<'_>> + '_ {
        let size = self.tuple_size() as usize;
        let count = if size == 0 { 0 } else { self.data.len() / size };
        (0..count).map(move |i| Tuple {
            data: &self.data[i * size..(i + 1) * size],
            elements: self.layout.elements(),
        })
    }
}

/// Decoded value of a primitive element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

mod private {
    pub trait Sealed: Sized {
        /// `bytes` is exactly one promoted element of this type.
        fn from_be_slice(bytes: &[u8]) -> Self;
    }
}

use private::Sealed;

/// Rust types a primitive element can be read as.
pub trait Primitive: Copy + Default + Sealed {
    const TAG: TypeTag;

    /// Numeric `as` conversion from any stored primitive.
    fn from_value(v: Value) -> Self;
}

macro_rules! impl_primitive {
    ($($ty:ty => $tag:ident),* $(,)?) => {$(
        impl Sealed for $ty {
            #[inline]
            fn from_be_slice(bytes: &[u8]) -> Self {
                let mut arr = [0u8; core::mem::size_of::<$ty>()];
                arr.copy_from_slice(&bytes[..core::mem::size_of::<$ty>()]);
                <$ty>::from_be_bytes(arr)
            }
        }

        impl Primitive for $ty {
            const TAG: TypeTag = TypeTag::$tag;

            #[inline]
            fn from_value(v: Value) -> Self {
                match v {
                    Value::I8(x) => x as $ty,
                    Value::I16(x) => x as $ty,
                    Value::I32(x) => x as $ty,
                    Value::I64(x) => x as $ty,
                    Value::F32(x) => x as $ty,
                    Value::F64(x) => x as $ty,
                }
            }
        }
    )*};
}

impl_primitive!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
);

impl Value {
    pub fn as_f64(&self) -> f64 {
        f64::from_value(*self)
    }
}

/// Prints the stored value in its own type, so wide integers keep every digit.
impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::I8(v) => core::fmt::Display::fmt(v, f),
            Value::I16(v) => core::fmt::Display::fmt(v, f),
            Value::I32(v) => core::fmt::Display::fmt(v, f),
            Value::I64(v) => core::fmt::Display::fmt(v, f),
            Value::F32(v) => core::fmt::Display::fmt(v, f),
            Value::F64(v) => core::fmt::Display::fmt(v, f),
        }
    }
}

/// Read-only view of one tuple, borrowed from its [`Channel`].
#[derive(Debug, Clone, Copy)]
pub struct Tuple<'a> {
    data: &'a [u8],
    elements: &'a [ElementMetaData],
}

impl<'a> Tuple<'a> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Promoted bytes of the whole tuple.
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn metadata(&self, index: usize) -> Result<&'a ElementMetaData> {
        self.elements.get(index).ok_or(Error::NoSuchElement {
            index,
            count: self.elements.len(),
        })
    }

    /// Promoted bytes of one element, big-endian. The only way to read
    /// non-primitive elements.
    pub fn element_bytes(&self, index: usize) -> Result<&'a [u8]> {
        let meta = self.metadata(index)?;
        let start = meta.offset_in_tuple as usize;
        Ok(&self.data[start..start + meta.promoted_size_bytes as usize])
    }

    /// `None` for non-primitive elements and out-of-range indices.
    pub fn value(&self, index: usize) -> Option<Value> {
        let meta = self.metadata(index).ok()?;
        let bytes = self.element_bytes(index).ok()?;
        Some(match meta.promoted_type {
            TypeTag::Int8 => Value::I8(i8::from_be_slice(bytes)),
            TypeTag::Int16 => Value::I16(i16::from_be_slice(bytes)),
            TypeTag::Int32 => Value::I32(i32::from_be_slice(bytes)),
            TypeTag::Int64 => Value::I64(i64::from_be_slice(bytes)),
            TypeTag::Float32 => Value::F32(f32::from_be_slice(bytes)),
            TypeTag::Float64 => Value::F64(f64::from_be_slice(bytes)),
            TypeTag::NonPrimitiveInt(_) | TypeTag::NonPrimitiveFloat(_) => return None,
        })
    }

    /// Reads an element whose stored type is exactly `T`.
    pub fn get<T: Primitive>(&self, index: usize) -> Result<T> {
        let meta = self.metadata(index)?;
        if meta.promoted_type != T::TAG {
            return Err(Error::TypeMismatch {
                expected: T::TAG,
                actual: meta.promoted_type,
            });
        }
        Ok(T::from_be_slice(self.element_bytes(index)?))
    }

    /// Reads any primitive element and casts it to `T`; zero otherwise.
    pub fn get_coerced<T: Primitive>(&self, index: usize) -> T {
        self.value(index).map(T::from_value).unwrap_or_default()
    }

    pub fn get_i8(&self, index: usize) -> Result<i8> {
        self.get(index)
    }

    pub fn get_i16(&self, index: usize) -> Result<i16> {
        self.get(index)
    }

    pub fn get_i32(&self, index: usize) -> Result<i32> {
        self.get(index)
    }

    pub fn get_i64(&self, index: usize) -> Result<i64> {
        self.get(index)
    }

    pub fn get_f32(&self, index: usize) -> Result<f32> {
        self.get(index)
    }

    pub fn get_f64(&self, index: usize) -> Result<f64> {
        self.get(index)
    }

    pub fn get_i8_coerced(&self, index: usize) -> i8 {
        self.get_coerced(index)
    }

    pub fn get_i16_coerced(&self, index: usize) -> i16 {
        self.get_coerced(index)
    }

    pub fn get_i32_coerced(&self, index: usize) -> i32 {
        self.get_coerced(index)
    }

    pub fn get_i64_coerced(&self, index: usize) -> i64 {
        self.get_coerced(index)
    }

    pub fn get_f32_coerced(&self, index: usize) -> f32 {
        self.get_coerced(index)
    }

    pub fn get_f64_coerced(&self, index: usize) -> f64 {
        self.get_coerced(index)
    }
}
