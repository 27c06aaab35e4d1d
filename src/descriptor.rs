//! Element descriptors and the promotion of packed widths to in-memory types.

const SIGNED_BIT: u8 = 1 << 7;
const INTEGER_BIT: u8 = 1 << 6;
const BYTES_UNIT_BIT: u8 = 1 << 5;
const SIZE_MASK: u8 = 0x1f;

/// Type and width of one tuple element, as carried in a channel header.
///
/// Wire byte: bit 7 signed, bit 6 integer, bit 5 size unit (1 = bytes,
/// 0 = bits), bits 4..0 size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementDescriptor {
    pub signed: bool,
    pub integer: bool,
    pub size_unit_is_bytes: bool,
    size: u8,
}

impl ElementDescriptor {
    /// # Panics
    /// If `size` does not fit the 5-bit size field.
    pub fn new(signed: bool, integer: bool, size_unit_is_bytes: bool, size: u8) -> Self {
        assert!(size <= SIZE_MASK, "element size {} exceeds 5 bits", size);
        Self {
            signed,
            integer,
            size_unit_is_bytes,
            size,
        }
    }

    pub fn int_bytes(signed: bool, bytes: u8) -> Self {
        Self::new(signed, true, true, bytes)
    }

    pub fn int_bits(signed: bool, bits: u8) -> Self {
        Self::new(signed, true, false, bits)
    }

    pub fn float_bytes(bytes: u8) -> Self {
        Self::new(true, false, true, bytes)
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn encode(&self) -> u8 {
        let mut byte = self.size;
        if self.signed {
            byte |= SIGNED_BIT;
        }
        if self.integer {
            byte |= INTEGER_BIT;
        }
        if self.size_unit_is_bytes {
            byte |= BYTES_UNIT_BIT;
        }
        byte
    }

    pub fn decode(byte: u8) -> Self {
        Self {
            signed: byte & SIGNED_BIT != 0,
            integer: byte & INTEGER_BIT != 0,
            size_unit_is_bytes: byte & BYTES_UNIT_BIT != 0,
            size: byte & SIZE_MASK,
        }
    }

    pub fn size_in_bits(&self) -> u32 {
        if self.size_unit_is_bytes {
            self.size as u32 * 8
        } else {
            self.size as u32
        }
    }

    /// Whole bytes the element occupies on the wire.
    pub fn packed_bytes(&self) -> u32 {
        let bits = self.size_in_bits();
        // 5-bit size field caps this at 31 * 8
        debug_assert!(bits <= SIZE_MASK as u32 * 8);
        (bits + 7) / 8
    }

    /// Picks the in-memory type for this element.
    ///
    /// Integers widen to the next primitive size class; floats are only
    /// primitive at exactly 4 or 8 bytes.
    pub fn promoted_type(&self) -> TypeTag {
        let packed = self.packed_bytes();
        if self.integer {
            match packed {
                1 => TypeTag::Int8,
                2 => TypeTag::Int16,
                3..=4 => TypeTag::Int32,
                5..=8 => TypeTag::Int64,
                n => TypeTag::NonPrimitiveInt(n),
            }
        } else {
            match packed {
                4 => TypeTag::Float32,
                8 => TypeTag::Float64,
                n => TypeTag::NonPrimitiveFloat(n),
            }
        }
    }
}

impl From<u8> for ElementDescriptor {
    fn from(byte: u8) -> Self {
        Self::decode(byte)
    }
}

impl From<ElementDescriptor> for u8 {
    fn from(d: ElementDescriptor) -> Self {
        d.encode()
    }
}

/// In-memory type of a promoted element. Non-primitive tags carry their
/// width in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    NonPrimitiveInt(u32),
    NonPrimitiveFloat(u32),
}

impl TypeTag {
    pub fn size_bytes(&self) -> u32 {
        match *self {
            TypeTag::Int8 => 1,
            TypeTag::Int16 => 2,
            TypeTag::Int32 | TypeTag::Float32 => 4,
            TypeTag::Int64 | TypeTag::Float64 => 8,
            TypeTag::NonPrimitiveInt(n) | TypeTag::NonPrimitiveFloat(n) => n,
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(
            self,
            TypeTag::NonPrimitiveInt(_) | TypeTag::NonPrimitiveFloat(_)
        )
    }
}

impl core::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TypeTag::Int8 => f.write_str("int8"),
            TypeTag::Int16 => f.write_str("int16"),
            TypeTag::Int32 => f.write_str("int32"),
            TypeTag::Int64 => f.write_str("int64"),
            TypeTag::Float32 => f.write_str("float32"),
            TypeTag::Float64 => f.write_str("float64"),
            TypeTag::NonPrimitiveInt(n) => write!(f, "int{}", n * 8),
            TypeTag::NonPrimitiveFloat(n) => write!(f, "float{}", n * 8),
        }
    }
}

/// Derived per-element layout, computed once per channel header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementMetaData {
    pub promoted_type: TypeTag,
    pub promoted_size_bytes: u32,
    pub offset_in_tuple: u32,
    pub packed_bytes: u32,
    pub signed: bool,
}

impl ElementMetaData {
    pub fn new(descriptor: &ElementDescriptor, offset_in_tuple: u32) -> Self {
        let promoted_type = descriptor.promoted_type();
        Self {
            promoted_type,
            promoted_size_bytes: promoted_type.size_bytes(),
            offset_in_tuple,
            packed_bytes: descriptor.packed_bytes(),
            signed: descriptor.signed,
        }
    }

    /// Zero bytes prepended when widening the packed value.
    pub fn pad_bytes(&self) -> u32 {
        self.promoted_size_bytes - self.packed_bytes
    }
}
