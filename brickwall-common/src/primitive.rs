//! Implements the fixed table of primitive field types.

use std::fmt;

use crate::Endianness;

/// A primitive field type.
///
/// The discriminant doubles as the type id of the primitive.
#[derive(num_enum::TryFromPrimitive, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[repr(u32)]
pub enum PrimitiveType {
    /// A signed 8-bit integer.
    Int8,
    /// An unsigned 8-bit integer.
    UInt8,
    /// A single byte character.
    Char,
    /// A signed 16-bit integer.
    Int16,
    /// An unsigned 16-bit integer.
    UInt16,
    /// A signed 32-bit integer.
    Int32,
    /// An unsigned 32-bit integer.
    UInt32,
    /// A signed 64-bit integer.
    Int64,
    /// An unsigned 64-bit integer.
    UInt64,
    /// An IEEE 754 single precision float.
    Float32,
    /// An IEEE 754 double precision float.
    Float64,
}

impl PrimitiveType {
    /// All primitive types in type id order.
    pub const ALL: [PrimitiveType; 11] = [
        PrimitiveType::Int8,
        PrimitiveType::UInt8,
        PrimitiveType::Char,
        PrimitiveType::Int16,
        PrimitiveType::UInt16,
        PrimitiveType::Int32,
        PrimitiveType::UInt32,
        PrimitiveType::Int64,
        PrimitiveType::UInt64,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
    ];

    /// The name of the type as written in templates.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Int8 => "int8",
            PrimitiveType::UInt8 => "uint8",
            PrimitiveType::Char => "char",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
        }
    }

    /// Looks up a primitive type by its template name.
    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        PrimitiveType::ALL.into_iter().find(|ty| ty.name() == name)
    }

    /// The size of a single element of this type in bytes.
    pub fn size(self) -> u64 {
        match self {
            PrimitiveType::Int8 | PrimitiveType::UInt8 | PrimitiveType::Char => 1,
            PrimitiveType::Int16 | PrimitiveType::UInt16 => 2,
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float32 => 4,
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => 8,
        }
    }

    /// Returns `true` if values of this type are integers.
    pub fn is_integer(self) -> bool {
        !self.is_float()
    }

    /// Returns `true` if values of this type are floating point numbers.
    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveType::Float32 | PrimitiveType::Float64)
    }

    /// The color used for bricks of this type unless another one is chosen.
    pub fn default_color(self) -> u32 {
        crate::PALETTE[self as usize % crate::PALETTE.len()]
    }

    /// Decodes a single value of this type from the start of `bytes`.
    ///
    /// Returns `None` if `bytes` is too short.
    pub fn decode(self, bytes: &[u8], endianness: Endianness) -> Option<Scalar> {
        let size = usize::try_from(self.size()).expect("primitive sizes fit a `usize`");
        let bytes = bytes.get(..size)?;

        let scalar = match self {
            PrimitiveType::Int8 => Scalar::Signed(i64::from(bytes[0] as i8)),
            PrimitiveType::UInt8 | PrimitiveType::Char => Scalar::Unsigned(u64::from(bytes[0])),
            PrimitiveType::Int16 => {
                Scalar::Signed(i64::from(endianness.i16_from_bytes(bytes.try_into().ok()?)))
            }
            PrimitiveType::UInt16 => {
                Scalar::Unsigned(u64::from(endianness.u16_from_bytes(bytes.try_into().ok()?)))
            }
            PrimitiveType::Int32 => {
                Scalar::Signed(i64::from(endianness.i32_from_bytes(bytes.try_into().ok()?)))
            }
            PrimitiveType::UInt32 => {
                Scalar::Unsigned(u64::from(endianness.u32_from_bytes(bytes.try_into().ok()?)))
            }
            PrimitiveType::Int64 => {
                Scalar::Signed(endianness.i64_from_bytes(bytes.try_into().ok()?))
            }
            PrimitiveType::UInt64 => {
                Scalar::Unsigned(endianness.u64_from_bytes(bytes.try_into().ok()?))
            }
            PrimitiveType::Float32 => {
                Scalar::Float(f64::from(endianness.f32_from_bytes(bytes.try_into().ok()?)))
            }
            PrimitiveType::Float64 => {
                Scalar::Float(endianness.f64_from_bytes(bytes.try_into().ok()?))
            }
        };

        Some(scalar)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single decoded primitive value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// A value of a signed integer type.
    Signed(i64),
    /// A value of an unsigned integer type.
    Unsigned(u64),
    /// A value of a floating point type.
    Float(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ids_roundtrip_through_the_discriminant() {
        for ty in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::try_from(ty as u32).ok(), Some(ty));
        }
        assert!(PrimitiveType::try_from(PrimitiveType::ALL.len() as u32).is_err());
    }

    #[test]
    fn names_are_resolved() {
        assert_eq!(PrimitiveType::from_name("int32"), Some(PrimitiveType::Int32));
        assert_eq!(PrimitiveType::from_name("float64"), Some(PrimitiveType::Float64));
        assert_eq!(PrimitiveType::from_name("int"), None);
    }

    #[test]
    fn decoding_respects_sign_and_width() {
        let bytes = [0xff, 0xff, 0x00, 0x80];
        assert_eq!(
            PrimitiveType::Int8.decode(&bytes, Endianness::Little),
            Some(Scalar::Signed(-1))
        );
        assert_eq!(
            PrimitiveType::UInt16.decode(&bytes, Endianness::Little),
            Some(Scalar::Unsigned(0xffff))
        );
        assert_eq!(
            PrimitiveType::Int32.decode(&bytes, Endianness::Big),
            Some(Scalar::Signed(-65_408))
        );
        assert_eq!(PrimitiveType::UInt64.decode(&bytes, Endianness::Little), None);
    }
}
