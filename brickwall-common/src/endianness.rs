//! Implements a type to model endianness.

/// Determines the byte-order of multi-byte fields.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Endianness {
    /// The least significant byte is stored at the lowest address.
    #[default]
    Little,
    /// The most significant byte is stored at the lowest address.
    Big,
}

impl Endianness {
    /// The native endianness.
    pub fn native() -> Endianness {
        if cfg!(target_endian = "little") {
            Endianness::Little
        } else {
            Endianness::Big
        }
    }
}

macro_rules! endianness_from_bytes {
    ($(($name:ident: $num:ident),)*) => {
        impl Endianness {
            $(
                #[doc = concat!("Decodes a `", stringify!($num), "` from bytes of this endianness.")]
                pub fn $name(self, bytes: [u8; std::mem::size_of::<$num>()]) -> $num {
                    match self {
                        Endianness::Little => $num::from_le_bytes(bytes),
                        Endianness::Big => $num::from_be_bytes(bytes),
                    }
                }
            )*
        }
    };
}

endianness_from_bytes! {
    (u16_from_bytes: u16),
    (u32_from_bytes: u32),
    (u64_from_bytes: u64),
    (i16_from_bytes: i16),
    (i32_from_bytes: i32),
    (i64_from_bytes: i64),
    (f32_from_bytes: f32),
    (f64_from_bytes: f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_order_is_respected() {
        assert_eq!(Endianness::Little.u16_from_bytes([0x34, 0x12]), 0x1234);
        assert_eq!(Endianness::Big.u16_from_bytes([0x12, 0x34]), 0x1234);
        assert_eq!(Endianness::Big.i32_from_bytes([0xff, 0xff, 0xff, 0xfe]), -2);
    }
}
