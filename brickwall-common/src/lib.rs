//! Defines the annotation model and other types shared by all brickwall `crate`s.

pub use brick::{Brick, BrickName, MAX_NAME_LEN};
pub use endianness::Endianness;
pub use input::Input;
pub use primitive::{PrimitiveType, Scalar};
pub use types::{TypeId, TypeInfo, USER_STRUCT_BASE};
pub use wall::{BrickStruct, BrickWall, InsertError, StructIndex};

mod brick;
mod endianness;
mod input;
mod primitive;
mod types;
mod wall;

/// The palette that is used for bricks without an explicitly chosen color.
///
/// Colors are stored as `0xRRGGBB`.
pub const PALETTE: [u32; 8] = [
    0x4e79a7, 0xf28e2b, 0xe15759, 0x76b7b2, 0x59a14f, 0xedc948, 0xb07aa1, 0xff9da7,
];
