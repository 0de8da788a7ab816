//! Fixed width big-endian unsigned integers.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::error::{PrimitiveError, Result};
use crate::value::{take, BinaryValue};

macro_rules! fixed_uint {
    ($(#[$meta:meta])* $name:ident, $inner:ty, $kind:literal, $get:ident, $put:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub $inner);

        impl $name {
            /// Largest representable value.
            pub const MAX: $inner = <$inner>::MAX;

            /// Encoded width in bytes.
            pub const LEN: usize = std::mem::size_of::<$inner>();

            /// The wrapped value.
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $inner {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = PrimitiveError;

            fn try_from(value: i64) -> Result<Self> {
                <$inner>::try_from(value)
                    .map(Self)
                    .map_err(|_| PrimitiveError::OutOfRange {
                        kind: $kind,
                        value,
                        max: <$inner>::MAX as u64,
                    })
            }
        }

        impl BinaryValue for $name {
            fn encoded_len(&self) -> usize {
                Self::LEN
            }

            fn encode<B: BufMut>(&self, dst: &mut B) {
                dst.$put(self.0);
            }

            fn decode(src: &[u8], offset: usize) -> Result<(Self, usize)> {
                let mut raw = take(src, offset, Self::LEN)?;
                Ok((Self(raw.$get()), Self::LEN))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#0width$x}", self.0, width = Self::LEN * 2 + 2)
            }
        }
    };
}

fixed_uint!(
    /// Unsigned 8-bit value.
    Uint8,
    u8,
    "uint8",
    get_u8,
    put_u8
);

fixed_uint!(
    /// Unsigned 16-bit big-endian value.
    Uint16,
    u16,
    "uint16",
    get_u16,
    put_u16
);

fixed_uint!(
    /// Unsigned 32-bit big-endian value.
    Uint32,
    u32,
    "uint32",
    get_u32,
    put_u32
);
