//! Strongly typed index wrappers.
//!
//! The simulation engine names lanes and traffic lights with strings; inside
//! a dataset they are stored once in a `Vec` and referenced by these
//! indices.  The inner integer is `pub` for direct indexing, but callers
//! should prefer `.index()`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Row-major index of a grid cell: `i * resolution + j`.
    pub struct AreaId(u32);
}

typed_id! {
    /// Index into a dataset's lane table.
    pub struct LaneId(u32);
}

typed_id! {
    /// Index into a dataset's traffic-light table.
    pub struct TlsId(u32);
}
