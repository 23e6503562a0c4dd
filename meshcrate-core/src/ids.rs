//! Arena ids for vertices, edges, faces and corners
//!
//! Topology is stored as flat arrays addressed by these `u32` newtypes
//! instead of pointer graphs.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an id from a raw index
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Index into the owning array
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// A unique position in space
    VertexId, "v"
);
define_id!(
    /// An unordered vertex pair shared by up to two faces in a manifold mesh
    EdgeId, "e"
);
define_id!(
    /// A triangle
    FaceId, "f"
);
define_id!(
    /// One (triangle, slot) vertex-instance
    CornerId, "c"
);

impl CornerId {
    /// Corner for `slot` (0..3) of `face`
    pub fn of(face: FaceId, slot: usize) -> Self {
        Self(face.0 * 3 + slot as u32)
    }

    /// The face owning this corner
    pub fn face(self) -> FaceId {
        FaceId(self.0 / 3)
    }

    /// Slot of this corner within its face
    pub fn slot(self) -> usize {
        (self.0 % 3) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_face_slot() {
        let corner = CornerId::of(FaceId(4), 2);
        assert_eq!(corner, CornerId(14));
        assert_eq!(corner.face(), FaceId(4));
        assert_eq!(corner.slot(), 2);
    }

    #[test]
    fn test_display_and_conversion() {
        assert_eq!(VertexId::from(7usize).to_string(), "v7");
        assert_eq!(EdgeId(3).index(), 3);
        assert_eq!(FaceId::new(2).to_string(), "f2");
    }
}
