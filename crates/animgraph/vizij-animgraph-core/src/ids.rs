//! Dense arena indices for blend-tree nodes and controller states.

use serde::{Deserialize, Serialize};

/// Index of a node inside one state's blend-tree arena. Index 0 is the root.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub u32);

/// Index of a state inside a controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StateIndex(pub u32);

impl NodeIndex {
    pub const ROOT: NodeIndex = NodeIndex(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_usize(index: usize) -> Self {
        Self(index as u32)
    }
}

impl StateIndex {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_usize(index: usize) -> Self {
        Self(index as u32)
    }
}
