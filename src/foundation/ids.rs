/// Index of a node in the scene arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }

    /// Raw arena index.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Backend texture handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) u32);

impl TextureId {
    /// Raw backend handle.
    pub fn raw(self) -> u32 {
        self.0
    }
}
