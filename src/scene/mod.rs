pub(crate) mod compute;
pub(crate) mod content;
pub(crate) mod model;
pub(crate) mod node;
pub(crate) mod structure;
pub(crate) mod tree;
