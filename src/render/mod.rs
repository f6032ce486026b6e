pub(crate) mod backend;
pub(crate) mod batch;
pub(crate) mod cpu;
pub(crate) mod frame;
pub(crate) mod kernels;
pub(crate) mod painter;
pub(crate) mod resources;
pub(crate) mod surface_pool;
