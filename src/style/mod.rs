pub(crate) mod computed;
pub(crate) mod filter;
pub(crate) mod level;
