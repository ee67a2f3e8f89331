pub(crate) mod cache;
pub(crate) mod generator;
pub(crate) mod set;
