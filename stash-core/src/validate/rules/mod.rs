pub(crate) mod config;
pub(crate) mod retry;
pub(crate) mod sequence;
