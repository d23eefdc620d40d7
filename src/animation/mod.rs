pub(crate) mod config;
pub(crate) mod during;
pub(crate) mod ease;
pub(crate) mod lerp;
