pub(crate) mod batch;
pub(crate) mod coordinator;
pub(crate) mod divide;
pub(crate) mod geometry;
