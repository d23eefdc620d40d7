pub(crate) mod arena;
pub(crate) mod differ;
pub(crate) mod driver;
