pub(crate) mod dsl;
pub(crate) mod option;
pub(crate) mod props;
pub(crate) mod value;
