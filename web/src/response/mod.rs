pub(crate) mod dm;
pub(crate) mod scene;
