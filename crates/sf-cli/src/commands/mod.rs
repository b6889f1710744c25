//! CLI command implementations

pub(crate) mod common;
pub(crate) mod migrate;
pub(crate) mod migration_log;
pub(crate) mod render;
pub(crate) mod status;
pub(crate) mod validate;
