//! CLI command implementations.

pub(crate) mod fetch;
pub(crate) mod jobs;
pub(crate) mod meta;
pub(crate) mod serve;
