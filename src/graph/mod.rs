pub(crate) mod desc;
#[allow(clippy::module_inception)]
pub(crate) mod graph;
pub(crate) mod operator;
pub(crate) mod param;
pub(crate) mod port;
pub(crate) mod scheduler;
