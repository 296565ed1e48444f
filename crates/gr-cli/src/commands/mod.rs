//! Report pipeline and output formatting.

pub mod render;
pub mod report;
pub mod util;
