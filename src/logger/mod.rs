//! Process-wide `tracing` setup with a filter that can be swapped at runtime.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
