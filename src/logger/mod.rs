//! Process-wide tracing subscriber. Starts at `info` and is narrowed or widened once the
//! settings file has been read. Run `bin/logger_demo.rs` to see the reload in action.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
