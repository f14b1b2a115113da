//! Layered settings: a TOML file overridden by `TURNSTILE__*` environment variables, validated
//! before anything is wired. `bin/settings_demo.rs` prints what a given file resolves to.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
