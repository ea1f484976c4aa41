//! Runtime settings: a TOML file chosen with `--settings`, falling back to
//! `settings/dev.toml` (debug) or `settings/release.toml` (release).

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
