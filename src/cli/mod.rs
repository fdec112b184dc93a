//! CLI module - argument parsing

mod args;

pub use args::{Cli, DEFAULT_INPUT, DEFAULT_OUTPUT_DIR};
