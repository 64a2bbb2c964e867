pub mod check;
pub mod commands;
pub mod config;
pub mod scan;

pub use commands::{Cli, Commands};
