pub mod parser;
pub mod schema;
pub mod types;
pub mod security;
pub mod spring_paths;

pub use types::*;
pub use parser::{load_or_default, parse_config, save_config};
