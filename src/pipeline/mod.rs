pub mod engine;
pub mod state;

pub use engine::{EngineParts, ScanEngine};
pub use state::EngineStatus;
