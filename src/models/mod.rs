pub mod finding;
pub mod probe;

pub use finding::*;
pub use probe::*;
