pub mod intervals;

pub use intervals::IntervalRegistry;
