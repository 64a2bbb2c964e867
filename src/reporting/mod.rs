pub mod assembler;
pub mod formatter;
pub mod sink;

pub use sink::{ChannelSink, FindingForwarder, FindingSink};
