pub mod pool;
pub mod token_bucket;

pub use pool::{Admission, ExecutorSnapshot, ProbeFuture, TaskExecutor};
pub use token_bucket::TokenBucket;
