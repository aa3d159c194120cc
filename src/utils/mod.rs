pub mod retry;

pub use retry::{retry_on_transient, Attempt, IsTransient, RetryConfig, RetryResult};
