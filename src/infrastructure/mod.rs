pub mod progress;
pub mod retry;

pub use progress::{LogSink, ProgressReporter};
pub use retry::RetryExecutor;
