//! Outbound query plumbing: retry policy, clock, and the shared client.

pub mod clock;
pub mod query;
pub mod retry;

pub use clock::{Clock, TokioClock};
pub use query::QueryClient;
pub use retry::RetryPolicy;
