//! Retry policy wrapping single upstream attempts

mod policy;

pub use policy::{RetryOutcome, RetryPolicy};
