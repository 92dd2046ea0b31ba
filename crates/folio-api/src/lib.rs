// Client for the remote blog endpoint
pub mod client;
pub mod models;
pub mod retry;

// Re-export common types
pub use client::{ApiError, BlogClient};
pub use models::BlogPost;
pub use retry::{with_retry, RetryConfig};
