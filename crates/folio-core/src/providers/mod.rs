// Source implementations
pub mod http;

pub use http::HttpSource;
