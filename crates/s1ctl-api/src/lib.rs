// s1ctl-api: Async Rust client for the SentinelOne management console API (v2.1)

pub mod client;
pub mod endpoints;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{ApiRequest, ConsoleClient, DEFAULT_CONTEXT};
pub use endpoints::{ConfigOverrideQuery, PackageQuery};
pub use error::Error;
pub use transport::{RetryPolicy, TlsMode, TransportConfig};
