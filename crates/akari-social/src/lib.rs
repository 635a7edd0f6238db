//! HTTP collaborators for the circle engine: the social data client and the
//! scoring oracle client.

pub mod client;
pub mod error;
pub(crate) mod http;
pub mod oracle;
pub(crate) mod retry;
pub mod types;

pub use client::TwitterApiClient;
pub use error::SocialError;
pub use oracle::HttpScoringOracle;
