pub mod client;
pub mod error;
pub mod types;

pub use client::PageSpeedClient;
pub use error::ClientError;
pub use types::{LighthouseResult, PageSpeedResponse};
