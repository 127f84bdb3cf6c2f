pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::RemoteError;
