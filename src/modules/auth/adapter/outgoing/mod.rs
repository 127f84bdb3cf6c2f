pub mod auth_api_http;

pub use auth_api_http::HttpAuthApi;
