pub mod config;
pub mod modules;
pub use modules::auth;
pub use modules::portfolio;
pub mod shared;

#[cfg(test)]
mod tests;
