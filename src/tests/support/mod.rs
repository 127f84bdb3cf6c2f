pub mod fixtures;
pub mod stubs;
pub mod test_server;
